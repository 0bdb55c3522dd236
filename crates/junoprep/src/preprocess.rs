//! the preprocessing pipeline
use crate::hierarchy::Hierarchy;
use crate::issue::{Error, Issue, Issues};
use crate::ordering::apply_ordering;
use crate::statement::Line;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::Serializer;

#[derive(derive_new::new, Debug, Clone)]
pub struct Options {
    /// Annotate/merge passes before giving up on group inheritance
    #[new(value = "64")]
    pub max_inheritance_passes: usize,
    #[new(value = "true")]
    pub expand_apply_path: bool,
    /// Resolve wildcard nodes written outside of groups
    #[new(value = "true")]
    pub expand_wildcards: bool,
    /// What `${node}` stands for
    #[new(value = r#"["node0".to_string(), "node1".to_string()]"#)]
    pub cluster_groups: [String; 2],
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Preprocessed {
    /// The configuration, ready to be interpreted line by line
    pub lines: Vec<Line>,
    pub issues: Vec<Issue>,
    /// State after preprocessing, for diagnostics
    pub hierarchy: Hierarchy,
}

/// Resolve every directive of a flat configuration
///
/// 1. `delete`, `insert` and `activate` lines are applied
/// 2. deactivated statements are dropped
/// 3. master and group trees are built
/// 4. groups are inherited until nothing changes anymore
/// 5. group definitions are dropped
/// 6. wildcard nodes are expanded (see [Options::expand_wildcards])
/// 7. deactivated statements are dropped again, inherited ones may be covered too
/// 8. `apply-path` directives are expanded (see [Options::expand_apply_path])
///
/// Problems with single directives end up in [Preprocessed::issues].
///
/// The output keeps `apply-groups` directives but no group definitions, preprocessing it again
/// yields the same lines and reports every applied group as undefined.
#[tracing::instrument(level = "debug", skip_all)]
pub fn preprocess(lines: Vec<Line>, options: &Options) -> Result<Preprocessed, Error> {
    let mut issues = Issues::new();
    let mut hierarchy = Hierarchy::default();

    let lines = apply_ordering(lines, &mut issues);

    hierarchy.build_deactivation_tree(&lines);
    let lines = hierarchy.prune_deactivated_lines(lines);

    hierarchy.build(&lines);
    let passes = hierarchy.inherit_groups(
        &options.cluster_groups,
        options.max_inheritance_passes,
        &mut issues,
    )?;
    hierarchy.prune_group_definitions();

    if options.expand_wildcards {
        hierarchy.expand_wildcards(&mut issues)?;
    }
    hierarchy.prune_deactivated();

    let mut lines = hierarchy.dump();
    if options.expand_apply_path {
        lines = hierarchy.expand_apply_paths(lines, &mut issues)?;
    }

    let issues = issues.into_vec();
    tracing::info!(lines = lines.len(), issues = issues.len(), passes, "preprocessed");

    Ok(Preprocessed {
        lines,
        issues,
        hierarchy,
    })
}

/// One line per statement
impl std::fmt::Display for Preprocessed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl serde::ser::Serialize for Preprocessed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_map(Some(2))?;
        ser.serialize_entry("lines", &Lines(&self.lines))?;
        ser.serialize_entry("issues", &self.issues)?;
        ser.end()
    }
}

struct Lines<'a>(&'a [Line]);

impl serde::ser::Serialize for Lines<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_seq(Some(self.0.len()))?;
        for line in self.0 {
            ser.serialize_element(&line.to_string())?;
        }
        ser.end()
    }
}

impl serde::ser::Serialize for Issue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_map(Some(2))?;
        ser.serialize_entry("severity", &self.severity().to_string())?;
        ser.serialize_entry("message", &self.to_string())?;
        ser.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flat_config;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_options() {
        let options = Options::default();
        assert_eq!(options.max_inheritance_passes, 64);
        assert!(options.expand_apply_path);
        assert!(options.expand_wildcards);
        assert_eq!(options.cluster_groups, ["node0", "node1"]);
    }

    #[test]
    fn serialized_as_json() {
        let preprocessed = preprocess(
            flat_config! {
                "set system host-name r1",
                "delete system ntp",
            },
            &Options::default(),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&preprocessed).unwrap(),
            serde_json::json!({
                "lines": ["set system host-name r1"],
                "issues": [{
                    "severity": "info",
                    "message": "line 2: nothing to delete at \"system ntp\"",
                }],
            })
        );
    }

    #[test]
    fn options_switch_passes_off() {
        let config = || {
            flat_config! {
                "set interfaces <ge-*> mtu 9000",
                "set interfaces ge-0 unit 0 family inet address 10.0.0.1/24",
                r#"set policy-options prefix-list pl apply-path "interfaces <*> unit <*> family inet address <*>""#,
            }
        };

        let all = preprocess(config(), &Options::default()).unwrap();
        assert_eq!(
            all.to_string(),
            "set interfaces ge-0 mtu 9000\n\
             set interfaces ge-0 unit 0 family inet address 10.0.0.1/24\n\
             set policy-options prefix-list pl apply-path \"interfaces <*> unit <*> family inet address <*>\"\n\
             set policy-options prefix-list pl 10.0.0.1/24\n"
        );

        let options = Options {
            expand_apply_path: false,
            expand_wildcards: false,
            ..Default::default()
        };
        let none = preprocess(config(), &options).unwrap();
        assert_eq!(
            none.to_string(),
            "set interfaces <ge-*> mtu 9000\n\
             set interfaces ge-0 unit 0 family inet address 10.0.0.1/24\n\
             set policy-options prefix-list pl apply-path \"interfaces <*> unit <*> family inet address <*>\"\n"
        );
    }
}
