//! wildcard nodes left in the master tree
//!
//! `set interfaces <ge-*> mtu 9000` outside a group applies to every sibling interface matching
//! `<ge-*>`. Once inheritance is done each such wildcard node is copied onto its matching
//! literal siblings and removed. A wildcard without a matching sibling is dropped.
use super::catalog::LIST_POSITIONS;
use super::tree::{Node, Tree};
use crate::issue::{Error, Issue, Issues};
use crate::path::Path;
use crate::statement::{Diagnostic, Statement, GROUPS};

#[tracing::instrument(level = "trace", skip_all)]
pub fn expand(master: &mut Tree, issues: &mut Issues) -> Result<(), Error> {
    let mut path = Path::default();
    expand_node(master.root_mut(), &mut path, issues)
}

fn expand_node(node: &mut Node, path: &mut Path, issues: &mut Issues) -> Result<(), Error> {
    let wildcards: Vec<String> = node
        .children
        .iter()
        .filter(|(key, child)| child.is_wildcard() && !(path.is_empty() && *key == GROUPS))
        .map(|(key, _)| key.clone())
        .collect();

    for key in wildcards {
        let Some(mut wildcard) = node.children.shift_remove(&key) else {
            continue;
        };
        let Some(pattern) = wildcard.segment().cloned() else {
            continue;
        };
        // unrecognized lines below the wildcard stay in the output, at its parent
        take_diagnostics(&mut wildcard, &mut node.diagnostics);

        let targets: Vec<String> = node
            .children
            .iter()
            .filter(|(_key, child)| {
                child
                    .segment()
                    .is_some_and(|segment| !segment.is_wildcard() && segment.is_matched_by(&pattern))
            })
            .map(|(key, _)| key.clone())
            .collect();

        if targets.is_empty() {
            let mut wildcard_path = path.clone();
            wildcard_path.push(pattern.clone());
            tracing::debug!(path = %wildcard_path, "unresolved wildcard");
            issues.log(Issue::UnresolvedWildcard {
                path: wildcard_path.to_string(),
                line: pattern.line(),
            });
            continue;
        }

        for target_key in targets {
            let Some(target) = node.children.get_mut(&target_key) else {
                continue;
            };
            let Some(segment) = target.segment().cloned() else {
                continue;
            };
            path.push(segment);
            let result = graft(&wildcard, target, path);
            path.pop();
            result?;
        }
    }

    let at_root = path.is_empty();
    for (key, child) in node.children.iter_mut() {
        if at_root && key == GROUPS {
            continue;
        }
        let Some(segment) = child.segment().cloned() else {
            continue;
        };
        path.push(segment);
        let result = expand_node(child, path, issues);
        path.pop();
        result?;
    }

    Ok(())
}

fn take_diagnostics(node: &mut Node, into: &mut Vec<Diagnostic>) {
    into.append(&mut node.diagnostics);
    for child in node.children.values_mut() {
        take_diagnostics(child, into);
    }
}

/// Copy what `source` has and `target` lacks onto `target`, found at `path`
///
/// Statements are synthesized at the concrete path. Nested wildcards are copied as they are,
/// they get expanded once the walk reaches them.
fn graft(source: &Node, target: &mut Node, path: &mut Path) -> Result<(), Error> {
    if target.statement.is_none() {
        if let Some(statement) = source.statement() {
            target.statement = Some(Statement::synthesize(path, statement.line())?);
            target.source_group = source.source_group.clone();
        }
    }

    let mut added = indexmap::IndexMap::new();
    for (key, child) in &source.children {
        let Some(segment) = child.segment().cloned() else {
            continue;
        };

        if let Some(existing) = target.children.get_mut(key) {
            path.push(segment);
            let result = graft(child, existing, path);
            path.pop();
            result?;
        } else if child.is_wildcard() {
            added.insert(key.clone(), child.clone());
        } else {
            let mut copy = child.copy();
            path.push(segment);
            let result = graft(child, &mut copy, path);
            path.pop();
            result?;
            added.insert(key.clone(), copy);
        }
    }

    if added.is_empty() {
        return Ok(());
    }
    if LIST_POSITIONS.is_list(path) {
        target.children.extend(added);
    } else {
        // written configuration stays last
        let existing = std::mem::replace(&mut target.children, added);
        target.children.extend(existing);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flat_config;
    use crate::hierarchy::Hierarchy;
    use crate::statement::Line;
    use pretty_assertions::assert_eq;

    fn expanded(config: Vec<Line>) -> (Vec<String>, Vec<Issue>) {
        let mut master = Tree::default();
        for statement in config.iter().filter_map(Line::as_set) {
            master.insert_path(&statement.path().clone(), Some(statement.clone()));
        }
        let mut issues = Issues::new();
        expand(&mut master, &mut issues).unwrap();
        (
            master.dump().iter().map(ToString::to_string).collect(),
            issues.into_vec(),
        )
    }

    #[test]
    fn wildcard_applies_to_matching_siblings() {
        let (lines, issues) = expanded(flat_config! {
            "set interfaces <ge-*> mtu 9000",
            "set interfaces ge-0 unit 0",
            "set interfaces ge-1 mtu 1500",
            "set interfaces xe-0 unit 0",
        });
        assert_eq!(
            lines,
            vec![
                "set interfaces ge-0 mtu 9000",
                "set interfaces ge-0 unit 0",
                "set interfaces ge-1 mtu 9000",
                "set interfaces ge-1 mtu 1500",
                "set interfaces xe-0 unit 0",
            ]
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn nested_wildcards() {
        let (lines, _) = expanded(flat_config! {
            "set interfaces <*> unit <*> family inet",
            "set interfaces ge-0 unit 0 description a",
            "set interfaces ge-0 unit 1",
        });
        assert_eq!(
            lines,
            vec![
                "set interfaces ge-0 unit 0 family inet",
                "set interfaces ge-0 unit 0 description a",
                "set interfaces ge-0 unit 1",
                "set interfaces ge-0 unit 1 family inet",
            ]
        );
    }

    #[test]
    fn unrecognized_lines_below_wildcards_are_kept() {
        let mut hierarchy = Hierarchy::default();
        hierarchy.build(&flat_config! {
            "set interfaces ge-0 unit 0",
            "set interfaces <ge-*> mtu 9000",
            "not understood either",
            "set protocols <*> disable",
            "nor this",
        });
        let mut issues = Issues::new();
        hierarchy.expand_wildcards(&mut issues).unwrap();

        assert_eq!(
            hierarchy
                .dump()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "not understood either",
                "set interfaces ge-0 mtu 9000",
                "set interfaces ge-0 unit 0",
                "nor this",
            ]
        );
        assert_eq!(issues.as_slice().len(), 1);
    }

    #[test]
    fn unmatched_wildcard_is_dropped() {
        let (lines, issues) = expanded(flat_config! {
            "set system host-name r1",
            "set protocols <*> disable",
        });
        assert_eq!(lines, vec!["set system host-name r1"]);
        assert_eq!(
            issues,
            vec![Issue::UnresolvedWildcard {
                path: "protocols <*>".into(),
                line: 2,
            }]
        );
    }
}
