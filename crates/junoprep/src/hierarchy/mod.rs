//! the implicit hierarchy of a flat configuration
//!
//! [Hierarchy] owns three kinds of [Tree]:
//! - the master tree: the configuration itself
//! - the deactivation tree: which paths are deactivated
//! - one tree per group defined with `set groups <name> ...`
//!
//! Nodes are never shared between trees. Inheriting from a group copies its nodes into the
//! master tree (see [inherit]).
pub mod apply_path;
pub mod catalog;
pub mod inherit;
pub mod tree;
pub mod wildcard;

use crate::issue::{Error, Issue, Issues};
use crate::path::Path;
use crate::statement::{Directive, Line, Statement, GROUPS};
use crate::visit::VisitNodesMut;
use tree::{AppliedGroup, Node, Tree};

/// Group name that stands for the node specific groups of a chassis cluster
pub const NODE_GROUP: &str = "${node}";

#[derive(Debug, Default)]
pub struct Hierarchy {
    master: Tree,
    deactivated: Tree,
    groups: indexmap::IndexMap<String, Tree>,
}

impl Hierarchy {
    pub fn master(&self) -> &Tree {
        &self.master
    }

    pub fn deactivation_tree(&self) -> &Tree {
        &self.deactivated
    }

    pub fn group(&self, name: &str) -> Option<&Tree> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Build the deactivation tree from `deactivate`/`activate` lines, in order
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn build_deactivation_tree(&mut self, lines: &[Line]) {
        for line in lines {
            match line {
                Line::Deactivate(statement) => self.deactivate(statement.path()),
                Line::Activate(statement) => self.activate(statement.path()),
                _ => {}
            }
        }
    }

    pub fn deactivate(&mut self, path: &Path) {
        if self.is_deactivated(path) {
            return;
        }
        tracing::debug!(%path, "deactivate");
        let node = self.deactivated.insert_path(path, None);
        node.deactivated = true;
        // everything below is covered now
        node.children.clear();
    }

    pub fn activate(&mut self, path: &Path) {
        if let Some(node) = self.deactivated.get_mut(path) {
            tracing::debug!(%path, "activate");
            node.deactivated = false;
        }
    }

    /// Is `path` or any of its ancestors deactivated?
    pub fn is_deactivated(&self, path: &Path) -> bool {
        covered(&self.deactivated, path)
    }

    /// Drop `activate`/`deactivate` lines and `set` lines at deactivated paths
    pub fn prune_deactivated_lines(&self, lines: Vec<Line>) -> Vec<Line> {
        lines
            .into_iter()
            .filter(|line| match line {
                Line::Activate(_) | Line::Deactivate(_) => false,
                Line::Set(statement) => {
                    let deactivated = self.is_deactivated(statement.path());
                    if deactivated {
                        tracing::trace!(path = %statement.path(), "pruned deactivated");
                    }
                    !deactivated
                }
                _ => true,
            })
            .collect()
    }

    /// Remove deactivated subtrees from the master tree
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn prune_deactivated(&mut self) {
        let deactivated = &self.deactivated;
        self.master
            .visit_nodes_mut(&mut |path: &Path, node: &mut Node| {
                node.children.retain(|_key, child| {
                    let Some(segment) = child.segment() else {
                        return true;
                    };
                    let mut child_path = path.clone();
                    child_path.push(segment.clone());
                    !covered(deactivated, &child_path)
                });
            });
    }

    /// Populate the master tree and the group trees from `set` lines
    ///
    /// Unrecognized lines are attached to the node of the preceding statement outside of
    /// `groups` (the root if there is none), group definitions are dropped before the output.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn build(&mut self, lines: &[Line]) {
        let mut last_path = Path::default();
        for line in lines {
            match line {
                Line::Set(statement) => {
                    self.add_statement(statement.clone());
                    if !statement.path().starts_with_keys(&[GROUPS]) {
                        last_path = statement.path().clone();
                    }
                }
                Line::Unrecognized(diagnostic) => {
                    self.master.attach_diagnostic(&last_path, diagnostic.clone())
                }
                _ => {}
            }
        }
    }

    fn add_statement(&mut self, statement: Statement) {
        if let Some(Directive::GroupDefinition { group }) = statement.directive() {
            if let Some(group_path) = statement.directive_path() {
                let tree = self.groups.entry(group).or_default();
                if !group_path.is_empty() {
                    tree.insert_path(&group_path, Some(statement.clone()));
                }
            }
        }

        let path = statement.path().clone();
        self.master.insert_path(&path, Some(statement));
    }

    /// Record `apply-groups`/`apply-groups-except` directives of the master tree on their nodes
    ///
    /// Directives inside group definitions are skipped, they take effect once inherited.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn annotate_groups(&mut self, cluster_groups: &[String]) -> Result<(), Error> {
        let mut directives = vec![];
        self.master
            .visit_nodes_mut(&mut |path: &Path, node: &mut Node| {
                if path.starts_with_keys(&[GROUPS]) {
                    return;
                }
                let Some(statement) = &node.statement else {
                    return;
                };
                match statement.directive() {
                    Some(directive @ Directive::ApplyGroups { .. })
                    | Some(directive @ Directive::ApplyGroupsExcept { .. }) => {
                        if let Some(base) = statement.directive_path() {
                            directives.push((base, directive));
                        }
                    }
                    _ => {}
                }
            });

        for (base, directive) in directives {
            let node = self.master.get_exact_mut(&base)?;
            match directive {
                Directive::ApplyGroups { group } => {
                    for applied in expand_group(&group, cluster_groups) {
                        node.applied_groups.insert(applied);
                    }
                }
                Directive::ApplyGroupsExcept { group } => {
                    for excepted in expand_group(&group, cluster_groups) {
                        node.excepted_groups.insert(excepted.name);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Remove every `groups` definition from the master tree
    pub fn prune_group_definitions(&mut self) {
        self.master.root_mut().children.shift_remove(GROUPS);
    }

    /// The configuration in its current state
    pub fn dump(&self) -> Vec<Line> {
        self.master.dump()
    }

    /// One set line for every root-to-leaf path of the master tree, after `header`
    pub fn to_set_lines(&self, header: &str) -> String {
        self.master.to_set_lines(header)
    }

    /// Alternate annotating and merging until a pass changes nothing
    ///
    /// Returns the number of passes run. Gives up after `max_passes`, group applications
    /// that keep producing new content would never settle.
    #[tracing::instrument(level = "debug", skip(self, cluster_groups, issues))]
    pub fn inherit_groups(
        &mut self,
        cluster_groups: &[String],
        max_passes: usize,
        issues: &mut Issues,
    ) -> Result<usize, Error> {
        for pass in 1..=max_passes {
            self.annotate_groups(cluster_groups)?;
            if !inherit::apply_groups(&mut self.master, &self.groups, issues)? {
                tracing::debug!(passes = pass, "fixed point reached");
                return Ok(pass);
            }
        }

        tracing::warn!(max_passes, "group inheritance did not converge");
        issues.log(Issue::InheritanceDidNotConverge { passes: max_passes });
        Ok(max_passes)
    }

    /// Replace wildcard nodes of the master tree by their matching siblings
    pub fn expand_wildcards(&mut self, issues: &mut Issues) -> Result<(), Error> {
        wildcard::expand(&mut self.master, issues)
    }

    /// Expand `apply-path` directives in `lines`, see [apply_path]
    pub fn expand_apply_paths(
        &mut self,
        lines: Vec<Line>,
        issues: &mut Issues,
    ) -> Result<Vec<Line>, Error> {
        apply_path::expand(&mut self.master, lines, issues)
    }
}

fn covered(deactivated: &Tree, path: &Path) -> bool {
    let mut node = deactivated.root();
    for key in path.keys() {
        let Some(child) = node.child(key) else {
            return false;
        };
        if child.deactivated {
            return true;
        }
        node = child;
    }
    false
}

/// `${node}` stands for both cluster node groups
fn expand_group(group: &str, cluster_groups: &[String]) -> Vec<AppliedGroup> {
    if group == NODE_GROUP {
        return cluster_groups
            .iter()
            .map(|name| AppliedGroup {
                name: name.clone(),
                cluster: true,
            })
            .collect();
    }

    vec![AppliedGroup {
        name: group.to_string(),
        cluster: false,
    }]
}
