//! group inheritance
//!
//! Merges the content of applied groups into the master tree, one pass per call of
//! [apply_groups]. A node inherits from the groups applied at itself and at its ancestors,
//! closest first. Groups listed in `apply-groups-except` at the node (or, if it has none, at
//! the closest ancestor with any) are skipped.
//!
//! How children are merged depends on the position:
//! - list positions (see [catalog](super::catalog)) keep their children and append what the
//!   groups add, highest priority group first
//! - every other position is rebuilt: groups are merged from lowest to highest priority, a key
//!   merged again moves to the end and takes the later statement, then the directly written
//!   children are put back on top
//!
//! For a last-wins reader this means: direct configuration beats every group, and an earlier
//! applied group beats a later one.
use super::catalog::LIST_POSITIONS;
use super::tree::{AppliedGroup, Node, Tree};
use super::NODE_GROUP;
use crate::issue::{Error, Issue, Issues};
use crate::path::Path;
use crate::statement::{is_host_name_path, Statement, APPLY_GROUPS, GROUPS};
use indexmap::{IndexMap, IndexSet};

/// Group context handed down from the ancestors
#[derive(Debug, Default)]
struct Inherited {
    /// highest priority first
    priority: Vec<AppliedGroup>,
    excepted: IndexSet<String>,
}

impl Inherited {
    fn at(&self, node: &Node) -> Self {
        let mut priority: Vec<AppliedGroup> = node.applied_groups.iter().cloned().collect();
        for group in &self.priority {
            if !priority.contains(group) {
                priority.push(group.clone());
            }
        }

        let excepted = if node.excepted_groups.is_empty() {
            self.excepted.clone()
        } else {
            node.excepted_groups.clone()
        };

        Self { priority, excepted }
    }
}

/// A group subtree to inherit from
struct Source<'g> {
    group: &'g str,
    cluster: bool,
    node: &'g Node,
}

/// Run one inheritance pass over `master`, returns whether anything changed
#[tracing::instrument(level = "trace", skip_all)]
pub fn apply_groups(
    master: &mut Tree,
    groups: &IndexMap<String, Tree>,
    issues: &mut Issues,
) -> Result<bool, Error> {
    let mut path = Path::default();
    inherit(
        master.root_mut(),
        &mut path,
        &Inherited::default(),
        groups,
        issues,
    )
}

fn inherit(
    node: &mut Node,
    path: &mut Path,
    ancestors: &Inherited,
    groups: &IndexMap<String, Tree>,
    issues: &mut Issues,
) -> Result<bool, Error> {
    let inherited = ancestors.at(node);
    let sources = find_sources(node, path, &inherited, groups, issues);

    let mut changed = if sources.is_empty() {
        false
    } else if LIST_POSITIONS.is_list(path) {
        merge_list(node, path, &sources)?
    } else {
        merge_scalar(node, path, &sources)?
    };

    let at_root = path.is_empty();
    for (key, child) in node.children.iter_mut() {
        // group definitions are templates, never targets
        if at_root && key == GROUPS {
            continue;
        }
        let Some(segment) = child.segment().cloned() else {
            continue;
        };
        path.push(segment);
        let result = inherit(child, path, &inherited, groups, issues);
        path.pop();
        changed |= result?;
    }

    Ok(changed)
}

/// The group nodes corresponding to `path`, highest priority first
///
/// Problems are only reported at the node applying the group, a group not covering every
/// descendant is normal.
fn find_sources<'g>(
    node: &Node,
    path: &Path,
    inherited: &Inherited,
    groups: &'g IndexMap<String, Tree>,
    issues: &mut Issues,
) -> Vec<Source<'g>> {
    let mut sources = vec![];
    for applied in &inherited.priority {
        if inherited.excepted.contains(&applied.name) {
            tracing::trace!(group = %applied.name, %path, "excepted");
            continue;
        }
        let applied_here = node.applied_groups.contains(applied);

        let Some((group, tree)) = groups.get_key_value(&applied.name) else {
            if applied_here {
                issues.log(Issue::UndefinedGroup {
                    group: applied.name.clone(),
                    path: path.to_string(),
                    line: directive_line(node, applied),
                });
            }
            continue;
        };

        match tree.first_match(path) {
            Ok(found) => sources.push(Source {
                group: group.as_str(),
                cluster: applied.cluster,
                node: found,
            }),
            Err(depth) if applied_here && depth > 0 => issues.log(Issue::PartialGroupMatch {
                group: group.clone(),
                path: path.to_string(),
                matched: path.prefix(depth).to_string(),
                line: directive_line(node, applied),
            }),
            Err(_) => {}
        }
    }
    sources
}

/// Line of the `apply-groups` statement that applied `applied` at `node`
fn directive_line(node: &Node, applied: &AppliedGroup) -> u32 {
    let name = if applied.cluster {
        NODE_GROUP
    } else {
        applied.name.as_str()
    };
    node.child(APPLY_GROUPS)
        .and_then(|directive| directive.child(name))
        .and_then(Node::statement)
        .map_or(0, Statement::line)
}

/// Children of `source` that may be copied to `path`, with their path in the master tree
fn mergeable<'g>(
    source: &Source<'g>,
    path: &Path,
) -> impl Iterator<Item = (&'g String, &'g Node, Path)> {
    let cluster = source.cluster;
    let node = source.node;
    let path = path.clone();
    node.children
        .iter()
        .filter(|(_key, child)| !child.is_wildcard())
        .filter_map(move |(key, child)| {
            let mut child_path = path.clone();
            child_path.push(child.segment()?.clone());
            // a node group must not rename the other node
            if cluster && is_host_name_path(&child_path) {
                return None;
            }
            Some((key, child, child_path))
        })
}

/// Shallow copy of a group node for the master tree, its statement synthesized at `path`
fn inherited_copy(group_node: &Node, path: &Path, group: &str) -> Result<Node, Error> {
    let mut copy = group_node.copy();
    if let Some(statement) = group_node.statement() {
        copy.statement = Some(Statement::synthesize(path, statement.line())?);
    }
    copy.source_group = Some(group.to_string());
    Ok(copy)
}

fn merge_scalar(node: &mut Node, path: &Path, sources: &[Source<'_>]) -> Result<bool, Error> {
    let originals = std::mem::take(&mut node.children);
    let original_count = originals.len();
    let mut changed = false;

    for source in sources.iter().rev() {
        for (key, group_child, child_path) in mergeable(source, path) {
            let copy = inherited_copy(group_child, &child_path, source.group)?;
            node.children.shift_remove(key);
            node.children.insert(key.clone(), copy);
        }
    }

    for (key, mut original) in originals {
        if let Some(inherited) = node.children.shift_remove(&key) {
            if original.statement.is_none() && inherited.statement.is_some() {
                original.statement = inherited.statement;
                original.source_group = inherited.source_group;
                changed = true;
            }
        }
        node.children.insert(key, original);
    }

    if node.children.len() > original_count {
        tracing::trace!(%path, added = node.children.len() - original_count, "inherited");
        changed = true;
    }
    Ok(changed)
}

fn merge_list(node: &mut Node, path: &Path, sources: &[Source<'_>]) -> Result<bool, Error> {
    let mut changed = false;

    for source in sources {
        for (key, group_child, child_path) in mergeable(source, path) {
            match node.children.get_mut(key) {
                Some(existing) => {
                    if existing.statement.is_none() && group_child.statement().is_some() {
                        let filled = inherited_copy(group_child, &child_path, source.group)?;
                        existing.statement = filled.statement;
                        existing.source_group = filled.source_group;
                        changed = true;
                    }
                }
                None => {
                    tracing::trace!(path = %child_path, group = source.group, "appended");
                    let copy = inherited_copy(group_child, &child_path, source.group)?;
                    node.children.insert(key.clone(), copy);
                    changed = true;
                }
            }
        }
    }

    Ok(changed)
}
