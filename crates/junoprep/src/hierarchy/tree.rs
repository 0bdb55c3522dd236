//! trie keyed by path segment
use crate::issue::Error;
use crate::path::{Path, Segment};
use crate::statement::{Diagnostic, Line, Statement};

/// A group applied at a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppliedGroup {
    pub name: String,
    /// Applied through `${node}`, may not contribute `system host-name`
    pub cluster: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    /// `None` for the root
    segment: Option<Segment>,
    pub(crate) statement: Option<Statement>,
    pub(crate) children: indexmap::IndexMap<String, Node>,
    pub(crate) applied_groups: indexmap::IndexSet<AppliedGroup>,
    pub(crate) excepted_groups: indexmap::IndexSet<String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// only used in the deactivation tree
    pub(crate) deactivated: bool,
    pub(crate) source_group: Option<String>,
}

impl Node {
    fn with_segment(segment: Segment) -> Self {
        Self {
            segment: Some(segment),
            ..Default::default()
        }
    }

    /// Fresh node with the same text and line, nothing else
    pub fn copy(&self) -> Self {
        Self {
            segment: self.segment.clone(),
            ..Default::default()
        }
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    pub fn statement(&self) -> Option<&Statement> {
        self.statement.as_ref()
    }

    pub fn children(&self) -> &indexmap::IndexMap<String, Node> {
        &self.children
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    pub fn applied_groups(&self) -> impl Iterator<Item = &AppliedGroup> {
        self.applied_groups.iter()
    }

    pub fn excepted_groups(&self) -> impl Iterator<Item = &str> {
        self.excepted_groups.iter().map(String::as_str)
    }

    pub fn source_group(&self) -> Option<&str> {
        self.source_group.as_deref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.segment.as_ref().is_some_and(Segment::is_wildcard)
    }

    /// Child satisfying `query`: the literal child with the same key, else the first wildcard
    /// child matching it
    pub fn first_matching_child(&self, query: &Segment) -> Option<&Node> {
        if let Some(child) = self.children.get(query.key()) {
            if child
                .segment
                .as_ref()
                .is_some_and(|segment| query.is_matched_by(segment))
            {
                return Some(child);
            }
        }

        self.children.values().find(|child| {
            child
                .segment
                .as_ref()
                .is_some_and(|segment| segment.is_wildcard() && query.is_matched_by(segment))
        })
    }

    fn get(&self, keys: &[&str]) -> Option<&Node> {
        let Some((first, rest)) = keys.split_first() else {
            return Some(self);
        };
        self.children.get(*first)?.get(rest)
    }

    fn get_mut(&mut self, keys: &[&str]) -> Option<&mut Node> {
        let Some((first, rest)) = keys.split_first() else {
            return Some(self);
        };
        self.children.get_mut(*first)?.get_mut(rest)
    }

    fn dump_into(&self, lines: &mut Vec<Line>) {
        if let Some(statement) = &self.statement {
            lines.push(Line::Set(statement.clone()));
        }
        lines.extend(self.diagnostics.iter().cloned().map(Line::Unrecognized));
        for child in self.children.values() {
            child.dump_into(lines);
        }
    }

    /// Add a set line to `output` prefixed by `prefix` for each path from this node to a leaf
    fn append_set_lines(&self, prefix: &str, output: &mut String) {
        if self.children.is_empty() {
            output.push_str(prefix);
            output.push('\n');
        }
        for child in self.children.values() {
            let text = child.segment.as_ref().map(Segment::text).unwrap_or_default();
            child.append_set_lines(&format!("{prefix} {text}"), output);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    root: Node,
}

impl Tree {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Create or reuse the nodes along `path`, returns the final node
    ///
    /// A given statement replaces the one at the final node.
    pub fn insert_path(&mut self, path: &Path, statement: Option<Statement>) -> &mut Node {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node
                .children
                .entry(segment.key().to_string())
                .or_insert_with(|| Node::with_segment(segment.clone()));
        }
        if statement.is_some() {
            node.statement = statement;
        }
        node
    }

    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.root.get(&path.keys())
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Node> {
        self.root.get_mut(&path.keys())
    }

    /// Lookup of a node known to exist
    pub fn get_exact_mut(&mut self, path: &Path) -> Result<&mut Node, Error> {
        self.root
            .get_mut(&path.keys())
            .ok_or_else(|| Error::MissingNode {
                path: path.to_string(),
            })
    }

    /// Tolerant lookup where wildcards in this tree may satisfy literals of `path`
    ///
    /// On failure returns how many segments did match.
    pub fn first_match(&self, path: &Path) -> Result<&Node, usize> {
        let mut node = &self.root;
        for (depth, segment) in path.segments().iter().enumerate() {
            node = node.first_matching_child(segment).ok_or(depth)?;
        }
        Ok(node)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Node> {
        let keys = path.keys();
        let (last, parent) = keys.split_last()?;
        self.root.get_mut(parent)?.children.shift_remove(*last)
    }

    /// Attach a diagnostic to the node at `path`, creating it when needed
    pub fn attach_diagnostic(&mut self, path: &Path, diagnostic: Diagnostic) {
        self.insert_path(path, None).diagnostics.push(diagnostic);
    }

    /// Every statement and diagnostic in pre-order, this is the configuration
    pub fn dump(&self) -> Vec<Line> {
        let mut lines = vec![];
        self.root.dump_into(&mut lines);
        lines
    }

    /// `header` followed by one set line per path from the root to a leaf
    pub fn to_set_lines(&self, header: &str) -> String {
        let mut output = String::from(header);
        for child in self.root.children.values() {
            let text = child.segment.as_ref().map(Segment::text).unwrap_or_default();
            child.append_set_lines(&format!("set {text}"), &mut output);
        }
        output
    }
}
