//! errors and issues
//!
//! An [Error] aborts preprocessing of a configuration. An [Issue] is recorded and
//! preprocessing continues with the offending directive contributing nothing.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("line {line}: improperly-formatted wildcard: {text}")]
    MalformedWildcard { text: String, line: u32 },
    #[error("no node at path known to exist: {path}")]
    MissingNode { path: String },
    #[error("line {line}: unable to synthesize statement: {text}")]
    Synthesis { text: String, line: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Issue {
    #[error("line {line}: no such group: \"{group}\" (applied at \"{path}\")")]
    UndefinedGroup {
        group: String,
        path: String,
        line: u32,
    },
    #[error("line {line}: no matching path in group \"{group}\" for \"{path}\": partial path match within applied group: \"{matched}\"")]
    PartialGroupMatch {
        group: String,
        path: String,
        matched: String,
        line: u32,
    },
    #[error("line {line}: cannot insert, no statement at \"{path}\"")]
    MissingInsertSource { path: String, line: u32 },
    #[error("line {line}: cannot insert, no statement at destination \"{path}\"")]
    MissingInsertDestination { path: String, line: u32 },
    #[error("line {line}: cannot insert \"{moved}\" relative to \"{destination}\", they do not share a parent")]
    InsertParentMismatch {
        moved: String,
        destination: String,
        line: u32,
    },
    #[error("line {line}: cannot insert top level statement \"{path}\"")]
    InsertSourceTooShort { path: String, line: u32 },
    #[error("line {line}: nothing to delete at \"{path}\"")]
    MissingDeleteTarget { path: String, line: u32 },
    #[error("line {line}: malformed apply-path \"{template}\"")]
    MalformedApplyPath { template: String, line: u32 },
    #[error("line {line}: wildcard \"{path}\" matches nothing and was dropped")]
    UnresolvedWildcard { path: String, line: u32 },
    #[error("group inheritance did not converge after {passes} passes")]
    InheritanceDidNotConverge { passes: usize },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::PartialGroupMatch { .. } | Issue::MissingDeleteTarget { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// Issues collected over a whole preprocessing run
#[derive(derive_new::new, Debug, Default)]
pub struct Issues {
    #[new(default)]
    issues: Vec<Issue>,
}

impl Issues {
    /// Record `issue`, unless the very same issue was recorded before
    ///
    /// Inheritance runs in passes and finds the same problem on every one of them.
    pub fn log(&mut self, issue: Issue) {
        if self.issues.contains(&issue) {
            return;
        }
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_vec(self) -> Vec<Issue> {
        self.issues
    }
}
