//! activate / delete / insert
//!
//! Resolves the line editing directives before anything else looks at the configuration.
//! `delete` and `insert` lines are consumed here, `activate` cancels earlier `deactivate` lines
//! at the same path. The result only contains `set`, `deactivate` and unrecognized lines.
use crate::issue::{Issue, Issues};
use crate::statement::{Insert, Line};
use crate::statement_index::{MoveError, StatementIndex};

#[tracing::instrument(level = "trace", skip_all)]
pub fn apply_ordering(lines: Vec<Line>, issues: &mut Issues) -> Vec<Line> {
    let dirty = lines
        .iter()
        .any(|line| matches!(line, Line::Delete(_) | Line::Insert(_)));
    if !dirty {
        return cancel_deactivations(lines);
    }

    let mut index = StatementIndex::default();
    // unrecognized lines stay with the statement in front of them
    let mut last_keys: Vec<String> = vec![];

    for line in lines {
        match &line {
            Line::Set(statement) | Line::Deactivate(statement) => {
                last_keys = owned_keys(statement.path());
            }
            Line::Unrecognized(_) => {}
            Line::Delete(statement) => {
                let keys = owned_keys(statement.path());
                if index.remove(&borrowed(&keys)).is_none() {
                    issues.log(Issue::MissingDeleteTarget {
                        path: statement.path().to_string(),
                        line: statement.line(),
                    });
                } else {
                    tracing::debug!(path = %statement.path(), "deleted");
                }
                continue;
            }
            Line::Activate(statement) => {
                let keys = owned_keys(statement.path());
                if let Some(node) = index.get_mut(&borrowed(&keys)) {
                    node.lines
                        .retain(|line| !matches!(line, Line::Deactivate(_)));
                }
                continue;
            }
            Line::Insert(insert) => {
                apply_insert(&mut index, insert, issues);
                continue;
            }
        }

        index.insert(&borrowed(&last_keys), line);
    }

    index.flatten()
}

fn apply_insert(index: &mut StatementIndex, insert: &Insert, issues: &mut Issues) {
    let source = owned_keys(&insert.source);
    if source.len() < 2 {
        issues.log(Issue::InsertSourceTooShort {
            path: insert.source.to_string(),
            line: insert.line,
        });
        return;
    }

    let destination_path = insert.destination();
    let destination = owned_keys(&destination_path);
    let same_parent = destination.len() == source.len()
        && destination[..destination.len() - 1] == source[..source.len() - 1];
    if !same_parent {
        issues.log(Issue::InsertParentMismatch {
            moved: insert.source.to_string(),
            destination: destination_path.to_string(),
            line: insert.line,
        });
        return;
    }

    let Some(destination_key) = destination.last() else {
        return;
    };
    match index.move_subtree(&borrowed(&source), destination_key, insert.position) {
        Ok(()) => {
            tracing::debug!(source = %insert.source, destination = %destination_path, "moved");
        }
        Err(MoveError::MissingSource) => issues.log(Issue::MissingInsertSource {
            path: insert.source.to_string(),
            line: insert.line,
        }),
        Err(MoveError::MissingDestination) => issues.log(Issue::MissingInsertDestination {
            path: destination_path.to_string(),
            line: insert.line,
        }),
    }
}

/// Drop `activate` lines with the earlier `deactivate` lines at the same path, order is kept
fn cancel_deactivations(lines: Vec<Line>) -> Vec<Line> {
    let mut kept: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Line::Activate(statement) = &line {
            let keys = statement.path().keys();
            kept.retain(|line| {
                !matches!(line, Line::Deactivate(deactivated) if deactivated.path().keys() == keys)
            });
            continue;
        }
        kept.push(line);
    }
    kept
}

fn owned_keys(path: &crate::path::Path) -> Vec<String> {
    path.keys().into_iter().map(str::to_string).collect()
}

fn borrowed(keys: &[String]) -> Vec<&str> {
    keys.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flat_config;
    use pretty_assertions::assert_eq;

    fn ordered(lines: Vec<Line>) -> (Vec<String>, Vec<Issue>) {
        let mut issues = Issues::new();
        let lines = apply_ordering(lines, &mut issues);
        (
            lines.iter().map(ToString::to_string).collect(),
            issues.into_vec(),
        )
    }

    #[test]
    fn untouched_without_directives() {
        let (lines, issues) = ordered(flat_config! {
            "set b 1",
            "set a 1",
            "deactivate b",
            "set b 2",
        });
        assert_eq!(lines, vec!["set b 1", "set a 1", "deactivate b", "set b 2"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn delete_cascades() {
        let (lines, issues) = ordered(flat_config! {
            "set a b",
            "set a b c",
            "set a b c d",
            "deactivate a b c",
            "set a x",
            "delete a b",
        });
        assert_eq!(lines, vec!["set a x"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn delete_missing_is_a_noop() {
        let (lines, issues) = ordered(flat_config! {"set a x", "delete a b"});
        assert_eq!(lines, vec!["set a x"]);
        assert!(matches!(
            issues.as_slice(),
            [Issue::MissingDeleteTarget { line: 2, .. }]
        ));
    }

    #[test]
    fn delete_then_set_again() {
        let (lines, _) = ordered(flat_config! {"set a b 1", "delete a b", "set a b 2"});
        assert_eq!(lines, vec!["set a b 2"]);
    }

    #[test]
    fn insert_moves_subtree() {
        let (lines, issues) = ordered(flat_config! {
            "set f term a from x",
            "set f term a then accept",
            "set f term b then reject",
            "insert f term b before term a",
        });
        assert_eq!(
            lines,
            vec![
                "set f term b then reject",
                "set f term a from x",
                "set f term a then accept",
            ]
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn insert_failures_are_issues() {
        let (lines, issues) = ordered(flat_config! {
            "set f term a",
            "set f term b",
            "insert f before g",
            "insert f term c before term a",
            "insert f term b after term z",
            "insert f term b after other a",
        });
        assert_eq!(lines, vec!["set f term a", "set f term b"]);
        assert!(matches!(
            issues.as_slice(),
            [
                Issue::InsertSourceTooShort { .. },
                Issue::MissingInsertSource { .. },
                Issue::MissingInsertDestination { .. },
                Issue::InsertParentMismatch { .. },
            ]
        ));
    }

    #[test]
    fn activate_cancels_deactivate() {
        let (lines, _) = ordered(flat_config! {
            "set a b",
            "deactivate a b",
            "deactivate a",
            "activate a b",
        });
        assert_eq!(lines, vec!["set a b", "deactivate a"]);
    }

    #[test]
    fn activate_alone_keeps_the_order() {
        let (lines, issues) = ordered(flat_config! {
            "set b 1",
            "set a 1",
            "set b 2",
            "deactivate a",
            "activate a",
        });
        assert_eq!(lines, vec!["set b 1", "set a 1", "set b 2"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn activate_is_applied_before_reordering() {
        let (lines, _) = ordered(flat_config! {
            "set a b",
            "deactivate a b",
            "deactivate a",
            "activate a b",
            "delete x",
        });
        assert_eq!(lines, vec!["deactivate a", "set a b"]);
    }

    #[test]
    fn unrecognized_lines_follow_their_statement() {
        let (lines, _) = ordered(flat_config! {
            "set t a 1",
            "bogus line",
            "set t b 1",
            "insert t b before t a",
        });
        assert_eq!(lines, vec!["set t b 1", "set t a 1", "bogus line"]);
    }
}
