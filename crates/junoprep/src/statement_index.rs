//! flat prefix trie over literal statement words
//!
//! Used by the ordering engine only: every `set`/`deactivate` line is stored at the node its
//! words lead to, which makes `delete` (drop a subtree) and `insert` (move a subtree among its
//! siblings) simple tree edits. Flattening the trie in pre-order yields the reordered lines.
use crate::statement::{Line, Position};

#[derive(Debug, Default)]
pub struct StatementIndex {
    root: IndexNode,
}

#[derive(Debug, Default)]
pub struct IndexNode {
    pub lines: Vec<Line>,
    pub children: indexmap::IndexMap<String, IndexNode>,
}

#[derive(Debug, PartialEq)]
pub enum MoveError {
    MissingSource,
    MissingDestination,
}

impl StatementIndex {
    pub fn insert(&mut self, words: &[&str], line: Line) {
        self.root.get_or_insert(words).lines.push(line);
    }

    pub fn get(&self, words: &[&str]) -> Option<&IndexNode> {
        self.root.get(words)
    }

    pub fn get_mut(&mut self, words: &[&str]) -> Option<&mut IndexNode> {
        self.root.get_mut(words)
    }

    /// Remove the subtree at `words`, returns `None` when there is none
    pub fn remove(&mut self, words: &[&str]) -> Option<IndexNode> {
        let (last, parent) = words.split_last()?;
        self.root.get_mut(parent)?.children.shift_remove(*last)
    }

    /// Move the subtree at `source` right before/after its sibling `destination`
    ///
    /// Nothing is modified when either subtree is missing.
    pub fn move_subtree(
        &mut self,
        source: &[&str],
        destination: &str,
        position: Position,
    ) -> Result<(), MoveError> {
        let Some((last, parent)) = source.split_last() else {
            return Err(MoveError::MissingSource);
        };
        let parent = self.root.get_mut(parent).ok_or(MoveError::MissingSource)?;

        if !parent.children.contains_key(*last) {
            return Err(MoveError::MissingSource);
        }
        if !parent.children.contains_key(destination) {
            return Err(MoveError::MissingDestination);
        }
        if *last == destination {
            return Ok(());
        }

        let Some(subtree) = parent.children.shift_remove(*last) else {
            return Err(MoveError::MissingSource);
        };
        let Some(destination_index) = parent.children.get_index_of(destination) else {
            return Err(MoveError::MissingDestination);
        };
        let index = match position {
            Position::Before => destination_index,
            Position::After => destination_index + 1,
        };
        parent.children.shift_insert(index, last.to_string(), subtree);

        Ok(())
    }

    /// All lines in pre-order: a node's own lines before its children
    pub fn flatten(self) -> Vec<Line> {
        let mut lines = vec![];
        self.root.flatten_into(&mut lines);
        lines
    }
}

impl IndexNode {
    fn get(&self, words: &[&str]) -> Option<&IndexNode> {
        let Some((first, rest)) = words.split_first() else {
            return Some(self);
        };
        self.children.get(*first)?.get(rest)
    }

    fn get_mut(&mut self, words: &[&str]) -> Option<&mut IndexNode> {
        let Some((first, rest)) = words.split_first() else {
            return Some(self);
        };
        self.children.get_mut(*first)?.get_mut(rest)
    }

    fn get_or_insert(&mut self, words: &[&str]) -> &mut IndexNode {
        let Some((first, rest)) = words.split_first() else {
            return self;
        };
        self.children
            .entry(first.to_string())
            .or_default()
            .get_or_insert(rest)
    }

    fn flatten_into(self, lines: &mut Vec<Line>) {
        lines.extend(self.lines);
        for (_key, child) in self.children {
            child.flatten_into(lines);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flat_config;
    use pretty_assertions::assert_eq;

    fn index_of(lines: Vec<Line>) -> StatementIndex {
        let mut index = StatementIndex::default();
        for line in lines {
            let keys: Vec<String> = match &line {
                Line::Set(s) => s.path().keys().iter().map(|k| k.to_string()).collect(),
                _ => unreachable!(),
            };
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            index.insert(&keys, line);
        }
        index
    }

    fn rendered(index: StatementIndex) -> Vec<String> {
        index.flatten().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn flatten_groups_by_path() {
        let index = index_of(flat_config! {
            "set a b 1",
            "set c d",
            "set a b 2",
        });
        assert_eq!(rendered(index), vec!["set a b 1", "set a b 2", "set c d"]);
    }

    #[test]
    fn remove_subtree() {
        let mut index = index_of(flat_config! {
            "set a b",
            "set a b c",
            "set a x",
        });
        assert!(index.remove(&["a", "b"]).is_some());
        assert!(index.remove(&["a", "b"]).is_none());
        assert!(index.remove(&["z"]).is_none());
        assert_eq!(rendered(index), vec!["set a x"]);
    }

    #[test]
    fn move_before_and_after() {
        let mut index = index_of(flat_config! {
            "set t 1 x",
            "set t 2 y",
            "set t 3 z",
        });
        index
            .move_subtree(&["t", "3"], "1", Position::Before)
            .unwrap();
        index
            .move_subtree(&["t", "1"], "2", Position::After)
            .unwrap();
        assert_eq!(rendered(index), vec!["set t 3 z", "set t 2 y", "set t 1 x"]);
    }

    #[test]
    fn move_missing_leaves_index_untouched() {
        let mut index = index_of(flat_config! {"set t 1", "set t 2"});
        assert_eq!(
            index.move_subtree(&["t", "9"], "1", Position::Before),
            Err(MoveError::MissingSource)
        );
        assert_eq!(
            index.move_subtree(&["t", "2"], "9", Position::Before),
            Err(MoveError::MissingDestination)
        );
        assert_eq!(rendered(index), vec!["set t 1", "set t 2"]);
    }
}
