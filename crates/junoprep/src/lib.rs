//! # junoprep - flat junos configuration preprocessor
//!
//! Turns a flat junos configuration (`set ...` lines as produced by `show configuration | display set`)
//! into the plain list of statements it is equivalent to: groups inherited, deactivated parts
//! removed, `insert`/`delete` applied, `apply-path` expanded.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `junoprep` works internally.
//!
//! ### Terms
//!
//! - a `statement` is the path of a `set` line, e.g. `interfaces ge-0/0/0 unit 0`
//! - a `path` is made of `segments`, each one word of the statement
//! - a segment is either a literal (`ge-0/0/0`) or a wildcard (`<ge-*>`)
//! - a `group` is a named template, defined with `set groups <name> ...` and applied with
//!   `apply-groups <name>` at any position of the configuration
//!
//! ```text
//! set groups jumbo interfaces <ge-*> mtu 9000
//! set interfaces ge-0/0/0 unit 0 family inet address 192.0.2.1/24
//! set interfaces apply-groups jumbo
//! ```
//!
//! is equivalent to
//!
//! ```text
//! set interfaces ge-0/0/0 mtu 9000
//! set interfaces ge-0/0/0 unit 0 family inet address 192.0.2.1/24
//! set interfaces apply-groups jumbo
//! ```
//!
//! ### Reading
//!
//! [statement::read] classifies each line as `set`, `deactivate`, `activate`, `delete` or
//! `insert`. Lines it does not understand are kept as [statement::Diagnostic]s and end up in the
//! output at the position they were found at.
//!
//! Directives like `apply-groups` are no separate kind of line. They are recognized by the shape
//! of the statement's path (see [statement::Statement::directive]) so that statements created
//! later on are recognized the same way.
//!
//! ### Ordering
//!
//! see [ordering::apply_ordering]
//!
//! `delete` and `insert` refer to statements written before them. All statements are put into a
//! [statement_index::StatementIndex] (a trie over the words of each statement) which is edited
//! and then flattened back into lines.
//!
//! ### Hierarchy
//!
//! see [hierarchy::Hierarchy]
//!
//! The statements form a tree, one edge per word. There is the master tree (the configuration),
//! one tree per group and the deactivation tree.
//!
//! Groups are inherited in passes (see [hierarchy::inherit]) until a pass changes nothing. A
//! group may itself contain `apply-groups`, which only takes effect once it was inherited.
//!
//! Any statement in the master tree can be synthesized at a different path
//! ([statement::Statement::synthesize]). Inherited statements are synthesized at their new
//! position but keep the line number of the group statement they stem from.
//!
//! ### Output
//!
//! The master tree is dumped in pre-order: a node's statement before its children's. Finally
//! `apply-path` directives are expanded in the dumped lines.
//!
//! Everything is orchestrated by [preprocess::preprocess].
pub mod hierarchy;
pub mod issue;
pub mod ordering;
pub mod path;
pub mod preprocess;
pub mod statement;
pub mod statement_index;
mod visit;

pub use preprocess::{preprocess, Options, Preprocessed};
