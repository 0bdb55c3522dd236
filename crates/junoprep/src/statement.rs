//! flat statements and the line reader
//!
//! A flat junos configuration is one statement per line:
//! ```text
//! set interfaces ge-0/0/0 unit 0 family inet address 10.0.0.1/24
//! deactivate interfaces ge-0/0/0 unit 0
//! insert policy-options policy-statement p term b before term a
//! ```
//!
//! [read] turns text into [Line]s. The same reader is used to synthesize statements at new
//! paths (see [Statement::synthesize]) so that synthesized statements classify exactly like
//! written ones.
use crate::issue::Error;
use crate::path::{unquote, Path, Segment};

pub const GROUPS: &str = "groups";
pub const APPLY_GROUPS: &str = "apply-groups";
pub const APPLY_GROUPS_EXCEPT: &str = "apply-groups-except";
pub const APPLY_PATH: &str = "apply-path";

/// One line of a flat configuration
#[derive(Debug, Clone)]
pub enum Line {
    Set(Statement),
    Deactivate(Statement),
    Activate(Statement),
    Delete(Statement),
    Insert(Insert),
    /// A line the reader could not classify, kept so it can be reported
    Unrecognized(Diagnostic),
}

impl Line {
    pub fn line(&self) -> u32 {
        match self {
            Line::Set(s) | Line::Deactivate(s) | Line::Activate(s) | Line::Delete(s) => s.line,
            Line::Insert(insert) => insert.line,
            Line::Unrecognized(diagnostic) => diagnostic.line,
        }
    }

    pub fn as_set(&self) -> Option<&Statement> {
        match self {
            Line::Set(statement) => Some(statement),
            _ => None,
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Set(s) => write!(f, "set {}", s.path),
            Line::Deactivate(s) => write!(f, "deactivate {}", s.path),
            Line::Activate(s) => write!(f, "activate {}", s.path),
            Line::Delete(s) => write!(f, "delete {}", s.path),
            Line::Insert(insert) => write!(
                f,
                "insert {} {} {}",
                insert.source,
                insert.position,
                insert.relative_destination
            ),
            Line::Unrecognized(diagnostic) => f.write_str(&diagnostic.text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    path: Path,
    line: u32,
}

impl Statement {
    pub fn new(path: Path, line: u32) -> Self {
        Self { path, line }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Build the statement `set <path>` through the reader, every word on line `line`
    pub fn synthesize(path: &Path, line: u32) -> Result<Statement, Error> {
        let text = format!("set {path}");
        match read_line(&text, line) {
            Some(Line::Set(statement)) => Ok(statement),
            _ => Err(Error::Synthesis { text, line }),
        }
    }

    /// Classify this statement by the shape of its path
    pub fn directive(&self) -> Option<Directive> {
        let keys = self.path.keys();
        if keys.first() == Some(&GROUPS) && keys.len() >= 2 {
            return Some(Directive::GroupDefinition {
                group: keys[1].to_string(),
            });
        }

        let [.., keyword, argument] = keys.as_slice() else {
            return None;
        };
        let argument = argument.to_string();
        match *keyword {
            APPLY_GROUPS => Some(Directive::ApplyGroups { group: argument }),
            APPLY_GROUPS_EXCEPT => Some(Directive::ApplyGroupsExcept { group: argument }),
            APPLY_PATH => Some(Directive::ApplyPath { template: argument }),
            _ => None,
        }
    }

    /// Path the directive applies to, i.e. without the trailing `<keyword> <argument>`
    ///
    /// For a group definition this is the path inside the group.
    pub fn directive_path(&self) -> Option<Path> {
        match self.directive()? {
            Directive::GroupDefinition { .. } => Some(self.path.suffix(2)),
            _ => Some(self.path.prefix(self.path.len() - 2)),
        }
    }

    /// `system host-name ...`, which a node specific group must never contribute
    pub fn is_host_name(&self) -> bool {
        is_host_name_path(&self.path)
    }
}

pub(crate) fn is_host_name_path(path: &Path) -> bool {
    path.starts_with_keys(&["system", "host-name"])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `groups <group> ...`
    GroupDefinition { group: String },
    /// `... apply-groups <group>`
    ApplyGroups { group: String },
    /// `... apply-groups-except <group>`
    ApplyGroupsExcept { group: String },
    /// `... apply-path "<template>"`
    ApplyPath { template: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Before => f.write_str("before"),
            Position::After => f.write_str("after"),
        }
    }
}

/// `insert <source> before|after <destination>`
///
/// The destination is written relative to the source: its words replace the same number of
/// trailing source words (`insert a term x before term y` moves `a term x` before `a term y`).
#[derive(Debug, Clone)]
pub struct Insert {
    pub source: Path,
    pub position: Position,
    pub relative_destination: Path,
    pub line: u32,
}

impl Insert {
    /// Destination expanded to a full path
    pub fn destination(&self) -> Path {
        let keep = self
            .source
            .len()
            .saturating_sub(self.relative_destination.len());
        let mut destination = self.source.prefix(keep);
        for segment in self.relative_destination.segments() {
            destination.push(segment.clone());
        }
        destination
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub text: String,
    pub line: u32,
}

/// Read a whole flat configuration, skipping blank lines and comments
pub fn read(text: &str) -> Vec<Line> {
    text.lines()
        .enumerate()
        .filter_map(|(index, raw)| read_line(raw, index as u32 + 1))
        .collect()
}

/// Read a single line, `None` when it carries no statement
pub fn read_line(raw: &str, line: u32) -> Option<Line> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let unrecognized = || {
        tracing::debug!(line, text = trimmed, "unrecognized line");
        Line::Unrecognized(Diagnostic {
            text: trimmed.to_string(),
            line,
        })
    };

    let Some(words) = split_words(trimmed) else {
        return Some(unrecognized());
    };
    let Some((keyword, rest)) = words.split_first() else {
        return Some(unrecognized());
    };
    if rest.is_empty() || keyword.quoted {
        return Some(unrecognized());
    }

    let statement = || Statement::new(to_path(rest, line), line);
    let parsed = match keyword.text.as_str() {
        "set" => Line::Set(statement()),
        "deactivate" => Line::Deactivate(statement()),
        "activate" => Line::Activate(statement()),
        "delete" => Line::Delete(statement()),
        "insert" => {
            let Some(split) = rest
                .iter()
                .rposition(|w| !w.quoted && (w.text == "before" || w.text == "after"))
            else {
                return Some(unrecognized());
            };
            if split == 0 || split == rest.len() - 1 {
                return Some(unrecognized());
            }
            let position = if rest[split].text == "before" {
                Position::Before
            } else {
                Position::After
            };
            Line::Insert(Insert {
                source: to_path(&rest[..split], line),
                position,
                relative_destination: to_path(&rest[split + 1..], line),
                line,
            })
        }
        _ => return Some(unrecognized()),
    };

    Some(parsed)
}

/// Read the words of an apply-path template, `<...>` words are wildcards
pub(crate) fn read_template(template: &str, line: u32) -> Result<Path, Error> {
    let Some(words) = split_words(template) else {
        return Err(Error::MalformedWildcard {
            text: template.to_string(),
            line,
        });
    };

    words
        .iter()
        .map(|word| {
            if word.text.starts_with('<') || word.text.ends_with('>') {
                Segment::wildcard(word.text.clone(), line)
            } else {
                Ok(Segment::literal(word.text.clone(), line))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Path::new)
}

struct Word {
    text: String,
    quoted: bool,
}

fn to_path(words: &[Word], line: u32) -> Path {
    let group_definition = words.first().is_some_and(|w| unquote(&w.text) == GROUPS);

    words
        .iter()
        .map(|word| {
            let key = unquote(&word.text);
            // quoted free text like "<authorized use only>" is a value, wildcards are one word
            let looks_like_wildcard = key.len() >= 2
                && key.starts_with('<')
                && key.ends_with('>')
                && !key.contains(char::is_whitespace);
            if looks_like_wildcard && (group_definition || !word.quoted) {
                if let Ok(segment) = Segment::wildcard(word.text.clone(), line) {
                    return segment;
                }
            }
            Segment::literal(word.text.clone(), line)
        })
        .collect()
}

/// Split on whitespace, a double quoted string (with `\"` escapes) is a single word
///
/// Returns `None` on an unterminated quote.
fn split_words(text: &str) -> Option<Vec<Word>> {
    let mut words = vec![];
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        let mut quoted = false;
        let mut in_quotes = false;
        while let Some(&c) = chars.peek() {
            if !in_quotes && c.is_whitespace() {
                break;
            }
            chars.next();
            word.push(c);
            match c {
                '"' => {
                    quoted = true;
                    in_quotes = !in_quotes;
                }
                '\\' if in_quotes => word.push(chars.next()?),
                _ => {}
            }
        }

        if in_quotes {
            return None;
        }
        words.push(Word { text: word, quoted });
    }

    Some(words)
}

/// Utility macro to read a flat configuration into a [Vec] of [Line]s
///
/// ```
/// # use junoprep::flat_config;
/// let lines = flat_config!("set system host-name r1");
/// assert_eq!(lines.len(), 1);
/// ```
///
/// Multiple lines can be passed separately
/// ```
/// # use junoprep::flat_config;
/// let lines = flat_config! {
///     "set system host-name r1",
///     "deactivate system host-name",
/// };
/// assert_eq!(lines.len(), 2);
/// ```
#[macro_export]
macro_rules! flat_config {
    { $expr:expr } => {
        $crate::statement::read($expr)
    };
    { $($expr:expr),+ $(,)? } => {
        $crate::statement::read(&[$($expr),+].join("\n"))
    };
}
