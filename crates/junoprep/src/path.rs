//! hierarchy paths
//!
//! A [Path] is the list of words of a flat statement, e.g. `interfaces ge-0/0/0 unit 0`.
//! Each word becomes a [Segment] which is either a literal or a wildcard (`<ge-*>`).
use crate::issue::Error;

/// Keywords that a wildcard never matches
///
/// A group containing `<*>` would otherwise inherit its own directives.
const NEVER_MATCHED_BY_WILDCARD: [&str; 3] = ["apply-groups", "apply-groups-except", "apply-path"];

#[derive(Debug, Clone)]
pub struct Segment {
    /// Original text, possibly quoted
    text: String,
    line: u32,
    kind: SegmentKind,
}

#[derive(Debug, Clone)]
pub enum SegmentKind {
    Literal,
    Wildcard(Pattern),
}

impl Segment {
    pub fn literal(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            line,
            kind: SegmentKind::Literal,
        }
    }

    /// Create a wildcard segment, `text` must look like `<...>` (quotes allowed)
    pub fn wildcard(text: impl Into<String>, line: u32) -> Result<Self, Error> {
        let text = text.into();
        let pattern = Pattern::new(unquote(&text)).ok_or_else(|| Error::MalformedWildcard {
            text: text.clone(),
            line,
        })?;

        Ok(Self {
            text,
            line,
            kind: SegmentKind::Wildcard(pattern),
        })
    }

    /// Original text as written in the configuration
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text without surrounding quotes, used as key in trees
    pub fn key(&self) -> &str {
        unquote(&self.text)
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, SegmentKind::Wildcard(_))
    }

    /// Same segment with a different line number
    pub fn with_line(&self, line: u32) -> Self {
        Self {
            line,
            ..self.clone()
        }
    }

    /// Does `candidate` (a segment stored in a tree) satisfy `self` (a segment of a query path)?
    ///
    /// | self \ candidate | literal       | wildcard                  |
    /// |------------------|---------------|---------------------------|
    /// | literal          | same text     | pattern matches self      |
    /// | wildcard         | never         | same pattern text         |
    pub fn is_matched_by(&self, candidate: &Segment) -> bool {
        match (&self.kind, &candidate.kind) {
            (SegmentKind::Literal, SegmentKind::Literal) => self.key() == candidate.key(),
            (SegmentKind::Literal, SegmentKind::Wildcard(pattern)) => pattern.matches(self.key()),
            (SegmentKind::Wildcard(_), SegmentKind::Literal) => false,
            (SegmentKind::Wildcard(own), SegmentKind::Wildcard(other)) => own.text == other.text,
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compiled junos wildcard, the text between `<` and `>`
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    regex: regex::Regex,
}

impl Pattern {
    /// Returns `None` unless `wildcard` is of the form `<...>`
    pub fn new(wildcard: &str) -> Option<Self> {
        let inner = wildcard.strip_prefix('<')?.strip_suffix('>')?;
        let regex = regex::Regex::new(&to_regex(inner)).ok()?;
        Some(Self {
            text: inner.to_string(),
            regex,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn matches(&self, candidate: &str) -> bool {
        !NEVER_MATCHED_BY_WILDCARD.contains(&candidate) && self.regex.is_match(candidate)
    }
}

/// Translate junos wildcard syntax into an anchored regex
///
/// `*` any run of characters, `?` a single character, `[...]` a class (`[!...]` negated).
fn to_regex(wildcard: &str) -> String {
    let mut regex = String::from("^");
    let mut chars = wildcard.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '[' => {
                let class: String = chars.clone().take_while(|c| *c != ']').collect();
                let closed = chars.clone().nth(class.chars().count()) == Some(']');
                if !closed || class.is_empty() {
                    regex.push_str(r"\[");
                    continue;
                }
                for _ in 0..=class.chars().count() {
                    chars.next();
                }

                regex.push('[');
                let class = match class.strip_prefix('!') {
                    Some(rest) => {
                        regex.push('^');
                        rest
                    }
                    None => class.as_str(),
                };
                for c in class.chars() {
                    if c == '-' {
                        regex.push('-');
                    } else {
                        regex.push_str(&regex::escape(&c.to_string()));
                    }
                }
                regex.push(']');
            }
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    regex
}

/// Strip one pair of surrounding double quotes
pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Ordered list of [Segment]s
#[derive(Debug, Clone, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    pub fn contains_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    /// Path made of the first `len` segments
    pub fn prefix(&self, len: usize) -> Path {
        Path::new(self.segments[..len.min(self.len())].to_vec())
    }

    /// Path made of the segments from `start` on
    pub fn suffix(&self, start: usize) -> Path {
        Path::new(self.segments[start.min(self.len())..].to_vec())
    }

    /// Unquoted words, the keys used by trees
    pub fn keys(&self) -> Vec<&str> {
        self.segments.iter().map(Segment::key).collect()
    }

    /// Literal comparison of the unquoted words against `words`
    pub fn starts_with_keys(&self, words: &[&str]) -> bool {
        self.len() >= words.len()
            && self
                .segments
                .iter()
                .zip(words)
                .all(|(segment, word)| segment.key() == *word)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(segment.text())?;
        }
        Ok(())
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
