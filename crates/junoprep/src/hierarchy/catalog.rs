//! hierarchy positions whose children form an ordered list
//!
//! Group inheritance appends to these instead of treating them as a bag of named values:
//! firewall terms or import policies are evaluated in order.
use crate::path::Path;
use once_cell::sync::Lazy;

/// Shared by every preprocessing run, never modified
pub static LIST_POSITIONS: Lazy<ListPositions> = Lazy::new(ListPositions::junos);

/// `*` matches any single word
const JUNOS_LIST_POSITIONS: &[&str] = &[
    "firewall filter * term",
    "firewall family * filter * term",
    "policy-options policy-statement * term",
    "protocols bgp import",
    "protocols bgp export",
    "protocols bgp group * import",
    "protocols bgp group * export",
    "protocols bgp group * neighbor * import",
    "protocols bgp group * neighbor * export",
    "routing-instances * protocols bgp import",
    "routing-instances * protocols bgp export",
    "routing-instances * protocols bgp group * import",
    "routing-instances * protocols bgp group * export",
    "routing-instances * protocols bgp group * neighbor * import",
    "routing-instances * protocols bgp group * neighbor * export",
    "routing-options forwarding-table export",
    "security policies from-zone * to-zone * policy",
    "security policies global policy",
];

#[derive(Debug)]
pub struct ListPositions {
    /// `None` is a wildcard
    patterns: Vec<Vec<Option<&'static str>>>,
}

impl ListPositions {
    pub fn new(patterns: &[&'static str]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|pattern| {
                    pattern
                        .split_whitespace()
                        .map(|word| (word != "*").then_some(word))
                        .collect()
                })
                .collect(),
        }
    }

    fn junos() -> Self {
        Self::new(JUNOS_LIST_POSITIONS)
    }

    pub fn is_list(&self, path: &Path) -> bool {
        let keys = path.keys();
        self.patterns.iter().any(|pattern| {
            pattern.len() == keys.len()
                && pattern
                    .iter()
                    .zip(&keys)
                    .all(|(expected, key)| expected.map_or(true, |word| word == *key))
        })
    }
}
