//! `apply-path` expansion
//!
//! `set policy-options prefix-list pl apply-path "interfaces <*> unit <*> family inet address <*>"`
//! stands for one `set policy-options prefix-list pl <prefix>` statement per address found in
//! the master tree at the template's path. The generated statements follow the directive,
//! which is kept.
use super::tree::{Node, Tree};
use crate::issue::{Error, Issue, Issues};
use crate::path::Segment;
use crate::statement::{read_template, Directive, Line, Statement};
use std::net::IpAddr;

/// Insert the statements generated by every `apply-path` directive of `lines` right after it
#[tracing::instrument(level = "trace", skip_all)]
pub fn expand(master: &mut Tree, lines: Vec<Line>, issues: &mut Issues) -> Result<Vec<Line>, Error> {
    let mut expanded = Vec::with_capacity(lines.len());
    for line in lines {
        let generated = match &line {
            Line::Set(statement) => match statement.directive() {
                Some(Directive::ApplyPath { template }) => {
                    expand_directive(master, statement, &template, issues)?
                }
                _ => vec![],
            },
            _ => vec![],
        };
        expanded.push(line);
        expanded.extend(generated);
    }
    Ok(expanded)
}

fn expand_directive(
    master: &mut Tree,
    directive: &Statement,
    template: &str,
    issues: &mut Issues,
) -> Result<Vec<Line>, Error> {
    let malformed = || Issue::MalformedApplyPath {
        template: template.to_string(),
        line: directive.line(),
    };
    let template_path = match read_template(template, directive.line()) {
        Ok(path) if !path.is_empty() => path,
        Ok(_) => {
            issues.log(malformed());
            return Ok(vec![]);
        }
        Err(error) => {
            tracing::debug!(%error, "unreadable apply-path template");
            issues.log(malformed());
            return Ok(vec![]);
        }
    };
    let Some(base) = directive.directive_path() else {
        return Ok(vec![]);
    };

    let mut candidates = vec![];
    find_prefixes(master.root(), template_path.segments(), &mut candidates);

    let mut generated = vec![];
    for (prefix, line) in candidates {
        let mut path = base.clone();
        path.push(Segment::literal(prefix, line));
        if master.get(&path).and_then(Node::statement).is_some() {
            tracing::trace!(%path, "already present");
            continue;
        }

        let statement = Statement::synthesize(&path, line)?;
        tracing::trace!(%path, line, "generated");
        master.insert_path(&path, Some(statement.clone()));
        generated.push(Line::Set(statement));
    }
    Ok(generated)
}

/// Depth first search for address literals at the position `template` describes
fn find_prefixes(node: &Node, template: &[Segment], found: &mut Vec<(String, u32)>) {
    let Some((expected, rest)) = template.split_first() else {
        return;
    };

    for child in node.children().values() {
        let Some(segment) = child.segment() else {
            continue;
        };
        if !segment.is_matched_by(expected) {
            continue;
        }

        if !rest.is_empty() {
            find_prefixes(child, rest, found);
        } else if segment.is_wildcard() {
            continue;
        } else if let Some(prefix) = to_prefix(segment.key()) {
            found.push((prefix, segment.line()));
        }
    }
}

/// `10.0.0.0/24` as is, `10.0.0.1` as `10.0.0.1/32`, anything else is not a prefix
fn to_prefix(text: &str) -> Option<String> {
    let (address, length) = match text.split_once('/') {
        Some((address, length)) => (address, Some(length)),
        None => (text, None),
    };
    let max_length = match address.parse::<IpAddr>().ok()? {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    match length {
        Some(length) => {
            let length: u8 = length.parse().ok()?;
            (length <= max_length).then(|| text.to_string())
        }
        None => Some(format!("{text}/{max_length}")),
    }
}
