//! Brace expansion
//!
//! `a{b,c}d` expands to `abd` and `acd`. Groups are not balanced: the body of
//! a group runs from the first `{` to the first `}` after it. Backslash
//! escaped characters never act as delimiters and keep their backslash in the
//! output; wildcard compilation resolves the escapes later.
//!
//! Groups multiply, so expansion is budgeted: the size of the result is
//! computed before each group is applied and an over-budget expansion fails
//! with [`PolicyError::ExpansionTooLarge`] without allocating it.

use crate::error::{PolicyError, Result};
use std::borrow::Cow;

/// Most alternatives one pattern may expand into
pub const MAX_ALTERNATIVES: usize = 4096;

/// Most bytes all alternatives of one pattern may add up to
pub const MAX_EXPANDED_BYTES: usize = 1024 * 1024;

/// Expand every brace group in `pattern` into the cross product of its parts
///
/// A pattern that starts with `{}` keeps that pair as literal text. Empty
/// results are dropped from the top-level output only.
pub fn expand(pattern: &str) -> Result<Vec<String>> {
    let pattern: Cow<'_, str> = match pattern.strip_prefix("{}") {
        Some(rest) => Cow::Owned(format!("\\{{\\}}{}", rest)),
        None => Cow::Borrowed(pattern),
    };

    let mut expanded = vec![String::new()];
    let mut bytes = 0usize;
    let mut grouped = false;
    let mut rest: &str = &pattern;

    while let Some((open, close)) = next_group(rest) {
        let pre = &rest[..open];
        let parts = split_unescaped(&rest[open + 1..close], b',');

        let count = expanded.len().saturating_mul(parts.len());
        let part_bytes: usize = parts.iter().map(|part| part.len() + pre.len()).sum();
        let total = bytes
            .saturating_mul(parts.len())
            .saturating_add(expanded.len().saturating_mul(part_bytes));
        check_budget(count, total)?;

        let mut next = Vec::with_capacity(count);
        for head in &expanded {
            for part in &parts {
                next.push(format!("{}{}{}", head, pre, part));
            }
        }

        expanded = next;
        bytes = total;
        grouped = true;
        rest = &rest[close + 1..];
    }

    if !grouped {
        return Ok(vec![pattern.into_owned()]);
    }

    let total = bytes.saturating_add(expanded.len().saturating_mul(rest.len()));
    check_budget(expanded.len(), total)?;

    Ok(expanded
        .into_iter()
        .map(|head| head + rest)
        .filter(|alternative| !alternative.is_empty())
        .collect())
}

fn check_budget(alternatives: usize, bytes: usize) -> Result<()> {
    if alternatives > MAX_ALTERNATIVES || bytes > MAX_EXPANDED_BYTES {
        return Err(PolicyError::ExpansionTooLarge { alternatives, bytes });
    }
    Ok(())
}

/// Offsets of the first unescaped `{` and the first unescaped `}` after it
fn next_group(text: &str) -> Option<(usize, usize)> {
    let open = find_unescaped(text, 0, b'{')?;
    let close = find_unescaped(text, open + 1, b'}')?;
    Some((open, close))
}

/// Byte offset of the first unescaped `target` at or after `from`
fn find_unescaped(text: &str, from: usize, target: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == target => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn split_unescaped(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(at) = find_unescaped(text, start, separator) {
        parts.push(&text[start..at]);
        start = at + 1;
    }
    parts.push(&text[start..]);
    parts
}
