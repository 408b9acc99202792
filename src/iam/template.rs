//! `${path}` placeholder interpolation
//!
//! Placeholders are substituted with values looked up in the request context.
//! Substitution is purely textual and happens before pattern compilation, so
//! an injected array (`{a,b}`) still takes part in brace expansion.

use super::{path, Value};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Text substituted for a placeholder whose path does not resolve
pub const UNDEFINED: &str = "undefined";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{(.*?)\}").expect("placeholder regex is valid"))
}

/// Substitute every `${path}` in `pattern` from `context`
///
/// Without a context the pattern is returned untouched.
///
/// # Examples
/// ```
/// use policy_match::iam::{interpolate, Value};
///
/// let ctx = Value::object([("user", Value::object([("id", "42")]))]);
/// assert_eq!(interpolate("user:${user.id}", Some(&ctx)), "user:42");
/// assert_eq!(interpolate("user:${user.id}", None), "user:${user.id}");
/// ```
pub fn interpolate<'p>(pattern: &'p str, context: Option<&Value>) -> Cow<'p, str> {
    let Some(context) = context else {
        return Cow::Borrowed(pattern);
    };

    let substituted = placeholder().replace_all(pattern, |caps: &Captures<'_>| {
        match path::resolve(context, &caps[1]) {
            Some(value) => value.render(),
            None => UNDEFINED.to_string(),
        }
    });

    Cow::Owned(collapse_whitespace(&substituted))
}

/// Trim the ends and reduce each whitespace run to its last character
fn collapse_whitespace(text: &str) -> String {
    let trimmed = text.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()) {
            continue;
        }
        out.push(c);
    }

    out
}
