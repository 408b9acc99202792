//! Dotted path lookup inside a context value

use super::Value;
use std::borrow::Cow;

/// Resolve a dot separated `path` (e.g. `user.department`) against `context`
///
/// A missing key anywhere along the path resolves to `None`. An array at the
/// end of the path is rendered as a brace group string (`{a,b,c}`) so it can
/// feed straight into brace expansion.
pub fn resolve<'a>(context: &'a Value, path: &str) -> Option<Cow<'a, Value>> {
    let mut current = context;
    for key in path.split('.') {
        current = current.get(key)?;
    }

    match current {
        Value::Array(_) => Some(Cow::Owned(Value::String(format!(
            "{{{}}}",
            current.render()
        )))),
        other => Some(Cow::Borrowed(other)),
    }
}
