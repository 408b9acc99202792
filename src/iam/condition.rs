//! Condition resolvers for IAM statements
//!
//! A statement's condition map names a resolver per block, e.g.
//! `{"StringEquals": {"user.role": "admin"}}`. At evaluation time each name is
//! looked up in a [`ConditionResolvers`] table and called with the value found
//! at the context path and the expected value from the statement.
//!
//! Built-in operators:
//! - String operations (Equals, NotEquals, Like)
//! - Numeric operations (Equals, LessThan, GreaterThan and the -Equals forms)
//! - Date operations (LessThan, GreaterThan)
//! - Bool

use super::{Matcher, Value};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named predicate comparing an observed context value with an expected one
///
/// `observed` is `None` when the context path does not resolve.
pub trait ConditionResolver: Send + Sync {
    fn resolve(&self, observed: Option<&Value>, expected: &Value) -> bool;
}

impl<F> ConditionResolver for F
where
    F: Fn(Option<&Value>, &Value) -> bool + Send + Sync,
{
    fn resolve(&self, observed: Option<&Value>, expected: &Value) -> bool {
        self(observed, expected)
    }
}

/// Built-in condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// String equals (case-sensitive)
    StringEquals,
    /// String not equals
    StringNotEquals,
    /// String matches a pattern (braces and `*` wildcards)
    ///
    /// An expected pattern that fails to compile (too long, or over the brace
    /// expansion budget) matches nothing.
    StringLike,
    /// Numeric equals
    NumericEquals,
    /// Numeric less than
    NumericLessThan,
    /// Numeric less than or equals
    NumericLessThanEquals,
    /// Numeric greater than
    NumericGreaterThan,
    /// Numeric greater than or equals
    NumericGreaterThanEquals,
    /// Date less than (RFC 3339 or `YYYY-MM-DD`)
    DateLessThan,
    /// Date greater than (RFC 3339 or `YYYY-MM-DD`)
    DateGreaterThan,
    /// Boolean equals
    Bool,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 11] = [
        ConditionOperator::StringEquals,
        ConditionOperator::StringNotEquals,
        ConditionOperator::StringLike,
        ConditionOperator::NumericEquals,
        ConditionOperator::NumericLessThan,
        ConditionOperator::NumericLessThanEquals,
        ConditionOperator::NumericGreaterThan,
        ConditionOperator::NumericGreaterThanEquals,
        ConditionOperator::DateLessThan,
        ConditionOperator::DateGreaterThan,
        ConditionOperator::Bool,
    ];

    /// Name the operator is registered under
    pub fn name(&self) -> &'static str {
        match self {
            ConditionOperator::StringEquals => "StringEquals",
            ConditionOperator::StringNotEquals => "StringNotEquals",
            ConditionOperator::StringLike => "StringLike",
            ConditionOperator::NumericEquals => "NumericEquals",
            ConditionOperator::NumericLessThan => "NumericLessThan",
            ConditionOperator::NumericLessThanEquals => "NumericLessThanEquals",
            ConditionOperator::NumericGreaterThan => "NumericGreaterThan",
            ConditionOperator::NumericGreaterThanEquals => "NumericGreaterThanEquals",
            ConditionOperator::DateLessThan => "DateLessThan",
            ConditionOperator::DateGreaterThan => "DateGreaterThan",
            ConditionOperator::Bool => "Bool",
        }
    }

    /// Compare one observed value against one (non-array) expected value
    fn compare(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            ConditionOperator::StringEquals | ConditionOperator::StringNotEquals => {
                match (expected.as_str(), actual.as_str()) {
                    (Some(expected), Some(actual)) => expected == actual,
                    _ => false,
                }
            }
            ConditionOperator::StringLike => match (expected.as_str(), actual.as_str()) {
                (Some(pattern), Some(actual)) => Matcher::matches(pattern, actual).unwrap_or(false),
                _ => false,
            },
            ConditionOperator::NumericEquals => match (numeric(expected), numeric(actual)) {
                (Some(expected), Some(actual)) => (expected - actual).abs() < f64::EPSILON,
                _ => false,
            },
            ConditionOperator::NumericLessThan => match (numeric(expected), numeric(actual)) {
                (Some(expected), Some(actual)) => actual < expected,
                _ => false,
            },
            ConditionOperator::NumericLessThanEquals => {
                match (numeric(expected), numeric(actual)) {
                    (Some(expected), Some(actual)) => actual <= expected,
                    _ => false,
                }
            }
            ConditionOperator::NumericGreaterThan => match (numeric(expected), numeric(actual)) {
                (Some(expected), Some(actual)) => actual > expected,
                _ => false,
            },
            ConditionOperator::NumericGreaterThanEquals => {
                match (numeric(expected), numeric(actual)) {
                    (Some(expected), Some(actual)) => actual >= expected,
                    _ => false,
                }
            }
            ConditionOperator::DateLessThan => match (date(expected), date(actual)) {
                (Some(expected), Some(actual)) => actual < expected,
                _ => false,
            },
            ConditionOperator::DateGreaterThan => match (date(expected), date(actual)) {
                (Some(expected), Some(actual)) => actual > expected,
                _ => false,
            },
            ConditionOperator::Bool => match (expected.as_bool(), actual.as_bool()) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
        }
    }
}

impl ConditionResolver for ConditionOperator {
    /// A missing observed value fails every operator. An array of expected
    /// values passes when any element passes; for `StringNotEquals` it passes
    /// when no element is equal.
    fn resolve(&self, observed: Option<&Value>, expected: &Value) -> bool {
        let Some(actual) = observed else {
            return false;
        };

        let candidates = match expected {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };

        if *self == ConditionOperator::StringNotEquals {
            actual.as_str().is_some() && !candidates.iter().any(|e| self.compare(actual, e))
        } else {
            candidates.iter().any(|e| self.compare(actual, e))
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn date(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Name-keyed table of condition resolvers supplied at evaluation time
#[derive(Clone, Default)]
pub struct ConditionResolvers {
    resolvers: HashMap<String, Arc<dyn ConditionResolver>>,
}

impl ConditionResolvers {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding every [`ConditionOperator`] under its name
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for op in ConditionOperator::ALL {
            table.insert(op.name(), op);
        }
        table
    }

    /// Register a resolver, replacing any previous one with the same name
    pub fn insert<R>(&mut self, name: impl Into<String>, resolver: R) -> &mut Self
    where
        R: ConditionResolver + 'static,
    {
        self.resolvers.insert(name.into(), Arc::new(resolver));
        self
    }

    /// Register a closure as a resolver
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, resolver: F) -> &mut Self
    where
        F: Fn(Option<&Value>, &Value) -> bool + Send + Sync + 'static,
    {
        self.insert(name, resolver)
    }

    pub fn get(&self, name: &str) -> Option<&dyn ConditionResolver> {
        self.resolvers.get(name).map(|r| r.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for ConditionResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ConditionResolvers")
            .field("names", &names)
            .finish()
    }
}
