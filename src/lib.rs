//! # policy-match - IAM-style statement matching
//!
//! Decides whether a single allow/deny statement matches an
//! `(action, resource)` request. Patterns support brace expansion, `*`
//! wildcards that stay within one `/` segment, and `${path}` placeholders
//! filled from a request context. Statements may carry conditions that are
//! checked by named resolvers supplied at evaluation time.
//!
//! Aggregating statements into policies (deny precedence, principals) is left
//! to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_match::{ConditionResolvers, Statement, Value};
//!
//! # fn main() -> policy_match::Result<()> {
//! let statement = Statement::from_json(
//!     r#"{
//!         "effect": "allow",
//!         "action": ["docs:{read,list}"],
//!         "resource": "tenants/${tenant}/docs/*",
//!         "condition": {"StringEquals": {"user.role": ["editor", "admin"]}}
//!     }"#,
//! )?;
//!
//! let context = Value::object([
//!     ("tenant", Value::from("acme")),
//!     ("user", Value::object([("role", "editor")])),
//! ]);
//! let resolvers = ConditionResolvers::with_builtins();
//!
//! assert!(statement.matches("docs:read", "tenants/acme/docs/plan", Some(&context), Some(&resolvers))?);
//! assert!(!statement.matches("docs:read", "tenants/other/docs/plan", Some(&context), Some(&resolvers))?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod iam;

pub use crate::error::{PolicyError, Result};
pub use crate::iam::{
    ConditionOperator, ConditionResolver, ConditionResolvers, Effect, Matcher, MatcherCache,
    Statement, StatementConfig, Value,
};
