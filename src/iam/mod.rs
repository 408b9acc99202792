//! Identity and Access Management (IAM) statement matching
//!
//! Provides:
//! - Allow/Deny statements over action and resource patterns
//! - Brace expansion (`{a,b}`) and `*` wildcard patterns
//! - `${path}` placeholders filled from the request context
//! - Named condition resolvers, with built-in String, Numeric, Date and Bool operators
//! - LRU caching of compiled matchers

mod brace;
mod cache;
mod condition;
mod path;
mod pattern;
mod statement;
mod template;
mod value;

pub use brace::{expand, MAX_ALTERNATIVES, MAX_EXPANDED_BYTES};
pub use cache::MatcherCache;
pub use condition::{ConditionOperator, ConditionResolver, ConditionResolvers};
pub use path::resolve;
pub use pattern::{compile_alternative, CompiledAlternative, Matcher, MAX_PATTERN_LENGTH};
pub use statement::{ConditionMap, Effect, OneOrMany, Statement, StatementConfig};
pub use template::{interpolate, UNDEFINED};
pub use value::Value;
