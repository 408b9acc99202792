//! End-to-end statement matching through the public API

use policy_match::iam::interpolate;
use policy_match::{
    ConditionResolvers, Effect, Matcher, PolicyError, Statement, StatementConfig, Value,
};
use serde_json::json;

fn equals() -> ConditionResolvers {
    let mut resolvers = ConditionResolvers::new();
    resolvers.insert_fn("equals", |observed, expected| observed == Some(expected));
    resolvers
}

#[test]
fn test_brace_expansion_is_cross_product() {
    let m = Matcher::new("a{b,c}d").unwrap();
    assert!(m.is_match("abd"));
    assert!(m.is_match("acd"));
    assert!(!m.is_match("aed"));
}

#[test]
fn test_wildcard_requires_non_empty_segment() {
    let m = Matcher::new("a/*").unwrap();
    assert!(!m.is_match("a/"));
    assert!(m.is_match("a/b"));
}

#[test]
fn test_leading_empty_braces_are_literal() {
    assert!(Matcher::new("{}abc").unwrap().is_match("{}abc"));
}

#[test]
fn test_interpolation() {
    let context = Value::from(json!({"user": {"id": "42"}}));
    assert_eq!(interpolate("user:${user.id}", Some(&context)), "user:42");
    assert_eq!(interpolate("user:${user.id}", None), "user:${user.id}");
}

#[test]
fn test_empty_pattern_matches_only_empty() {
    let m = Matcher::new("").unwrap();
    assert!(m.is_match(""));
    assert!(!m.is_match("x"));
}

#[test]
fn test_statement_end_to_end() {
    let statement = Statement::new(StatementConfig::new("read", "docs/*")).unwrap();
    assert!(statement.matches("read", "docs/readme", None, None).unwrap());
    assert!(!statement.matches("write", "docs/readme", None, None).unwrap());
}

#[test]
fn test_condition_gating() {
    let statement = Statement::from_json(
        r#"{"resource": "*", "action": "*", "condition": {"equals": {"user.role": "admin"}}}"#,
    )
    .unwrap();
    let resolvers = equals();
    let admin = Value::from(json!({"user": {"role": "admin"}}));
    let guest = Value::from(json!({"user": {"role": "guest"}}));

    assert!(statement.matches("x", "y", Some(&admin), Some(&resolvers)).unwrap());
    assert!(!statement.matches("x", "y", Some(&guest), Some(&resolvers)).unwrap());
    assert!(statement.matches("x", "y", Some(&guest), None).unwrap());
    assert!(statement.matches("x", "y", Some(&admin), None).unwrap());
}

#[test]
fn test_oversized_pattern_is_fatal() {
    let statement = Statement::new(StatementConfig::new("read", "r".repeat(70_000))).unwrap();
    let err = statement.matches("read", "r", None, None).unwrap_err();
    assert!(matches!(err, PolicyError::OversizedPattern { length: 70_000, .. }));
    assert!(err.to_string().contains("70000"));
}

#[test]
fn test_missing_resolver_is_named_error() {
    let statement = Statement::new(
        StatementConfig::new("*", "*")
            .with_effect(Effect::Deny)
            .with_condition("IpAddress", "request.ip", "10.0.0.0/8"),
    )
    .unwrap();
    let context = Value::from(json!({"request": {"ip": "10.1.2.3"}}));
    let resolvers = ConditionResolvers::with_builtins();

    let err = statement
        .matches("x", "y", Some(&context), Some(&resolvers))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No condition resolver registered under 'IpAddress'"
    );
}
