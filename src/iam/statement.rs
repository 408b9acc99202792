//! IAM statement structure and evaluation
//!
//! A statement allows or denies a set of actions on a set of resources,
//! optionally gated by conditions. Action and resource patterns may contain
//! brace groups, `*` wildcards and `${path}` placeholders filled from the
//! request context.

use super::{path, template, ConditionResolvers, Matcher, MatcherCache, Value};
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Condition blocks: resolver name -> context path -> expected value
pub type ConditionMap = BTreeMap<String, BTreeMap<String, Value>>;

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Allow the action
    #[default]
    #[serde(alias = "Allow")]
    Allow,
    /// Deny the action
    #[serde(alias = "Deny")]
    Deny,
}

/// A single pattern or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(pattern) => vec![pattern],
            OneOrMany::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(pattern: &str) -> Self {
        OneOrMany::One(pattern.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(pattern: String) -> Self {
        OneOrMany::One(pattern)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(patterns: Vec<String>) -> Self {
        OneOrMany::Many(patterns)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(patterns: Vec<&str>) -> Self {
        OneOrMany::Many(patterns.into_iter().map(String::from).collect())
    }
}

/// Declarative form of a statement, as found in policy documents
///
/// Field names are lowercase; the IAM-style `Effect`, `Action`, `Resource`
/// and `Condition` spellings are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementConfig {
    #[serde(default, alias = "Effect", skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,

    #[serde(alias = "Action")]
    pub action: OneOrMany,

    #[serde(alias = "Resource")]
    pub resource: OneOrMany,

    #[serde(default, alias = "Condition", skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionMap>,
}

impl StatementConfig {
    pub fn new(action: impl Into<OneOrMany>, resource: impl Into<OneOrMany>) -> Self {
        StatementConfig {
            effect: None,
            action: action.into(),
            resource: resource.into(),
            condition: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Add one expectation under the named resolver
    pub fn with_condition(
        mut self,
        resolver: impl Into<String>,
        path: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        self.condition
            .get_or_insert_with(BTreeMap::new)
            .entry(resolver.into())
            .or_default()
            .insert(path.into(), expected.into());
        self
    }
}

/// A single, immutable policy statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StatementConfig", into = "StatementConfig")]
pub struct Statement {
    effect: Effect,
    action: Vec<String>,
    resource: Vec<String>,
    condition: Option<ConditionMap>,
}

impl Statement {
    /// Build a statement from its config
    ///
    /// A single action or resource becomes a one-element list and the effect
    /// defaults to `Allow`. Empty action or resource lists are rejected.
    pub fn new(config: StatementConfig) -> Result<Self> {
        let action = config.action.into_vec();
        if action.is_empty() {
            return Err(PolicyError::InvalidStatement(
                "statement has no actions".to_string(),
            ));
        }

        let resource = config.resource.into_vec();
        if resource.is_empty() {
            return Err(PolicyError::InvalidStatement(
                "statement has no resources".to_string(),
            ));
        }

        Ok(Statement {
            effect: config.effect.unwrap_or_default(),
            action,
            resource,
            condition: config.condition,
        })
    }

    /// Parse a statement from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StatementConfig = serde_json::from_str(json)?;
        Self::new(config)
    }

    /// Parse a statement from TOML
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: StatementConfig = toml::from_str(text)?;
        Self::new(config)
    }

    /// Serialize statement to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn actions(&self) -> &[String] {
        &self.action
    }

    pub fn resources(&self) -> &[String] {
        &self.resource
    }

    pub fn condition(&self) -> Option<&ConditionMap> {
        self.condition.as_ref()
    }

    /// Check that every resolver named in the condition map is registered
    ///
    /// Optional; [`Statement::matches`] performs the same lookup lazily.
    pub fn check_resolvers(&self, resolvers: &ConditionResolvers) -> Result<()> {
        if let Some(condition) = &self.condition {
            if let Some(name) = condition.keys().find(|name| !resolvers.contains(name)) {
                return Err(PolicyError::MissingResolver(name.clone()));
            }
        }
        Ok(())
    }

    /// Decide whether this statement matches a request
    ///
    /// True when some action pattern matches `action`, some resource pattern
    /// matches `resource`, and every condition holds. Patterns are
    /// interpolated against `context` first. Conditions are only checked when
    /// `context`, `resolvers` and a condition map are all present.
    ///
    /// # Errors
    ///
    /// [`PolicyError::OversizedPattern`] if a pattern alternative is too long,
    /// [`PolicyError::ExpansionTooLarge`] if a pattern expands past the brace
    /// budget, [`PolicyError::MissingResolver`] if a condition names a resolver that is
    /// not in `resolvers`.
    ///
    /// # Examples
    ///
    /// ```
    /// use policy_match::iam::{Statement, StatementConfig};
    ///
    /// let statement = Statement::new(StatementConfig::new("read", "docs/*")).unwrap();
    /// assert!(statement.matches("read", "docs/readme", None, None).unwrap());
    /// assert!(!statement.matches("write", "docs/readme", None, None).unwrap());
    /// ```
    pub fn matches(
        &self,
        action: &str,
        resource: &str,
        context: Option<&Value>,
        resolvers: Option<&ConditionResolvers>,
    ) -> Result<bool> {
        self.evaluate(action, resource, context, resolvers, |pattern, candidate| {
            Matcher::matches(pattern, candidate)
        })
    }

    /// Same as [`Statement::matches`], reusing compiled matchers from `cache`
    pub fn matches_cached(
        &self,
        action: &str,
        resource: &str,
        context: Option<&Value>,
        resolvers: Option<&ConditionResolvers>,
        cache: &MatcherCache,
    ) -> Result<bool> {
        self.evaluate(action, resource, context, resolvers, |pattern, candidate| {
            Ok(cache.get_or_compile(pattern)?.is_match(candidate))
        })
    }

    fn evaluate<F>(
        &self,
        action: &str,
        resource: &str,
        context: Option<&Value>,
        resolvers: Option<&ConditionResolvers>,
        mut is_match: F,
    ) -> Result<bool>
    where
        F: FnMut(&str, &str) -> Result<bool>,
    {
        if !any_pattern_matches(&self.action, action, context, &mut is_match)? {
            trace!(action, "no action pattern matched");
            return Ok(false);
        }

        if !any_pattern_matches(&self.resource, resource, context, &mut is_match)? {
            trace!(resource, "no resource pattern matched");
            return Ok(false);
        }

        self.conditions_hold(context, resolvers)
    }

    fn conditions_hold(
        &self,
        context: Option<&Value>,
        resolvers: Option<&ConditionResolvers>,
    ) -> Result<bool> {
        let (Some(condition), Some(context), Some(resolvers)) =
            (&self.condition, context, resolvers)
        else {
            return Ok(true);
        };

        for (name, expectations) in condition {
            if expectations.is_empty() {
                continue;
            }

            let Some(resolver) = resolvers.get(name) else {
                warn!(resolver = %name, "condition references unregistered resolver");
                return Err(PolicyError::MissingResolver(name.clone()));
            };

            for (key, expected) in expectations {
                let observed = path::resolve(context, key);
                if !resolver.resolve(observed.as_deref(), expected) {
                    trace!(resolver = %name, path = %key, "condition failed");
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

fn any_pattern_matches<F>(
    patterns: &[String],
    candidate: &str,
    context: Option<&Value>,
    is_match: &mut F,
) -> Result<bool>
where
    F: FnMut(&str, &str) -> Result<bool>,
{
    for pattern in patterns {
        let pattern = template::interpolate(pattern, context);
        if is_match(&pattern, candidate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl TryFrom<StatementConfig> for Statement {
    type Error = PolicyError;

    fn try_from(config: StatementConfig) -> Result<Self> {
        Statement::new(config)
    }
}

impl From<Statement> for StatementConfig {
    fn from(statement: Statement) -> Self {
        StatementConfig {
            effect: Some(statement.effect),
            action: OneOrMany::Many(statement.action),
            resource: OneOrMany::Many(statement.resource),
            condition: statement.condition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement(action: impl Into<OneOrMany>, resource: impl Into<OneOrMany>) -> Statement {
        Statement::new(StatementConfig::new(action, resource)).unwrap()
    }

    fn equals() -> ConditionResolvers {
        let mut resolvers = ConditionResolvers::new();
        resolvers.insert_fn("equals", |observed, expected| observed == Some(expected));
        resolvers
    }

    #[test]
    fn test_normalization_and_default_effect() {
        let stmt = statement("read", "docs/*");
        assert_eq!(stmt.effect(), Effect::Allow);
        assert!(stmt.is_allow());
        assert_eq!(stmt.actions(), ["read"]);
        assert_eq!(stmt.resources(), ["docs/*"]);
        assert!(stmt.condition().is_none());
    }

    #[test]
    fn test_empty_lists_rejected() {
        let err = Statement::new(StatementConfig::new(Vec::<String>::new(), "x")).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidStatement(_)));
        let err = Statement::new(StatementConfig::new("read", Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidStatement(_)));
    }

    #[test]
    fn test_simple_match() {
        let stmt = statement("read", "docs/*");
        assert!(stmt.matches("read", "docs/readme", None, None).unwrap());
        assert!(!stmt.matches("write", "docs/readme", None, None).unwrap());
        assert!(!stmt.matches("read", "docs/", None, None).unwrap());
    }

    #[test]
    fn test_any_of_several_patterns() {
        let stmt = statement(vec!["read", "list"], vec!["public/*", "shared/{a,b}"]);
        assert!(stmt.matches("list", "public/x", None, None).unwrap());
        assert!(stmt.matches("read", "shared/b", None, None).unwrap());
        assert!(!stmt.matches("read", "shared/c", None, None).unwrap());
        assert!(!stmt.matches("delete", "public/x", None, None).unwrap());
    }

    #[test]
    fn test_interpolated_resource() {
        let stmt = statement("read", "home/${user.id}/*");
        let ctx = Value::from(json!({"user": {"id": "42"}}));
        assert!(stmt.matches("read", "home/42/notes", Some(&ctx), None).unwrap());
        assert!(!stmt.matches("read", "home/43/notes", Some(&ctx), None).unwrap());

        // without context the placeholder is left alone, so `{user.id}` is
        // an ordinary single-part brace group
        assert!(stmt
            .matches("read", "home/$user.id/notes", None, None)
            .unwrap());
    }

    #[test]
    fn test_interpolated_array_expands() {
        let stmt = statement("read", "teams/${user.teams}/*");
        let ctx = Value::from(json!({"user": {"teams": ["red", "blue"]}}));
        assert!(stmt.matches("read", "teams/red/plan", Some(&ctx), None).unwrap());
        assert!(stmt.matches("read", "teams/blue/plan", Some(&ctx), None).unwrap());
        assert!(!stmt.matches("read", "teams/green/plan", Some(&ctx), None).unwrap());
    }

    #[test]
    fn test_condition_gating() {
        let stmt = Statement::new(
            StatementConfig::new("*", "*").with_condition("equals", "user.role", "admin"),
        )
        .unwrap();
        let resolvers = equals();

        let admin = Value::from(json!({"user": {"role": "admin"}}));
        let guest = Value::from(json!({"user": {"role": "guest"}}));

        assert!(stmt.matches("x", "y", Some(&admin), Some(&resolvers)).unwrap());
        assert!(!stmt.matches("x", "y", Some(&guest), Some(&resolvers)).unwrap());
        assert!(stmt.matches("x", "y", Some(&guest), None).unwrap());
        assert!(stmt.matches("x", "y", None, Some(&resolvers)).unwrap());
    }

    #[test]
    fn test_missing_resolver_fails_fast() {
        let stmt = Statement::new(
            StatementConfig::new("*", "*").with_condition("unknown", "user.role", "admin"),
        )
        .unwrap();
        let ctx = Value::from(json!({"user": {"role": "admin"}}));
        let resolvers = equals();

        let err = stmt
            .matches("x", "y", Some(&ctx), Some(&resolvers))
            .unwrap_err();
        assert!(matches!(err, PolicyError::MissingResolver(ref name) if name == "unknown"));
        assert!(stmt.check_resolvers(&resolvers).is_err());
        assert!(stmt.check_resolvers(&ConditionResolvers::new()).is_err());

        // no pattern match means the resolver is never looked up
        assert!(!stmt.matches("", "y", Some(&ctx), Some(&resolvers)).unwrap());
    }

    #[test]
    fn test_oversized_pattern_propagates() {
        let stmt = statement("read", "q".repeat(70_000));
        assert!(matches!(
            stmt.matches("read", "anything", None, None),
            Err(PolicyError::OversizedPattern { .. })
        ));
    }

    #[test]
    fn test_context_array_expansion_is_bounded() {
        let stmt = statement("read", "${g}/${g}/${g}/${g}/${g}/${g}");
        let letters: Vec<String> = ('a'..='l').map(String::from).collect();
        let ctx = Value::from(json!({ "g": letters }));

        assert!(matches!(
            stmt.matches("read", "a/b/c/d/e/f", Some(&ctx), None),
            Err(PolicyError::ExpansionTooLarge { .. })
        ));

        let small = Value::from(json!({"g": ["a", "b"]}));
        assert!(stmt.matches("read", "a/b/a/b/a/b", Some(&small), None).unwrap());
    }

    #[test]
    fn test_empty_condition_block_skips_lookup() {
        let config: StatementConfig = serde_json::from_value(json!({
            "action": "*",
            "resource": "*",
            "condition": {"Unregistered": {}}
        }))
        .unwrap();
        let stmt = Statement::new(config).unwrap();
        let ctx = Value::from(json!({"user": {"role": "admin"}}));

        assert!(stmt
            .matches("x", "y", Some(&ctx), Some(&ConditionResolvers::new()))
            .unwrap());
    }

    #[test]
    fn test_action_mismatch_short_circuits_resource() {
        // the resource pattern is oversized but never compiled
        let stmt = statement("read", "q".repeat(70_000));
        assert!(!stmt.matches("write", "anything", None, None).unwrap());
    }

    #[test]
    fn test_matches_cached_agrees() {
        let stmt = statement(vec!["s3:Get*", "s3:List*"], "bucket/${user.id}/*");
        let cache = MatcherCache::new(16);
        let ctx = Value::from(json!({"user": {"id": "7"}}));

        for (action, resource) in [
            ("s3:GetObject", "bucket/7/a"),
            ("s3:PutObject", "bucket/7/a"),
            ("s3:ListBucket", "bucket/8/a"),
        ] {
            assert_eq!(
                stmt.matches(action, resource, Some(&ctx), None).unwrap(),
                stmt.matches_cached(action, resource, Some(&ctx), None, &cache)
                    .unwrap()
            );
        }
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_json_config() {
        let stmt = Statement::from_json(
            r#"{
                "effect": "deny",
                "action": ["read", "write"],
                "resource": "secrets/*",
                "condition": {"StringEquals": {"user.role": "intern"}}
            }"#,
        )
        .unwrap();
        assert_eq!(stmt.effect(), Effect::Deny);
        assert_eq!(stmt.actions().len(), 2);
        assert_eq!(stmt.resources(), ["secrets/*"]);
        assert!(stmt.condition().unwrap().contains_key("StringEquals"));
    }

    #[test]
    fn test_iam_style_field_names() {
        let stmt: Statement = serde_json::from_value(json!({
            "Effect": "Allow",
            "Action": "read",
            "Resource": ["a", "b"]
        }))
        .unwrap();
        assert!(stmt.is_allow());
        assert_eq!(stmt.resources(), ["a", "b"]);
    }

    #[test]
    fn test_toml_config() {
        let stmt = Statement::from_toml(
            r#"
            action = "read"
            resource = ["docs/*", "wiki/*"]

            [condition.NumericLessThan]
            "request.size" = 1024
            "#,
        )
        .unwrap();
        assert_eq!(stmt.effect(), Effect::Allow);
        let cond = stmt.condition().unwrap();
        assert_eq!(
            cond["NumericLessThan"]["request.size"],
            Value::Number(1024.0)
        );
    }

    #[test]
    fn test_invalid_json_config() {
        assert!(matches!(
            Statement::from_json(r#"{"action": [], "resource": "x"}"#),
            Err(PolicyError::InvalidStatement(_))
        ));
        assert!(matches!(
            Statement::from_json(r#"{"resource": "x"}"#),
            Err(PolicyError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let stmt = Statement::new(
            StatementConfig::new("read", "docs/*")
                .with_effect(Effect::Deny)
                .with_condition("Bool", "mfa", true),
        )
        .unwrap();
        let json = stmt.to_json().unwrap();
        assert_eq!(Statement::from_json(&json).unwrap(), stmt);
    }
}
