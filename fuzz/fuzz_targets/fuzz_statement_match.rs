#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use policy_match::{ConditionResolvers, Statement, StatementConfig, Value};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    action_pattern: &'a str,
    resource_pattern: &'a str,
    action: &'a str,
    resource: &'a str,
    key: &'a str,
    value: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(statement) = Statement::new(
        StatementConfig::new(input.action_pattern, input.resource_pattern)
            .with_condition("StringLike", input.key, input.value),
    ) else {
        return;
    };

    let context = Value::object([(input.key, input.value)]);
    let resolvers = ConditionResolvers::with_builtins();
    let _ = statement.matches(input.action, input.resource, Some(&context), Some(&resolvers));
});
