//! Property tests for rule normalization and document reconciliation.

use proptest::prelude::*;
use serde_yaml::{Mapping, Value};

use skillspec::preserve::{parse_document, reconcile, wrap_generated, wrap_manual};
use skillspec::spec::rules::normalize;

#[derive(Debug, Clone)]
struct RawRule {
    id: Option<String>,
    when: String,
    priority: u32,
    is_default: bool,
}

fn raw_rule() -> impl Strategy<Value = RawRule> {
    (
        proptest::option::of("[a-z][a-z0-9_]{0,8}"),
        "[a-z][a-z0-9 =<>']{0,20}",
        0u32..100,
        any::<bool>(),
    )
        .prop_map(|(id, when, priority, is_default)| RawRule {
            id,
            when,
            priority,
            is_default,
        })
}

fn rule_value(rule: &RawRule) -> Value {
    let mut map = Mapping::new();
    if let Some(id) = &rule.id {
        map.insert(Value::from("id"), Value::from(id.clone()));
    }
    map.insert(Value::from("when"), Value::from(rule.when.clone()));
    map.insert(Value::from("priority"), Value::from(rule.priority));
    map.insert(Value::from("is_default"), Value::from(rule.is_default));
    let mut then = Mapping::new();
    then.insert(Value::from("status"), Value::from("success"));
    map.insert(Value::from("then"), Value::Mapping(then));
    Value::Mapping(map)
}

fn as_list(rules: &[RawRule]) -> Value {
    Value::Sequence(rules.iter().map(rule_value).collect())
}

fn as_canonical(rules: &[RawRule]) -> Value {
    let mut root = Mapping::new();
    root.insert(Value::from("_config"), Value::Mapping(Mapping::new()));
    root.insert(Value::from("rules"), as_list(rules));
    Value::Mapping(root)
}

fn as_keyed(rules: &[RawRule]) -> Value {
    let mut root = Mapping::new();
    for (i, rule) in rules.iter().enumerate() {
        root.insert(Value::from(format!("key_{i}")), rule_value(rule));
    }
    Value::Mapping(root)
}

proptest! {
    #[test]
    fn test_normalize_idempotent_for_list_encoding(rules in proptest::collection::vec(raw_rule(), 0..8)) {
        let first = normalize(&as_list(&rules));
        let second = normalize(&first.to_value());
        prop_assert_eq!(&first.config, &second.config);
        prop_assert_eq!(&first.rules, &second.rules);
        prop_assert!(second.errors.is_empty());
    }

    #[test]
    fn test_normalize_idempotent_for_canonical_encoding(rules in proptest::collection::vec(raw_rule(), 0..8)) {
        let first = normalize(&as_canonical(&rules));
        let second = normalize(&first.to_value());
        prop_assert_eq!(&first.config, &second.config);
        prop_assert_eq!(&first.rules, &second.rules);
    }

    #[test]
    fn test_normalize_idempotent_for_keyed_encoding(rules in proptest::collection::vec(raw_rule(), 0..8)) {
        let first = normalize(&as_keyed(&rules));
        let second = normalize(&first.to_value());
        prop_assert_eq!(&first.config, &second.config);
        prop_assert_eq!(&first.rules, &second.rules);
    }

    #[test]
    fn test_every_normalized_rule_has_an_id(rules in proptest::collection::vec(raw_rule(), 0..8)) {
        let normalized = normalize(&as_list(&rules));
        prop_assert_eq!(normalized.rules.len(), rules.len());
        prop_assert!(normalized.rules.iter().all(|r| r.id.is_some()));
    }

    #[test]
    fn test_reconcile_preserves_every_manual_block(
        manual in proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9 .]{0,40}", 0..5),
        fresh in "[a-zA-Z0-9][a-zA-Z0-9 .\n]{0,80}",
    ) {
        let mut parts = vec![wrap_generated("previous body")];
        for block in &manual {
            parts.push(String::new());
            parts.push(wrap_manual(block));
        }
        let previous = parts.join("\n");

        let result = reconcile(&previous, &fresh, false).unwrap();
        prop_assert_eq!(result.manual_blocks_preserved, manual.len());

        let merged = parse_document(&result.merged).unwrap();
        let preserved: Vec<String> = merged
            .manual_blocks()
            .iter()
            .map(|b| b.content.trim().to_string())
            .collect();
        let expected: Vec<String> = manual.iter().map(|m| m.trim().to_string()).collect();
        prop_assert_eq!(preserved, expected);
    }

    #[test]
    fn test_force_always_yields_fresh_content(
        manual in proptest::collection::vec("[a-zA-Z0-9 ]{1,30}", 0..4),
        fresh in "[a-zA-Z0-9 .\n]{0,60}",
    ) {
        let mut parts = vec![wrap_generated("previous body")];
        for block in &manual {
            parts.push(wrap_manual(block));
        }
        let previous = parts.join("\n");

        let result = reconcile(&previous, &fresh, true).unwrap();
        prop_assert_eq!(result.merged, fresh);
        prop_assert_eq!(result.manual_blocks_preserved, 0);
    }

    #[test]
    fn test_reconcile_twice_is_stable(
        manual in proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9 ]{0,30}", 0..4),
        fresh in "[a-zA-Z0-9][a-zA-Z0-9 .\n]{0,60}",
    ) {
        let mut parts = vec![wrap_generated("previous body")];
        for block in &manual {
            parts.push(String::new());
            parts.push(wrap_manual(block));
        }
        let previous = parts.join("\n");

        let once = reconcile(&previous, &fresh, false).unwrap();
        let twice = reconcile(&once.merged, &fresh, false).unwrap();
        prop_assert_eq!(once.merged, twice.merged);
    }
}
