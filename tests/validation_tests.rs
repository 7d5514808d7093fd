//! End-to-end validation pipeline tests over fixture specs.

use std::path::PathBuf;

use serde_yaml::Value;

use skillspec::validate::{Severity, ValidationEngine};

fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn load(relative: &str) -> Value {
    let content = std::fs::read_to_string(fixture(relative)).expect("read fixture");
    serde_yaml::from_str(&content).expect("parse fixture")
}

#[test]
fn valid_fixture_passes_all_layers() {
    let spec = load("tests/fixtures/specs/valid_spec.yaml");
    let result = ValidationEngine::new().validate(&spec, false);

    assert!(result.valid, "report: {}", result.to_json_pretty().unwrap());
    assert_eq!(result.total_errors, 0);
    assert_eq!(result.total_warnings, 0);
    assert_eq!(result.coverage.metrics.structural_score, 100);
    assert_eq!(result.coverage.metrics.behavioral_score, 100);
}

#[test]
fn invalid_fixture_collects_findings_from_every_layer() {
    let spec = load("tests/fixtures/specs/invalid_spec.yaml");
    let result = ValidationEngine::new().validate(&spec, false);

    assert!(!result.valid);

    // Schema: empty inputs list, malformed identifiers, malformed rule entry.
    assert!(result.schema.errors.iter().any(|e| e.path == "inputs"));
    assert!(result.schema.errors.iter().any(|e| e.path == "skill.name"));
    assert!(
        result
            .schema
            .errors
            .iter()
            .any(|e| e.path == "decision_rules[1]")
    );
    // Unknown version stays a warning.
    assert!(result.schema.warnings.iter().any(|e| e.path == "spec_version"));

    // Quality: vague step prose plus the empty rule condition.
    let categories: Vec<&str> = result
        .quality
        .violations
        .iter()
        .map(|v| v.category.as_str())
        .collect();
    assert!(categories.contains(&"VAGUE_ACTION"));
    assert!(categories.contains(&"VAGUE_CONDITION"));
    assert!(categories.contains(&"EMPTY_CONDITION"));
    assert!(categories.contains(&"MISSING_SCHEMA"));

    // Consistency: dangling references and a forward dependency.
    let issue_types: Vec<&str> = result
        .consistency
        .issues
        .iter()
        .map(|i| i.issue_type.as_str())
        .collect();
    assert!(issue_types.contains(&"unknown_rule_reference"));
    assert!(issue_types.contains(&"unknown_failure_reference"));
    assert!(issue_types.contains(&"unavailable_dependency"));
}

#[test]
fn empty_inputs_error_carries_suggestion() {
    let spec = load("tests/fixtures/specs/invalid_spec.yaml");
    let result = ValidationEngine::new().validate(&spec, false);

    let error = result
        .schema
        .errors
        .iter()
        .find(|e| e.path == "inputs")
        .expect("inputs error");
    assert!(error.message.contains("empty"));
    assert!(
        error
            .suggestion
            .as_deref()
            .unwrap()
            .contains("at least one")
    );
}

#[test]
fn policy_files_are_applied_additively() {
    let spec = load("tests/fixtures/specs/valid_spec.yaml");
    let engine = ValidationEngine::new()
        .with_policy_file(fixture("tests/fixtures/policies/enterprise.yaml"));
    let result = engine.validate(&spec, false);

    let compliance = result.compliance.expect("compliance ran");
    assert_eq!(compliance.policies_applied, 1);
    assert_eq!(compliance.rules_passed, 3);
    assert_eq!(compliance.rules_failed, 0);
}

#[test]
fn policy_rules_evaluate_against_canonical_encoding() {
    // The invalid fixture's rules arrive as a legacy list with one
    // malformed entry; predicates still see the canonical {_config, rules}
    // shape with the surviving rule.
    let spec = load("tests/fixtures/specs/invalid_spec.yaml");
    let engine = ValidationEngine::new()
        .with_policy_file(fixture("tests/fixtures/policies/enterprise.yaml"));
    let result = engine.validate(&spec, false);

    let compliance = result.compliance.as_ref().expect("compliance ran");
    assert_eq!(compliance.rules_passed, 3, "{compliance:?}");
    assert_eq!(compliance.rules_failed, 0);
}

#[test]
fn pattern_files_merge_by_union() {
    let spec: Value = serde_yaml::from_str(
        r#"
skill:
  purpose: "尽量处理输入, then try to continue"
output_contract:
  format: json
  schema:
    type: object
"#,
    )
    .unwrap();

    let engine = ValidationEngine::new()
        .with_patterns_dir(fixture("tests/fixtures/patterns"))
        .with_languages(["en", "zh"]);
    let result = engine.validate(&spec, false);

    let matched: Vec<&str> = result
        .quality
        .violations
        .iter()
        .map(|v| v.matched_text.as_str())
        .collect();
    assert!(matched.contains(&"try to"));
    assert!(matched.contains(&"尽量"));
}

#[test]
fn single_language_load_excludes_other_catalogs() {
    let spec: Value = serde_yaml::from_str(
        r#"
skill:
  purpose: "尽量处理输入 without hedging"
output_contract:
  format: json
  schema:
    type: object
"#,
    )
    .unwrap();

    let engine = ValidationEngine::new()
        .with_patterns_dir(fixture("tests/fixtures/patterns"))
        .with_languages(["en"]);
    let result = engine.validate(&spec, false);

    assert!(
        !result
            .quality
            .violations
            .iter()
            .any(|v| v.matched_text == "尽量")
    );
}

#[test]
fn reports_serialize_deterministically() {
    let spec = load("tests/fixtures/specs/invalid_spec.yaml");
    let engine = ValidationEngine::new()
        .with_policy_file(fixture("tests/fixtures/policies/enterprise.yaml"));

    let first = engine.validate(&spec, false).to_json_pretty().unwrap();
    let second = engine.validate(&spec, false).to_json_pretty().unwrap();
    assert_eq!(first, second);

    // A fresh engine over the same inputs produces the same bytes too.
    let other_engine = ValidationEngine::new()
        .with_policy_file(fixture("tests/fixtures/policies/enterprise.yaml"));
    let third = other_engine.validate(&spec, false).to_json_pretty().unwrap();
    assert_eq!(first, third);
}

#[test]
fn validate_file_short_circuits_on_missing_input() {
    let engine = ValidationEngine::new();
    let err = engine
        .validate_file(&fixture("tests/fixtures/specs/nope.yaml"), false)
        .unwrap_err();
    assert!(err.to_string().contains("I/O") || err.to_string().to_lowercase().contains("no such"));
}

#[test]
fn step_reordering_flips_dependency_check() {
    let broken: Value = serde_yaml::from_str(
        r#"
steps:
  - id: consume
    action: Use the value
    based_on: [ast]
  - id: produce
    action: Make the value
    output: ast
output_contract:
  format: json
  schema:
    type: object
"#,
    )
    .unwrap();
    let reordered: Value = serde_yaml::from_str(
        r#"
steps:
  - id: produce
    action: Make the value
    output: ast
  - id: consume
    action: Use the value
    based_on: [ast]
output_contract:
  format: json
  schema:
    type: object
"#,
    )
    .unwrap();

    let engine = ValidationEngine::new();
    let broken_result = engine.validate(&broken, false);
    let reordered_result = engine.validate(&reordered, false);

    assert!(
        broken_result
            .consistency
            .issues
            .iter()
            .any(|i| i.severity == Severity::Error && i.target == "ast")
    );
    assert!(reordered_result.consistency.valid);
}
