//! Schema validation: section presence, field shapes, identifier patterns.
//!
//! The layer is tolerant: it collects every finding it can rather than
//! stopping at the first, so a report lists all structural problems at once.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::spec::model::{self, SkillSpec};
use crate::spec::rules::DecisionRules;

/// Sections every spec must carry, in taxonomy order.
pub const REQUIRED_SECTIONS: [&str; 9] = [
    "skill",
    "inputs",
    "preconditions",
    "non_goals",
    "decision_rules",
    "steps",
    "output_contract",
    "failure_modes",
    "edge_cases",
];

/// A structural validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaError {
    /// Dot/bracket path of the offending field (`inputs[2].name`).
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (Suggestion: {suggestion})")?;
        }
        Ok(())
    }
}

/// Result of schema validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaResult {
    pub valid: bool,
    pub errors: Vec<SchemaError>,
    pub warnings: Vec<SchemaError>,
}

impl SchemaResult {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn add_error(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.errors.push(SchemaError {
            path: path.into(),
            message: message.into(),
            suggestion,
        });
        self.valid = false;
    }

    fn add_warning(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.warnings.push(SchemaError {
            path: path.into(),
            message: message.into(),
            suggestion,
        });
    }
}

fn section_suggestion(section: &str) -> Option<String> {
    let text = match section {
        "skill" => "Add a 'skill' section with name, version, purpose, and owner",
        "inputs" => "Add an 'inputs' section with at least one input definition",
        "preconditions" => "Add a 'preconditions' section listing prerequisites",
        "non_goals" => "Add a 'non_goals' section stating what the skill does NOT do",
        "decision_rules" => "Add 'decision_rules' section with explicit conditions",
        "steps" => "Add a 'steps' section with execution flow",
        "output_contract" => "Add 'output_contract' with format and schema",
        "failure_modes" => "Add 'failure_modes' section with error definitions",
        "edge_cases" => "Add 'edge_cases' section covering boundary conditions",
        _ => return None,
    };
    Some(text.to_string())
}

/// Layer 1: structural validation of the raw spec document.
#[derive(Debug, Default)]
pub struct SchemaLayer {
    supplementary: Option<serde_json::Value>,
}

impl SchemaLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            supplementary: None,
        }
    }

    /// Attach an externally supplied JSON-Schema document; its `required`
    /// list is enforced on top of the built-in checks.
    #[must_use]
    pub fn with_supplementary(mut self, schema: serde_json::Value) -> Self {
        self.supplementary = Some(schema);
        self
    }

    /// Validate the spec structure, collecting all findings.
    #[must_use]
    pub fn check(&self, spec: &Value, rules: &DecisionRules) -> SchemaResult {
        let mut result = SchemaResult::new();

        check_required_sections(spec, &mut result);
        check_spec_version(spec, &mut result);

        check_meta(spec, &mut result);
        check_skill(spec, &mut result);
        check_inputs(spec, &mut result);
        check_string_list(spec, "preconditions", &mut result);
        check_string_list(spec, "non_goals", &mut result);
        check_rules(rules, &mut result);
        check_steps(spec, &mut result);
        check_output_contract(spec, &mut result);
        check_failure_modes(spec, &mut result);
        check_edge_cases(spec, &mut result);

        for error in &rules.errors {
            result.add_error(
                error.path.clone(),
                error.message.clone(),
                Some("Each rule entry must be an object with 'when' and 'then'".to_string()),
            );
        }

        // A full typed parse catches anything the field walk missed.
        if result.errors.is_empty() {
            if let Err(e) = SkillSpec::from_value(spec) {
                result.add_error("spec", e.to_string(), None);
            }
        }

        if let Some(schema) = &self.supplementary {
            check_supplementary(schema, spec, &mut result);
        }

        result
    }
}

fn check_required_sections(spec: &Value, result: &mut SchemaResult) {
    for section in REQUIRED_SECTIONS {
        match spec.get(section) {
            None => result.add_error(
                section,
                format!("Missing required section: {section}"),
                section_suggestion(section),
            ),
            Some(Value::Null) => result.add_error(
                section,
                format!("Section '{section}' is null"),
                Some(format!("Provide valid content for '{section}'")),
            ),
            Some(Value::Sequence(items)) if items.is_empty() => result.add_error(
                section,
                format!("Section '{section}' is empty"),
                Some(format!("Add at least one item to '{section}'")),
            ),
            Some(_) => {}
        }
    }
}

fn check_spec_version(spec: &Value, result: &mut SchemaResult) {
    match spec.get("spec_version") {
        None => result.add_error(
            "spec_version",
            "Missing required field: spec_version",
            Some("Add 'spec_version: \"skill-spec/1.1\"'".to_string()),
        ),
        Some(value) => {
            let known = value
                .as_str()
                .is_some_and(|v| model::SpecVersion::KNOWN.contains(&v));
            if !known {
                result.add_warning(
                    "spec_version",
                    format!("Unknown spec version: {}", display_scalar(value)),
                    Some("Use one of 'skill-spec/1.0', 'skill-spec/1.1', 'skill-spec/1.2'".to_string()),
                );
            }
        }
    }
}

fn check_meta(spec: &Value, result: &mut SchemaResult) {
    let Some(meta) = spec.get("_meta") else {
        return;
    };
    if !meta.is_mapping() {
        result.add_error("_meta", "Meta configuration must be a mapping", None);
        return;
    }

    if let Some(budget) = meta.get("token_budget") {
        match budget.as_u64() {
            Some(n) if (50..=2000).contains(&n) => {}
            _ => result.add_error(
                "_meta.token_budget",
                "token_budget must be an integer between 50 and 2000",
                None,
            ),
        }
    }
    check_enum_field(
        meta,
        "_meta",
        "content_language",
        &["en", "zh", "auto"],
        result,
    );
    check_enum_field(
        meta,
        "_meta",
        "mixed_language_strategy",
        &["union", "segment_detect", "primary"],
        result,
    );
    check_enum_field(meta, "_meta", "format", &["full", "minimal"], result);
}

fn check_skill(spec: &Value, result: &mut SchemaResult) {
    let Some(skill) = spec.get("skill") else {
        return;
    };
    if !skill.is_mapping() {
        result.add_error("skill", "Skill metadata must be a mapping", None);
        return;
    }

    match skill.get("name").and_then(Value::as_str) {
        None => result.add_error(
            "skill.name",
            "Missing required field: name",
            Some("Add the required field 'name'".to_string()),
        ),
        Some(name) => {
            if !model::is_kebab_case(name) {
                result.add_error(
                    "skill.name",
                    format!("Skill name must be kebab-case (e.g., 'extract-api-contract'), got: {name}"),
                    Some("Check the format matches the required pattern".to_string()),
                );
            }
            if name.len() > 64 {
                result.add_error(
                    "skill.name",
                    format!("Skill name must be 1-64 characters, got: {}", name.len()),
                    None,
                );
            }
        }
    }

    match skill.get("version").and_then(Value::as_str) {
        None => result.add_error(
            "skill.version",
            "Missing required field: version",
            Some("Add the required field 'version'".to_string()),
        ),
        Some(version) if !model::is_semver(version) => result.add_error(
            "skill.version",
            format!("Version must follow semver (e.g., '1.0.0'), got: {version}"),
            Some("Check the format matches the required pattern".to_string()),
        ),
        Some(_) => {}
    }

    match skill.get("purpose").and_then(Value::as_str) {
        None => result.add_error(
            "skill.purpose",
            "Missing required field: purpose",
            Some("Add the required field 'purpose'".to_string()),
        ),
        Some(purpose) if purpose.len() < 10 => result.add_error(
            "skill.purpose",
            "Purpose must be at least 10 characters",
            Some("Provide a longer value".to_string()),
        ),
        Some(purpose) if purpose.len() > 1024 => result.add_error(
            "skill.purpose",
            "Purpose must be at most 1024 characters",
            None,
        ),
        Some(_) => {}
    }

    match skill.get("owner").and_then(Value::as_str) {
        None => result.add_error(
            "skill.owner",
            "Missing required field: owner",
            Some("Add the required field 'owner'".to_string()),
        ),
        Some(owner) if owner.trim().is_empty() => {
            result.add_error("skill.owner", "Owner must not be empty", None);
        }
        Some(_) => {}
    }

    check_enum_field(
        skill,
        "skill",
        "category",
        &[
            "documentation",
            "analysis",
            "generation",
            "transformation",
            "validation",
            "orchestration",
            "other",
        ],
        result,
    );
    check_enum_field(
        skill,
        "skill",
        "complexity",
        &["low", "standard", "advanced"],
        result,
    );
}

fn check_inputs(spec: &Value, result: &mut SchemaResult) {
    let Some(items) = spec.get("inputs").and_then(Value::as_sequence) else {
        return;
    };

    for (i, input) in items.iter().enumerate() {
        let path = format!("inputs[{i}]");
        if !input.is_mapping() {
            result.add_error(&path, "Input definition must be a mapping", None);
            continue;
        }

        match input.get("name").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.name"),
                "Missing required field: name",
                Some("Add the required field 'name'".to_string()),
            ),
            Some(name) if !model::is_snake_case(name) => result.add_error(
                format!("{path}.name"),
                format!("Input name must be snake_case (e.g., 'user_input'), got: {name}"),
                Some("Check the format matches the required pattern".to_string()),
            ),
            Some(_) => {}
        }

        match input.get("type").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.type"),
                "Missing required field: type",
                Some("Add the required field 'type'".to_string()),
            ),
            Some(ty) if !["string", "number", "boolean", "object", "array"].contains(&ty) => {
                result.add_error(
                    format!("{path}.type"),
                    format!("Unknown input type: {ty}"),
                    Some("Use one of: string, number, boolean, object, array".to_string()),
                );
            }
            Some(_) => {}
        }

        match input.get("required") {
            None => result.add_error(
                format!("{path}.required"),
                "Missing required field: required",
                Some("Add the required field 'required'".to_string()),
            ),
            Some(v) if !v.is_bool() => result.add_error(
                format!("{path}.required"),
                "Field 'required' must be a boolean",
                None,
            ),
            Some(_) => {}
        }

        if let Some(domain) = input.get("domain") {
            check_domain(domain, &format!("{path}.domain"), result);
        }

        if let Some(constraints) = input.get("constraints") {
            if !constraints.is_sequence() {
                result.add_error(
                    format!("{path}.constraints"),
                    "Constraints must be a list",
                    Some("This field should be a list".to_string()),
                );
            }
        }
    }
}

fn check_domain(domain: &Value, path: &str, result: &mut SchemaResult) {
    if !domain.is_mapping() {
        result.add_error(path, "Domain must be a mapping", None);
        return;
    }

    let domain_type = domain.get("type").and_then(Value::as_str);
    match domain_type {
        None => {
            result.add_error(
                format!("{path}.type"),
                "Missing required field: type",
                Some("Add the required field 'type'".to_string()),
            );
            return;
        }
        Some(ty) if !["enum", "range", "pattern_set", "boolean", "any"].contains(&ty) => {
            result.add_error(
                format!("{path}.type"),
                format!("Unknown domain type: {ty}"),
                Some("Use one of: enum, range, pattern_set, boolean, any".to_string()),
            );
            return;
        }
        Some(_) => {}
    }

    match domain_type {
        Some("enum") => {
            let has_values = domain
                .get("values")
                .and_then(Value::as_sequence)
                .is_some_and(|v| !v.is_empty());
            if !has_values {
                result.add_error(
                    path,
                    "Enum domain requires 'values' field",
                    Some("Add a non-empty 'values' list".to_string()),
                );
            }
        }
        Some("range") => {
            let has_min = domain.get("min").is_some_and(|v| v.as_f64().is_some());
            let has_max = domain.get("max").is_some_and(|v| v.as_f64().is_some());
            if !has_min || !has_max {
                result.add_error(
                    path,
                    "Range domain requires 'min' and 'max' fields",
                    Some("Add numeric 'min' and 'max'".to_string()),
                );
            }
        }
        Some("pattern_set") => {
            let has_patterns = domain
                .get("patterns")
                .and_then(Value::as_sequence)
                .is_some_and(|v| !v.is_empty());
            if !has_patterns {
                result.add_error(
                    path,
                    "Pattern set domain requires 'patterns' field",
                    Some("Add a non-empty 'patterns' list".to_string()),
                );
            }
        }
        _ => {}
    }
}

fn check_string_list(spec: &Value, section: &str, result: &mut SchemaResult) {
    let Some(items) = spec.get(section).and_then(Value::as_sequence) else {
        if spec.get(section).is_some_and(|v| !v.is_null() && !v.is_sequence()) {
            result.add_error(
                section,
                format!("Section '{section}' must be a list"),
                Some("This field should be a list".to_string()),
            );
        }
        return;
    };

    for (i, item) in items.iter().enumerate() {
        if !item.is_string() {
            result.add_error(
                format!("{section}[{i}]"),
                "Entry must be a string",
                None,
            );
        }
    }
}

fn check_rules(rules: &DecisionRules, result: &mut SchemaResult) {
    let mut seen = BTreeSet::new();
    for rule in &rules.rules {
        let Some(id) = rule.id.as_deref() else {
            continue;
        };
        if !model::is_snake_case(id) {
            result.add_error(
                format!("decision_rules.{id}.id"),
                format!("Rule ID must be snake_case (e.g., 'rule_validation'), got: {id}"),
                Some("Check the format matches the required pattern".to_string()),
            );
        }
        if !seen.insert(id) {
            result.add_error(
                format!("decision_rules.{id}.id"),
                format!("Duplicate rule id: {id}"),
                Some("Rule ids must be unique across the spec".to_string()),
            );
        }
    }
}

fn check_steps(spec: &Value, result: &mut SchemaResult) {
    let Some(items) = spec.get("steps").and_then(Value::as_sequence) else {
        return;
    };

    let mut seen = BTreeSet::new();
    for (i, step) in items.iter().enumerate() {
        let path = format!("steps[{i}]");
        if !step.is_mapping() {
            result.add_error(&path, "Step definition must be a mapping", None);
            continue;
        }

        match step.get("id").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.id"),
                "Missing required field: id",
                Some("Add the required field 'id'".to_string()),
            ),
            Some(id) => {
                if !model::is_snake_case(id) {
                    result.add_error(
                        format!("{path}.id"),
                        format!("Step ID must be snake_case (e.g., 'validate_input'), got: {id}"),
                        Some("Check the format matches the required pattern".to_string()),
                    );
                }
                if !seen.insert(id.to_string()) {
                    result.add_error(
                        format!("{path}.id"),
                        format!("Duplicate step id: {id}"),
                        None,
                    );
                }
            }
        }

        match step.get("action").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.action"),
                "Missing required field: action",
                Some("Add the required field 'action'".to_string()),
            ),
            Some(action) if action.trim().is_empty() => result.add_error(
                format!("{path}.action"),
                "Step action must not be empty",
                Some("Provide a longer value".to_string()),
            ),
            Some(_) => {}
        }

        if let Some(based_on) = step.get("based_on") {
            if !based_on.is_sequence() {
                result.add_error(
                    format!("{path}.based_on"),
                    "Field 'based_on' must be a list",
                    Some("This field should be a list".to_string()),
                );
            }
        }
    }
}

fn check_output_contract(spec: &Value, result: &mut SchemaResult) {
    let Some(contract) = spec.get("output_contract") else {
        return;
    };
    if !contract.is_mapping() {
        result.add_error("output_contract", "Output contract must be a mapping", None);
        return;
    }

    match contract.get("format").and_then(Value::as_str) {
        None => result.add_error(
            "output_contract.format",
            "Missing required field: format",
            Some("Add the required field 'format'".to_string()),
        ),
        Some(format) if !["json", "text", "markdown", "yaml", "binary"].contains(&format) => {
            result.add_error(
                "output_contract.format",
                format!("Unknown output format: {format}"),
                Some("Use one of: json, text, markdown, yaml, binary".to_string()),
            );
        }
        Some(_) => {}
    }

    if contract.get("schema").is_none() {
        result.add_error(
            "output_contract.schema",
            "Missing required field: schema",
            Some("Add the required field 'schema'".to_string()),
        );
    }
}

fn check_failure_modes(spec: &Value, result: &mut SchemaResult) {
    let Some(items) = spec.get("failure_modes").and_then(Value::as_sequence) else {
        return;
    };

    let mut seen = BTreeSet::new();
    for (i, mode) in items.iter().enumerate() {
        let path = format!("failure_modes[{i}]");
        if !mode.is_mapping() {
            result.add_error(&path, "Failure mode must be a mapping", None);
            continue;
        }

        match mode.get("code").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.code"),
                "Missing required field: code",
                Some("Add the required field 'code'".to_string()),
            ),
            Some(code) => {
                if !model::is_upper_snake_case(code) {
                    result.add_error(
                        format!("{path}.code"),
                        format!("Error code must be UPPER_SNAKE_CASE (e.g., 'EMPTY_INPUT'), got: {code}"),
                        Some("Check the format matches the required pattern".to_string()),
                    );
                }
                if !seen.insert(code.to_string()) {
                    result.add_error(
                        format!("{path}.code"),
                        format!("Duplicate failure code: {code}"),
                        None,
                    );
                }
            }
        }

        match mode.get("retryable") {
            None => result.add_error(
                format!("{path}.retryable"),
                "Missing required field: retryable",
                Some("Add the required field 'retryable'".to_string()),
            ),
            Some(v) if !v.is_bool() => result.add_error(
                format!("{path}.retryable"),
                "Field 'retryable' must be a boolean",
                None,
            ),
            Some(_) => {}
        }
    }
}

fn check_edge_cases(spec: &Value, result: &mut SchemaResult) {
    let Some(items) = spec.get("edge_cases").and_then(Value::as_sequence) else {
        return;
    };

    for (i, case) in items.iter().enumerate() {
        let path = format!("edge_cases[{i}]");
        if !case.is_mapping() {
            result.add_error(&path, "Edge case must be a mapping", None);
            continue;
        }

        match case.get("case").and_then(Value::as_str) {
            None => result.add_error(
                format!("{path}.case"),
                "Missing required field: case",
                Some("Add the required field 'case'".to_string()),
            ),
            Some(name) if name.trim().is_empty() => {
                result.add_error(format!("{path}.case"), "Case name must not be empty", None);
            }
            Some(_) => {}
        }

        if case.get("expected").is_none() {
            result.add_error(
                format!("{path}.expected"),
                "Missing required field: expected",
                Some("Add the required field 'expected'".to_string()),
            );
        }
    }
}

fn check_enum_field(
    parent: &Value,
    parent_path: &str,
    field: &str,
    allowed: &[&str],
    result: &mut SchemaResult,
) {
    let Some(value) = parent.get(field) else {
        return;
    };
    if value.is_null() {
        return;
    }
    let ok = value.as_str().is_some_and(|v| allowed.contains(&v));
    if !ok {
        result.add_error(
            format!("{parent_path}.{field}"),
            format!(
                "Field '{field}' must be one of: {}",
                allowed.join(", ")
            ),
            None,
        );
    }
}

fn check_supplementary(schema: &serde_json::Value, spec: &Value, result: &mut SchemaResult) {
    let Some(required) = schema.get("required").and_then(serde_json::Value::as_array) else {
        return;
    };
    for name in required.iter().filter_map(serde_json::Value::as_str) {
        if spec.get(name).is_none() {
            result.add_error(
                name,
                format!("Missing field required by supplementary schema: {name}"),
                None,
            );
        }
    }
}

fn display_scalar(value: &Value) -> String {
    value.as_str().map_or_else(
        || serde_yaml::to_string(value).map_or_else(|_| "?".to_string(), |s| s.trim().to_string()),
        ToString::to_string,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::rules::normalize;

    fn check(yaml: &str) -> SchemaResult {
        let spec: Value = serde_yaml::from_str(yaml).unwrap();
        let rules = normalize(spec.get("decision_rules").unwrap_or(&Value::Null));
        SchemaLayer::new().check(&spec, &rules)
    }

    const VALID_SPEC: &str = r#"
spec_version: skill-spec/1.0
skill:
  name: extract-api-contract
  version: 1.0.0
  purpose: Extract API contracts from annotated source files.
  owner: platform-team
inputs:
  - name: source_path
    type: string
    required: true
preconditions:
  - Source tree is checked out
non_goals:
  - Does not modify source files
decision_rules:
  - id: rule_empty
    when: "source_path == ''"
    then:
      status: error
      code: EMPTY_INPUT
steps:
  - id: parse_source
    action: Parse the source file into an AST
    output: ast
output_contract:
  format: json
  schema:
    type: object
failure_modes:
  - code: EMPTY_INPUT
    retryable: false
edge_cases:
  - case: empty path
    expected:
      status: error
    covers_failure: EMPTY_INPUT
"#;

    #[test]
    fn test_valid_spec_passes() {
        let result = check(VALID_SPEC);
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_section_reported_with_suggestion() {
        let result = check("spec_version: skill-spec/1.0\nskill:\n  name: a-skill\n");
        let inputs_error = result.errors.iter().find(|e| e.path == "inputs").unwrap();
        assert!(inputs_error.message.contains("Missing required section"));
        assert!(inputs_error.suggestion.as_deref().unwrap().contains("inputs"));
    }

    #[test]
    fn test_empty_list_section_is_an_error() {
        let yaml = VALID_SPEC.replace(
            "inputs:\n  - name: source_path\n    type: string\n    required: true",
            "inputs: []",
        );
        let result = check(&yaml);
        assert!(!result.valid);
        let error = result.errors.iter().find(|e| e.path == "inputs").unwrap();
        assert!(error.message.contains("empty"));
        assert!(error.suggestion.as_deref().unwrap().contains("at least one"));
    }

    #[test]
    fn test_unknown_version_is_warning_not_error() {
        let yaml = VALID_SPEC.replace("skill-spec/1.0", "skill-spec/9.9");
        let result = check(&yaml);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "spec_version");
    }

    #[test]
    fn test_bad_identifiers_collected_together() {
        let yaml = VALID_SPEC
            .replace("name: source_path", "name: SourcePath")
            .replace("code: EMPTY_INPUT\n    retryable: false", "code: empty_input\n    retryable: false");
        let result = check(&yaml);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "inputs[0].name"));
        assert!(result.errors.iter().any(|e| e.path == "failure_modes[0].code"));
    }

    #[test]
    fn test_duplicate_failure_codes_rejected() {
        let yaml = VALID_SPEC.replace(
            "failure_modes:\n  - code: EMPTY_INPUT\n    retryable: false",
            "failure_modes:\n  - code: EMPTY_INPUT\n    retryable: false\n  - code: EMPTY_INPUT\n    retryable: true",
        );
        let result = check(&yaml);
        assert!(result.errors.iter().any(|e| e.message.contains("Duplicate failure code")));
    }

    #[test]
    fn test_domain_companion_fields_enforced() {
        let yaml = VALID_SPEC.replace(
            "    required: true",
            "    required: true\n    domain:\n      type: range\n      min: 0",
        );
        let result = check(&yaml);
        assert!(result.errors.iter().any(|e| e.message.contains("'min' and 'max'")));
    }

    #[test]
    fn test_supplementary_schema_required_list() {
        let spec: Value = serde_yaml::from_str(VALID_SPEC).unwrap();
        let rules = normalize(spec.get("decision_rules").unwrap());
        let schema = serde_json::json!({"required": ["skill", "telemetry"]});
        let result = SchemaLayer::new()
            .with_supplementary(schema)
            .check(&spec, &rules);
        assert!(result.errors.iter().any(|e| e.path == "telemetry"));
    }

    #[test]
    fn test_malformed_rule_entries_surface_as_schema_errors() {
        let yaml = VALID_SPEC.replace(
            "decision_rules:\n  - id: rule_empty\n    when: \"source_path == ''\"\n    then:\n      status: error\n      code: EMPTY_INPUT",
            "decision_rules:\n  - \"not a rule\"",
        );
        let result = check(&yaml);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "decision_rules[0]"));
    }
}
