//! Typed skill specification model.
//!
//! Section taxonomy: eight required core sections (`skill`, `inputs`,
//! `preconditions`, `non_goals`, `decision_rules`, `steps`,
//! `output_contract`, `failure_modes`), one required coverage section
//! (`edge_cases`), and one optional context section (`context`).
//!
//! A parsed [`SkillSpec`] is immutable; transformations produce new values.
//! The `decision_rules` section is kept raw here because it accepts several
//! encodings - [`crate::spec::rules::normalize`] resolves them into the
//! canonical form every validation layer consumes.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::Result;

static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("valid regex"));
static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));
static UPPER_SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"));
static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

/// Check a kebab-case identifier (skill names).
#[must_use]
pub fn is_kebab_case(s: &str) -> bool {
    KEBAB_CASE.is_match(s)
}

/// Check a snake_case identifier (input names, rule ids, step ids).
#[must_use]
pub fn is_snake_case(s: &str) -> bool {
    SNAKE_CASE.is_match(s)
}

/// Check an UPPER_SNAKE_CASE code (failure codes).
#[must_use]
pub fn is_upper_snake_case(s: &str) -> bool {
    UPPER_SNAKE_CASE.is_match(s)
}

/// Check a MAJOR.MINOR.PATCH version string.
#[must_use]
pub fn is_semver(s: &str) -> bool {
    SEMVER.is_match(s)
}

/// Schema version identifier.
///
/// Unrecognized versions parse into [`SpecVersion::Unknown`] so validation
/// can warn instead of refusing the document outright.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SpecVersion {
    #[serde(rename = "skill-spec/1.0")]
    V1_0,
    #[serde(rename = "skill-spec/1.1")]
    V1_1,
    #[serde(rename = "skill-spec/1.2")]
    V1_2,
    #[serde(untagged)]
    Unknown(String),
}

impl SpecVersion {
    /// Version strings the validator recognizes.
    pub const KNOWN: [&'static str; 3] = ["skill-spec/1.0", "skill-spec/1.1", "skill-spec/1.2"];

    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::V1_0 => "skill-spec/1.0",
            Self::V1_1 => "skill-spec/1.1",
            Self::V1_2 => "skill-spec/1.2",
            Self::Unknown(s) => s,
        }
    }
}

impl Default for SpecVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary content language.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLanguage {
    #[default]
    En,
    Zh,
    Auto,
}

/// Strategy for validating mixed-language content.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixedLanguageStrategy {
    #[default]
    Union,
    SegmentDetect,
    Primary,
}

/// Spec rendering format.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    #[default]
    Full,
    Minimal,
}

/// Meta configuration (`_meta` section).
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    #[serde(default)]
    pub content_language: ContentLanguage,
    #[serde(default)]
    pub mixed_language_strategy: MixedLanguageStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SpecFormat>,
    /// Target word count for the generated document (50..=2000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<u32>,
}

/// Skill category classification.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Documentation,
    Analysis,
    Generation,
    Transformation,
    Validation,
    Orchestration,
    Other,
}

/// Skill complexity level.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Standard,
    Advanced,
}

/// Core skill metadata (the `skill` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillMetadata {
    /// Kebab-case skill name, 1-64 characters.
    pub name: String,
    /// Semantic version (MAJOR.MINOR.PATCH).
    pub version: String,
    /// Single-sentence purpose statement, 10-1024 characters.
    pub purpose: String,
    /// Team or individual responsible.
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SkillCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas: Option<Vec<String>>,
}

/// Supported input data types.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Domain types for coverage analysis.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    Enum,
    Range,
    PatternSet,
    Boolean,
    Any,
}

/// Valid input space for an input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDomain {
    #[serde(rename = "type")]
    pub domain_type: DomainType,
    /// Enum values (for `type: enum`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Minimum value (for `type: range`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum value (for `type: range`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Pattern set (for `type: pattern_set`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
}

impl InputDomain {
    /// Companion field required by the domain type but missing, if any.
    #[must_use]
    pub fn missing_companion(&self) -> Option<&'static str> {
        match self.domain_type {
            DomainType::Enum if self.values.as_ref().is_none_or(Vec::is_empty) => Some("values"),
            DomainType::Range if self.min.is_none() || self.max.is_none() => Some("min/max"),
            DomainType::PatternSet if self.patterns.as_ref().is_none_or(Vec::is_empty) => {
                Some("patterns")
            }
            _ => None,
        }
    }
}

/// A single input parameter (the `inputs` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// Parameter name (snake_case).
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<InputDomain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A single step in the execution flow (the `steps` section).
///
/// `based_on` entries must name an `output` produced by an earlier step in
/// declaration order, so the dependency graph is forward-only by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionStep {
    /// Unique step identifier (snake_case).
    pub id: String,
    /// Action to perform.
    pub action: String,
    /// Output variable name this step produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Outputs of previous steps this step consumes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Text,
    Markdown,
    Yaml,
    Binary,
}

/// Expected output format and schema (the `output_contract` section).
///
/// The schema is a JSON-Schema-shaped object; it is validated structurally,
/// not semantically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputContract {
    pub format: OutputFormat,
    pub schema: Value,
}

/// A designed failure scenario (the `failure_modes` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureMode {
    /// Error code (UPPER_SNAKE_CASE, unique across the spec).
    pub code: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_hint: Option<String>,
}

/// A boundary condition (the `edge_cases` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeCase {
    pub case: String,
    /// Expected behavior for this case.
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_example: Option<Value>,
    /// Decision rule this case exercises; must resolve to a known rule id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covers_rule: Option<String>,
    /// Failure mode this case exercises; must resolve to a known code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covers_failure: Option<String>,
}

/// Reference to a related skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillReference {
    pub skill: String,
    pub reason: String,
}

/// Usage scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    pub description: String,
}

/// Context and collaboration info (the optional `context` section).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub works_with: Option<Vec<SkillReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<Scenario>>,
}

/// Root of a skill specification document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillSpec {
    #[serde(default)]
    pub spec_version: SpecVersion,
    #[serde(default, rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaConfig>,
    pub skill: SkillMetadata,
    pub inputs: Vec<InputSpec>,
    pub preconditions: Vec<String>,
    pub non_goals: Vec<String>,
    /// Raw decision rules; any of the accepted encodings.
    pub decision_rules: Value,
    pub steps: Vec<ExecutionStep>,
    pub output_contract: OutputContract,
    pub failure_modes: Vec<FailureMode>,
    pub edge_cases: Vec<EdgeCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextInfo>,
}

impl SkillSpec {
    /// Parse a spec from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a spec from an already-loaded YAML value.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_yaml::from_value(value.clone())?)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_patterns() {
        assert!(is_kebab_case("extract-api-contract"));
        assert!(!is_kebab_case("Extract-API"));
        assert!(!is_kebab_case("extract_api"));

        assert!(is_snake_case("user_input"));
        assert!(!is_snake_case("UserInput"));
        assert!(!is_snake_case("_private"));

        assert!(is_upper_snake_case("EMPTY_INPUT"));
        assert!(!is_upper_snake_case("empty_input"));

        assert!(is_semver("1.0.0"));
        assert!(!is_semver("1.0"));
    }

    #[test]
    fn test_spec_version_parse() {
        let known: SpecVersion = serde_yaml::from_str("skill-spec/1.1").unwrap();
        assert_eq!(known, SpecVersion::V1_1);
        assert!(known.is_known());

        let unknown: SpecVersion = serde_yaml::from_str("skill-spec/9.9").unwrap();
        assert_eq!(unknown, SpecVersion::Unknown("skill-spec/9.9".to_string()));
        assert!(!unknown.is_known());
    }

    #[test]
    fn test_domain_companion_fields() {
        let domain = InputDomain {
            domain_type: DomainType::Range,
            values: None,
            min: Some(0.0),
            max: None,
            patterns: None,
        };
        assert_eq!(domain.missing_companion(), Some("min/max"));

        let domain = InputDomain {
            domain_type: DomainType::Any,
            values: None,
            min: None,
            max: None,
            patterns: None,
        };
        assert_eq!(domain.missing_companion(), None);
    }

    #[test]
    fn test_minimal_spec_round_trip() {
        let yaml = r#"
spec_version: skill-spec/1.0
skill:
  name: extract-api-contract
  version: 1.0.0
  purpose: Extract API contracts from source files.
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
    action: Parse the source file
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
        let spec = SkillSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.skill.name, "extract-api-contract");
        assert_eq!(spec.inputs.len(), 1);
        assert_eq!(spec.output_contract.format, OutputFormat::Json);

        let round = spec.to_yaml().unwrap();
        let spec2 = SkillSpec::from_yaml(&round).unwrap();
        assert_eq!(spec, spec2);
    }
}
