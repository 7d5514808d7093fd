//! Layered validation pipeline.
//!
//! Five layers run in one synchronous pass - schema, quality, coverage,
//! consistency, compliance - and their findings aggregate into a single
//! [`ValidationResult`]. Layers are exception-isolated: malformed
//! substructure degrades to findings, never a panic across the public API.
//! Only unreadable input short-circuits before any layer runs.
//!
//! An engine instance belongs to exactly one logical validation operation.
//! Pattern, scope, schema, and policy tables load lazily and stay memoized
//! for the instance's lifetime; validating concurrently means one engine
//! per worker.

pub mod compliance;
pub mod consistency;
pub mod coverage;
pub mod quality;
pub mod schema;
pub mod scope;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub use compliance::{ComplianceLayer, ComplianceResult, ComplianceViolation, PolicyFile, PolicyRule};
pub use consistency::{ConsistencyIssue, ConsistencyLayer, ConsistencyResult, DocumentConsistency};
pub use coverage::{CoverageConfig, CoverageGap, CoverageLayer, CoverageMetrics, CoverageResult};
pub use quality::{
    DocQualityLayer, ForbiddenPattern, PatternViolation, QualityLayer, QualityResult,
    default_patterns, load_patterns,
};
pub use schema::{REQUIRED_SECTIONS, SchemaError, SchemaLayer, SchemaResult};
pub use scope::{FieldPattern, ScanScope, Thresholds};

use crate::error::{Result, SkillspecError};
use crate::spec::rules::{self, DecisionRules};

/// Severity of a finding. Only `Error` findings flip overall validity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Aggregate result of one validation pass.
///
/// Serializing this to JSON is the canonical machine-readable report;
/// identical inputs produce byte-identical serializations.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub schema: SchemaResult,
    pub quality: QualityResult,
    pub coverage: CoverageResult,
    pub consistency: ConsistencyResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceResult>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl ValidationResult {
    /// Serialize the canonical JSON report.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Orchestrates the five validation layers.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    schema_path: Option<PathBuf>,
    patterns_dir: Option<PathBuf>,
    languages: Vec<String>,
    policy_files: Vec<PathBuf>,

    patterns: OnceLock<Vec<ForbiddenPattern>>,
    scan_scope: OnceLock<ScanScope>,
    schema_doc: OnceLock<Option<serde_json::Value>>,
    policies: OnceLock<Vec<PolicyFile>>,
}

impl ValidationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a supplementary JSON-Schema document.
    #[must_use]
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    /// Load forbidden patterns and scan scope from a directory.
    #[must_use]
    pub fn with_patterns_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.patterns_dir = Some(dir.into());
        self
    }

    /// Languages to load pattern files for (merged by union).
    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Add a compliance policy file. Multiple files are additive.
    #[must_use]
    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_files.push(path.into());
        self
    }

    fn patterns(&self) -> &[ForbiddenPattern] {
        self.patterns.get_or_init(|| {
            self.patterns_dir.as_ref().map_or_else(default_patterns, |dir| {
                let languages: Vec<&str> = if self.languages.is_empty() {
                    vec!["en"]
                } else {
                    self.languages.iter().map(String::as_str).collect()
                };
                load_patterns(dir, &languages)
            })
        })
    }

    fn scan_scope(&self) -> &ScanScope {
        self.scan_scope.get_or_init(|| {
            let Some(dir) = &self.patterns_dir else {
                return ScanScope::default();
            };
            let path = dir.join("scan_scope.yaml");
            if !path.exists() {
                return ScanScope::default();
            }
            ScanScope::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "falling back to default scan scope: {e}");
                ScanScope::default()
            })
        })
    }

    fn schema_doc(&self) -> Option<&serde_json::Value> {
        self.schema_doc
            .get_or_init(|| {
                let path = self.schema_path.as_ref()?;
                let content = std::fs::read_to_string(path)
                    .map_err(|e| {
                        tracing::warn!(path = %path.display(), "cannot read schema document: {e}");
                    })
                    .ok()?;
                serde_json::from_str(&content)
                    .map_err(|e| {
                        tracing::warn!(path = %path.display(), "cannot parse schema document: {e}");
                    })
                    .ok()
            })
            .as_ref()
    }

    fn policies(&self) -> &[PolicyFile] {
        self.policies.get_or_init(|| {
            self.policy_files
                .iter()
                .filter_map(|path| {
                    PolicyFile::load(path)
                        .map_err(|e| {
                            tracing::warn!(path = %path.display(), "skipping unreadable policy: {e}");
                        })
                        .ok()
                })
                .collect()
        })
    }

    /// Run every layer against an already-parsed spec document.
    ///
    /// `strict` additionally counts warnings against validity.
    #[must_use]
    pub fn validate(&self, spec: &Value, strict: bool) -> ValidationResult {
        let rules = rules::normalize(spec.get("decision_rules").unwrap_or(&Value::Null));

        let schema_layer = match self.schema_doc() {
            Some(doc) => SchemaLayer::new().with_supplementary(doc.clone()),
            None => SchemaLayer::new(),
        };
        let schema = schema_layer.check(spec, &rules);
        let quality = QualityLayer::new(self.patterns(), self.scan_scope()).check(spec, &rules);
        let coverage = CoverageLayer::new().check(spec, &rules);
        let consistency = ConsistencyLayer::new().check(spec, &rules);
        let compliance = if self.policies().is_empty() {
            None
        } else {
            Some(ComplianceLayer::new().check(spec, &rules, self.policies()))
        };

        aggregate(schema, quality, coverage, consistency, compliance, strict)
    }

    /// Read, parse, and validate a spec file.
    ///
    /// # Errors
    ///
    /// Unreadable or unparsable input short-circuits before any layer runs.
    pub fn validate_file(&self, path: &Path, strict: bool) -> Result<ValidationResult> {
        let content = std::fs::read_to_string(path)?;
        let spec: Value = serde_yaml::from_str(&content)?;
        if spec.is_null() {
            return Err(SkillspecError::InvalidInput(format!(
                "spec file is empty: {}",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "validating spec");
        Ok(self.validate(&spec, strict))
    }

    /// Normalize the spec's decision rules without running the layers.
    #[must_use]
    pub fn normalize_rules(spec: &Value) -> DecisionRules {
        rules::normalize(spec.get("decision_rules").unwrap_or(&Value::Null))
    }
}

fn aggregate(
    schema: SchemaResult,
    quality: QualityResult,
    coverage: CoverageResult,
    consistency: ConsistencyResult,
    compliance: Option<ComplianceResult>,
    strict: bool,
) -> ValidationResult {
    let compliance_errors = compliance.as_ref().map_or(0, |c| {
        c.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    });
    let compliance_warnings = compliance.as_ref().map_or(0, |c| {
        c.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count()
    });

    let total_errors = schema.errors.len()
        + quality.total_errors
        + coverage.gaps_at(Severity::Error).count()
        + consistency
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
        + compliance_errors;

    let total_warnings = schema.warnings.len()
        + quality.total_warnings
        + coverage.gaps_at(Severity::Warning).count()
        + consistency
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
        + compliance_warnings;

    let valid = total_errors == 0 && (!strict || total_warnings == 0);

    ValidationResult {
        valid,
        schema,
        quality,
        coverage,
        consistency,
        compliance,
        total_errors,
        total_warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    action: Parse the file at source_path
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
    input_example: ""
    covers_rule: rule_empty
    covers_failure: EMPTY_INPUT
"#;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_spec_aggregates_clean() {
        let result = ValidationEngine::new().validate(&parse(VALID_SPEC), false);
        assert!(result.valid, "errors: {}", result.total_errors);
        assert_eq!(result.total_errors, 0);
        assert!(result.compliance.is_none());
    }

    #[test]
    fn test_all_layers_always_run() {
        let yaml = VALID_SPEC.replace("  purpose: Extract API contracts from annotated source files.", "  purpose: Try to handle things as needed from source_path files.");
        let result = ValidationEngine::new().validate(&parse(&yaml), false);
        assert!(!result.valid);
        assert!(result.quality.total_errors >= 2);
        assert_eq!(result.coverage.metrics.structural_score, 100);
    }

    #[test]
    fn test_strict_counts_warnings() {
        let yaml = VALID_SPEC.replace("skill-spec/1.0", "skill-spec/9.9");
        let engine = ValidationEngine::new();
        let relaxed = engine.validate(&parse(&yaml), false);
        assert!(relaxed.valid);
        assert_eq!(relaxed.total_warnings, 1);

        let strict = engine.validate(&parse(&yaml), true);
        assert!(!strict.valid);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let spec = parse(VALID_SPEC);
        let engine = ValidationEngine::new();
        let a = engine.validate(&spec, false).to_json_pretty().unwrap();
        let b = engine.validate(&spec, false).to_json_pretty().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dangling_reference_counts_as_error() {
        let yaml = VALID_SPEC.replace("covers_rule: rule_empty", "covers_rule: rule_ghost");
        let result = ValidationEngine::new().validate(&parse(&yaml), false);
        assert!(!result.valid);
        assert!(
            result
                .consistency
                .issues
                .iter()
                .any(|i| i.target == "rule_ghost")
        );
    }
}
