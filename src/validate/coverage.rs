//! Coverage metrics: how much of the declared surface the spec exercises.
//!
//! Structural coverage is a weighted fraction of failure modes referenced
//! by edge cases, decision rules referenced by edge cases, and inputs
//! referenced from step text. Behavioral coverage is the fraction of edge
//! cases that carry a concrete `input_example`.

use serde::Serialize;
use serde_yaml::Value;

use super::Severity;
use crate::spec::rules::DecisionRules;

/// Counts and scores reported alongside the gaps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageMetrics {
    pub failure_modes_total: usize,
    pub failure_modes_covered: usize,
    pub decision_rules_total: usize,
    pub decision_rules_referenced: usize,
    pub inputs_total: usize,
    pub inputs_referenced: usize,
    pub edge_cases_total: usize,
    pub edge_cases_with_input: usize,
    /// Weighted structural coverage, 0-100.
    pub structural_score: u8,
    /// Fraction of edge cases with an input example, 0-100.
    pub behavioral_score: u8,
}

/// An item nothing in the spec references.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageGap {
    pub gap_type: String,
    pub item: String,
    pub description: String,
    pub severity: Severity,
}

/// Result of coverage analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageResult {
    pub metrics: CoverageMetrics,
    pub gaps: Vec<CoverageGap>,
}

impl CoverageResult {
    /// Gaps at a given severity.
    pub fn gaps_at(&self, severity: Severity) -> impl Iterator<Item = &CoverageGap> {
        self.gaps.iter().filter(move |g| g.severity == severity)
    }
}

/// Weights and gap severities for coverage scoring.
#[derive(Debug, Clone, Copy)]
pub struct CoverageConfig {
    pub failure_weight: f64,
    pub rule_weight: f64,
    pub input_weight: f64,
    pub failure_gap_severity: Severity,
    pub rule_gap_severity: Severity,
    pub input_gap_severity: Severity,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            failure_weight: 0.4,
            rule_weight: 0.3,
            input_weight: 0.3,
            failure_gap_severity: Severity::Error,
            rule_gap_severity: Severity::Warning,
            input_gap_severity: Severity::Warning,
        }
    }
}

/// Layer 3: structural and behavioral coverage.
#[derive(Debug, Default)]
pub struct CoverageLayer {
    config: CoverageConfig,
}

impl CoverageLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_config(config: CoverageConfig) -> Self {
        Self { config }
    }

    /// Compute coverage metrics and gaps for a spec.
    #[must_use]
    pub fn check(&self, spec: &Value, rules: &DecisionRules) -> CoverageResult {
        let mut result = CoverageResult::default();

        let failure_codes = string_fields(spec, "failure_modes", "code");
        let input_names = string_fields(spec, "inputs", "name");
        let rule_ids: Vec<String> = rules.rule_ids().map(ToString::to_string).collect();

        let edge_cases = spec
            .get("edge_cases")
            .and_then(Value::as_sequence)
            .cloned()
            .unwrap_or_default();

        let covered_failures: Vec<&str> = edge_cases
            .iter()
            .filter_map(|ec| ec.get("covers_failure").and_then(Value::as_str))
            .collect();
        let covered_rules: Vec<&str> = edge_cases
            .iter()
            .filter_map(|ec| ec.get("covers_rule").and_then(Value::as_str))
            .collect();

        let step_text = steps_text(spec);

        result.metrics.failure_modes_total = failure_codes.len();
        result.metrics.decision_rules_total = rule_ids.len();
        result.metrics.inputs_total = input_names.len();
        result.metrics.edge_cases_total = edge_cases.len();
        result.metrics.edge_cases_with_input = edge_cases
            .iter()
            .filter(|ec| ec.get("input_example").is_some_and(|v| !v.is_null()))
            .count();

        for code in &failure_codes {
            if covered_failures.contains(&code.as_str()) {
                result.metrics.failure_modes_covered += 1;
            } else {
                result.gaps.push(CoverageGap {
                    gap_type: "unreferenced_failure_mode".to_string(),
                    item: code.clone(),
                    description: format!("No edge case covers failure mode '{code}'"),
                    severity: self.config.failure_gap_severity,
                });
            }
        }

        for id in &rule_ids {
            if covered_rules.contains(&id.as_str()) {
                result.metrics.decision_rules_referenced += 1;
            } else {
                result.gaps.push(CoverageGap {
                    gap_type: "unreferenced_rule".to_string(),
                    item: id.clone(),
                    description: format!("No edge case covers decision rule '{id}'"),
                    severity: self.config.rule_gap_severity,
                });
            }
        }

        for name in &input_names {
            if step_text.contains(name.as_str()) {
                result.metrics.inputs_referenced += 1;
            } else {
                result.gaps.push(CoverageGap {
                    gap_type: "unreferenced_input".to_string(),
                    item: name.clone(),
                    description: format!("No step references input '{name}'"),
                    severity: self.config.input_gap_severity,
                });
            }
        }

        result.metrics.structural_score = self.structural_score(&result.metrics);
        result.metrics.behavioral_score = percent(
            result.metrics.edge_cases_with_input,
            result.metrics.edge_cases_total,
        );

        result
    }

    #[allow(clippy::cast_precision_loss)]
    fn structural_score(&self, metrics: &CoverageMetrics) -> u8 {
        let fraction = |covered: usize, total: usize| {
            if total == 0 {
                1.0
            } else {
                covered as f64 / total as f64
            }
        };

        let weighted = self.config.failure_weight
            * fraction(metrics.failure_modes_covered, metrics.failure_modes_total)
            + self.config.rule_weight
                * fraction(
                    metrics.decision_rules_referenced,
                    metrics.decision_rules_total,
                )
            + self.config.input_weight
                * fraction(metrics.inputs_referenced, metrics.inputs_total);
        let total_weight =
            self.config.failure_weight + self.config.rule_weight + self.config.input_weight;

        if total_weight <= 0.0 {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = (weighted / total_weight * 100.0).round() as u8;
        score.min(100)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(covered: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((covered as f64 / total as f64) * 100.0).round() as u8
}

fn string_fields(spec: &Value, section: &str, field: &str) -> Vec<String> {
    spec.get(section)
        .and_then(Value::as_sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn steps_text(spec: &Value) -> String {
    let mut text = String::new();
    if let Some(steps) = spec.get("steps").and_then(Value::as_sequence) {
        for step in steps {
            for field in ["action", "condition"] {
                if let Some(s) = step.get(field).and_then(Value::as_str) {
                    text.push_str(s);
                    text.push('\n');
                }
            }
        }
    }
    text
}
