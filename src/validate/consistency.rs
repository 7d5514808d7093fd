//! Consistency validation: cross-references inside the spec, and drift
//! between a rendered document's generated blocks and a fresh rendering.
//!
//! Manual blocks are never compared; only machine-owned content is held
//! against what the current spec would produce.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::Serialize;
use serde_yaml::Value;

use super::Severity;
use crate::preserve::{self, BlockKind};
use crate::spec::rules::DecisionRules;

/// A dangling reference or drifted block.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyIssue {
    pub issue_type: String,
    /// What refers (an edge case, a step, a document block).
    pub source: String,
    /// What it refers to.
    pub target: String,
    pub description: String,
    pub severity: Severity,
}

/// Result of intra-spec cross-reference validation.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyResult {
    pub valid: bool,
    pub issues: Vec<ConsistencyIssue>,
}

impl Default for ConsistencyResult {
    fn default() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }
}

impl ConsistencyResult {
    fn add(&mut self, issue: ConsistencyIssue) {
        if issue.severity == Severity::Error {
            self.valid = false;
        }
        self.issues.push(issue);
    }
}

/// Result of comparing a document's generated blocks against a fresh
/// rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentConsistency {
    pub valid: bool,
    pub blocks_checked: usize,
    pub issues: Vec<ConsistencyIssue>,
}

/// Layer 4: referential integrity and generated-block fidelity.
#[derive(Debug, Default)]
pub struct ConsistencyLayer;

impl ConsistencyLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validate cross-references between independently edited sections.
    #[must_use]
    pub fn check(&self, spec: &Value, rules: &DecisionRules) -> ConsistencyResult {
        let mut result = ConsistencyResult::default();

        let rule_ids: BTreeSet<&str> = rules.rule_ids().collect();
        let failure_codes: BTreeSet<&str> = spec
            .get("failure_modes")
            .and_then(Value::as_sequence)
            .into_iter()
            .flatten()
            .filter_map(|m| m.get("code").and_then(Value::as_str))
            .collect();

        if let Some(edge_cases) = spec.get("edge_cases").and_then(Value::as_sequence) {
            for (i, edge_case) in edge_cases.iter().enumerate() {
                let name = edge_case
                    .get("case")
                    .and_then(Value::as_str)
                    .map_or_else(|| format!("edge_cases[{i}]"), ToString::to_string);

                if let Some(rule) = edge_case.get("covers_rule").and_then(Value::as_str) {
                    if !rule_ids.contains(rule) {
                        result.add(ConsistencyIssue {
                            issue_type: "unknown_rule_reference".to_string(),
                            source: name.clone(),
                            target: rule.to_string(),
                            description: format!(
                                "Edge case '{name}' references unknown rule: {rule}"
                            ),
                            severity: Severity::Error,
                        });
                    }
                }

                if let Some(code) = edge_case.get("covers_failure").and_then(Value::as_str) {
                    if !failure_codes.contains(code) {
                        result.add(ConsistencyIssue {
                            issue_type: "unknown_failure_reference".to_string(),
                            source: name.clone(),
                            target: code.to_string(),
                            description: format!(
                                "Edge case '{name}' references unknown failure: {code}"
                            ),
                            severity: Severity::Error,
                        });
                    }
                }
            }
        }

        check_step_dependencies(spec, &mut result);

        result
    }

    /// Compare every generated block in `document` against `fresh`, the
    /// content the renderer currently produces.
    ///
    /// Front matter in the fresh rendering is ignored: it lives outside the
    /// generated markers in a wrapped document.
    #[must_use]
    pub fn check_document(&self, document: &str, fresh: &str) -> DocumentConsistency {
        let (_, fresh) = preserve::split_front_matter(fresh);
        let parsed = match preserve::parse_document(document) {
            Ok(parsed) => parsed,
            Err(e) => {
                return DocumentConsistency {
                    valid: false,
                    blocks_checked: 0,
                    issues: vec![ConsistencyIssue {
                        issue_type: "marker_corruption".to_string(),
                        source: "document".to_string(),
                        target: String::new(),
                        description: e.to_string(),
                        severity: Severity::Error,
                    }],
                };
            }
        };

        let mut issues = Vec::new();
        let generated: Vec<_> = parsed
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Generated)
            .collect();

        for (i, block) in generated.iter().enumerate() {
            if normalize_whitespace(&block.content) == normalize_whitespace(fresh) {
                continue;
            }
            issues.push(ConsistencyIssue {
                issue_type: "generated_drift".to_string(),
                source: format!("generated block {}", i + 1),
                target: "spec".to_string(),
                description: diff_summary(&block.content, fresh),
                severity: Severity::Error,
            });
        }

        DocumentConsistency {
            valid: issues.is_empty(),
            blocks_checked: generated.len(),
            issues,
        }
    }
}

fn check_step_dependencies(spec: &Value, result: &mut ConsistencyResult) {
    let Some(steps) = spec.get("steps").and_then(Value::as_sequence) else {
        return;
    };

    let mut available: BTreeSet<&str> = BTreeSet::new();
    for (i, step) in steps.iter().enumerate() {
        let id = step
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("steps[{i}]"), ToString::to_string);

        if let Some(deps) = step.get("based_on").and_then(Value::as_sequence) {
            for dep in deps.iter().filter_map(Value::as_str) {
                if !available.contains(dep) {
                    result.add(ConsistencyIssue {
                        issue_type: "unavailable_dependency".to_string(),
                        source: id.clone(),
                        target: dep.to_string(),
                        description: format!(
                            "Step '{id}' depends on '{dep}' which is not available at this point in the execution flow"
                        ),
                        severity: Severity::Error,
                    });
                }
            }
        }

        if let Some(output) = step.get("output").and_then(Value::as_str) {
            available.insert(output);
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn diff_summary(existing: &str, fresh: &str) -> String {
    let existing_lines: BTreeSet<&str> = existing.trim().lines().collect();
    let fresh_lines: BTreeSet<&str> = fresh.trim().lines().collect();

    let added = fresh_lines.difference(&existing_lines).count();
    let removed = existing_lines.difference(&fresh_lines).count();

    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("Lines added from spec: {added}"));
    }
    if removed > 0 {
        parts.push(format!("Lines removed from existing: {removed}"));
    }
    if parts.is_empty() {
        "Content differs".to_string()
    } else {
        parts.join("; ")
    }
}
