//! Compliance validation: externally supplied policy predicates evaluated
//! against the normalized spec.
//!
//! Predicates are one-line expressions of the form `<path> <op> <literal>`
//! with ops `== != >= <= > < contains exists not_exists`. Paths use the
//! same dot/bracket grammar as the scan scope, plus a `.count` pseudo-field
//! on lists. An unparseable predicate fails its rule with an explanatory
//! violation; it never aborts the check. Multiple policy files are
//! additive.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::Severity;
use super::scope;
use crate::error::Result;
use crate::spec::rules::DecisionRules;

/// One policy rule.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    #[serde(default = "default_rule_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub description: Option<String>,
    pub predicate: String,
}

const fn default_rule_severity() -> Severity {
    Severity::Error
}

/// A policy document: an ordered list of rules.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl PolicyFile {
    /// Load a policy file from YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut file: Self = serde_yaml::from_str(&content)?;
        if file.name.is_none() {
            file.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned());
        }
        Ok(file)
    }
}

/// A policy rule that did not hold.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceViolation {
    pub policy: String,
    pub rule_id: String,
    pub severity: Severity,
    pub predicate: String,
    pub message: String,
}

/// Result of compliance validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceResult {
    pub policies_applied: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
    pub violations: Vec<ComplianceViolation>,
}

/// Layer 5: policy compliance.
#[derive(Debug, Default)]
pub struct ComplianceLayer;

impl ComplianceLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate every rule of every policy against the normalized spec.
    #[must_use]
    pub fn check(
        &self,
        spec: &Value,
        rules: &DecisionRules,
        policies: &[PolicyFile],
    ) -> ComplianceResult {
        let mut result = ComplianceResult {
            policies_applied: policies.len(),
            ..ComplianceResult::default()
        };

        let canonical = canonical_spec(spec, rules);

        for policy in policies {
            let policy_name = policy.name.as_deref().unwrap_or("policy");
            for rule in &policy.rules {
                match evaluate(&canonical, &rule.predicate) {
                    Ok(true) => result.rules_passed += 1,
                    Ok(false) => {
                        result.rules_failed += 1;
                        result.violations.push(ComplianceViolation {
                            policy: policy_name.to_string(),
                            rule_id: rule.id.clone(),
                            severity: rule.severity,
                            predicate: rule.predicate.clone(),
                            message: rule
                                .description
                                .clone()
                                .unwrap_or_else(|| "Predicate not satisfied".to_string()),
                        });
                    }
                    Err(reason) => {
                        result.rules_failed += 1;
                        result.violations.push(ComplianceViolation {
                            policy: policy_name.to_string(),
                            rule_id: rule.id.clone(),
                            severity: rule.severity,
                            predicate: rule.predicate.clone(),
                            message: format!("Predicate could not be evaluated: {reason}"),
                        });
                    }
                }
            }
        }

        result
    }
}

/// The spec with `decision_rules` replaced by its canonical encoding, so
/// predicates see one stable shape regardless of the source format.
fn canonical_spec(spec: &Value, rules: &DecisionRules) -> Value {
    let Value::Mapping(map) = spec else {
        return spec.clone();
    };
    let mut out = Mapping::new();
    for (key, value) in map {
        if key.as_str() == Some("decision_rules") {
            out.insert(key.clone(), rules.to_value());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    Value::Mapping(out)
}

fn evaluate(spec: &Value, predicate: &str) -> std::result::Result<bool, String> {
    let mut tokens = predicate.split_whitespace();
    let path = tokens
        .next()
        .ok_or_else(|| "empty predicate".to_string())?;
    let op = tokens
        .next()
        .ok_or_else(|| "missing operator".to_string())?;
    let literal = tokens.collect::<Vec<_>>().join(" ");

    let target = resolve(spec, path);

    match op {
        "exists" => Ok(target.is_some()),
        "not_exists" => Ok(target.is_none()),
        "==" | "!=" | ">=" | "<=" | ">" | "<" | "contains" => {
            if literal.is_empty() {
                return Err(format!("operator '{op}' requires a literal operand"));
            }
            let Some(target) = target else {
                return Err(format!("path '{path}' not found in spec"));
            };
            let literal = parse_literal(&literal);
            compare(&target, op, &literal)
        }
        other => Err(format!("unknown operator '{other}'")),
    }
}

/// Resolve a predicate path, honoring the `.count` pseudo-field on lists.
fn resolve(spec: &Value, path: &str) -> Option<Value> {
    if let Some(parent) = path.strip_suffix(".count") {
        let value = scope::lookup(spec, parent)?;
        let count = match value {
            Value::Sequence(items) => items.len(),
            Value::Mapping(map) => map.len(),
            _ => return None,
        };
        return Some(Value::from(count as u64));
    }
    scope::lookup(spec, path).cloned()
}

fn parse_literal(raw: &str) -> Value {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
    if let Some(inner) = unquoted {
        return Value::from(inner);
    }
    serde_yaml::from_str(trimmed).unwrap_or_else(|_| Value::from(trimmed))
}

fn compare(target: &Value, op: &str, literal: &Value) -> std::result::Result<bool, String> {
    match op {
        "==" => Ok(loose_eq(target, literal)),
        "!=" => Ok(!loose_eq(target, literal)),
        "contains" => match (target, literal) {
            (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle)),
            (Value::Sequence(items), needle) => Ok(items.iter().any(|item| loose_eq(item, needle))),
            _ => Err("'contains' requires a string or list on the left".to_string()),
        },
        ">=" | "<=" | ">" | "<" => {
            let (Some(a), Some(b)) = (target.as_f64(), literal.as_f64()) else {
                return Err(format!("operator '{op}' requires numeric operands"));
            };
            Ok(match op {
                ">=" => a >= b,
                "<=" => a <= b,
                ">" => a > b,
                _ => a < b,
            })
        }
        other => Err(format!("unknown operator '{other}'")),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return (x - y).abs() < f64::EPSILON;
    }
    a == b
}
