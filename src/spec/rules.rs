//! Decision-rule normalization.
//!
//! The `decision_rules` section accepts three encodings:
//!
//! 1. Canonical: a mapping with `_config` and `rules` (a list).
//! 2. Legacy keyed: a mapping whose non-`_config` entries are rule objects;
//!    the key becomes the rule's id when the rule carries none.
//! 3. Legacy list: a bare list of rule objects.
//!
//! [`normalize`] resolves all three into one canonical ordered list with
//! guaranteed ids, so downstream layers never shape-sniff. Rules missing an
//! explicit id receive `rule_<index>` from their position in the source
//! collection, which makes normalization deterministic and idempotent.
//! Malformed entries are collected as [`NormalizeError`]s rather than
//! aborting, so well-formed siblings still normalize.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// How matching rules are selected.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    #[default]
    FirstMatch,
    Priority,
    AllMatch,
}

/// How multiple rule matches are handled.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    Error,
    Warn,
    FirstWins,
}

/// Configuration for decision-rule matching (`_config`).
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub match_strategy: MatchStrategy,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
}

/// Status values a rule outcome can carry.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Success,
    Error,
    Skip,
    Delegate,
}

/// Log levels for rule actions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Action payload of a rule: a closed set of known fields plus an explicit
/// property bag for anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RuleStatus>,
    /// Error or result code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Action to execute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Execution path to follow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogLevel>,
    /// Additional free-form fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Condition of a rule: a literal boolean, a string expression, or a
/// structured predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleCondition {
    Bool(bool),
    Expr(String),
    Predicate(Mapping),
}

impl RuleCondition {
    /// An expression condition with no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Expr(s) => s.trim().is_empty(),
            Self::Bool(_) => false,
            Self::Predicate(map) => map.is_empty(),
        }
    }

    /// `true` literals carry no trigger information.
    #[must_use]
    pub const fn is_trivial(&self) -> bool {
        matches!(self, Self::Bool(_))
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Expr(s) => f.write_str(s),
            Self::Predicate(map) => {
                let rendered = serde_json::to_value(map)
                    .and_then(|v| serde_json::to_string(&v))
                    .unwrap_or_else(|_| "{..}".to_string());
                f.write_str(&rendered)
            }
        }
    }
}

/// One condition/action pair.
///
/// `when` and `then` stay optional here so the quality layer can report
/// missing pieces instead of the rule silently disappearing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionRule {
    /// Unique rule identifier; assigned during normalization when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Rule priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
    /// Whether this is the default/fallback rule.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<RuleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<RuleAction>,
}

/// A malformed rule entry, reported instead of raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeError {
    /// Dot/bracket path of the offending entry.
    pub path: String,
    pub message: String,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)
    }
}

/// The canonical form of the `decision_rules` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionRules {
    pub config: RuleConfig,
    pub rules: Vec<DecisionRule>,
    /// Entries that failed to parse; empty when the whole section was clean.
    pub errors: Vec<NormalizeError>,
}

impl DecisionRules {
    /// Ids of all normalized rules, in order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| r.id.as_deref())
    }

    /// Ids of rules flagged `is_default`.
    pub fn default_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.is_default)
            .filter_map(|r| r.id.as_deref())
    }

    /// Look up a rule by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&DecisionRule> {
        self.rules.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// Re-emit the canonical `{_config, rules}` encoding.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(
            Value::from("_config"),
            serde_yaml::to_value(self.config).unwrap_or(Value::Null),
        );
        root.insert(
            Value::from("rules"),
            serde_yaml::to_value(&self.rules).unwrap_or(Value::Null),
        );
        Value::Mapping(root)
    }
}

/// Resolve any accepted `decision_rules` encoding into the canonical form.
///
/// Pure function: the input value is never mutated. Re-normalizing the
/// output of [`DecisionRules::to_value`] is a no-op.
#[must_use]
pub fn normalize(raw: &Value) -> DecisionRules {
    let mut out = DecisionRules::default();

    match raw {
        Value::Null => {}
        Value::Mapping(map) => {
            if let Some(cfg) = raw.get("_config") {
                out.config = parse_config(cfg, &mut out.errors);
            }
            if let Some(rules) = raw.get("rules") {
                normalize_rule_list(rules, "decision_rules.rules", &mut out);
            } else {
                normalize_keyed(map, &mut out);
            }
        }
        Value::Sequence(_) => {
            normalize_rule_list(raw, "decision_rules", &mut out);
        }
        _ => {
            out.errors.push(NormalizeError {
                path: "decision_rules".to_string(),
                message: "decision_rules must be a mapping or a list".to_string(),
            });
        }
    }

    out
}

fn parse_config(value: &Value, errors: &mut Vec<NormalizeError>) -> RuleConfig {
    match serde_yaml::from_value::<RuleConfig>(value.clone()) {
        Ok(config) => config,
        Err(e) => {
            errors.push(NormalizeError {
                path: "decision_rules._config".to_string(),
                message: format!("invalid rule configuration: {e}"),
            });
            RuleConfig::default()
        }
    }
}

fn normalize_rule_list(value: &Value, path: &str, out: &mut DecisionRules) {
    let Value::Sequence(items) = value else {
        out.errors.push(NormalizeError {
            path: path.to_string(),
            message: "expected a list of rule objects".to_string(),
        });
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let entry_path = format!("{path}[{i}]");
        if let Some(rule) = parse_rule(item, &entry_path, || format!("rule_{i}"), &mut out.errors) {
            out.rules.push(rule);
        }
    }
}

fn normalize_keyed(map: &Mapping, out: &mut DecisionRules) {
    for (key, value) in map {
        let Some(key) = key.as_str() else {
            out.errors.push(NormalizeError {
                path: "decision_rules".to_string(),
                message: "rule keys must be strings".to_string(),
            });
            continue;
        };
        if key == "_config" {
            continue;
        }

        let entry_path = format!("decision_rules.{key}");
        let fallback = || key.to_string();
        if let Some(rule) = parse_rule(value, &entry_path, fallback, &mut out.errors) {
            out.rules.push(rule);
        }
    }
}

fn parse_rule(
    value: &Value,
    path: &str,
    fallback_id: impl FnOnce() -> String,
    errors: &mut Vec<NormalizeError>,
) -> Option<DecisionRule> {
    if !matches!(value, Value::Mapping(_)) {
        errors.push(NormalizeError {
            path: path.to_string(),
            message: "rule entry must be an object".to_string(),
        });
        return None;
    }

    match serde_yaml::from_value::<DecisionRule>(value.clone()) {
        Ok(mut rule) => {
            if rule.id.is_none() {
                rule.id = Some(fallback_id());
            }
            Some(rule)
        }
        Err(e) => {
            errors.push(NormalizeError {
                path: path.to_string(),
                message: format!("invalid rule: {e}"),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_normalize_canonical_form() {
        let raw = yaml(
            r#"
_config:
  match_strategy: priority
rules:
  - id: rule_empty
    when: "input == ''"
    then:
      status: error
  - when: true
    is_default: true
    then:
      status: success
"#,
        );
        let normalized = normalize(&raw);
        assert!(normalized.errors.is_empty());
        assert_eq!(normalized.config.match_strategy, MatchStrategy::Priority);
        assert_eq!(
            normalized.rule_ids().collect::<Vec<_>>(),
            vec!["rule_empty", "rule_1"]
        );
    }

    #[test]
    fn test_normalize_keyed_form_uses_key_as_id() {
        let raw = yaml(
            r#"
_config:
  conflict_resolution: warn
rule_validation:
  when: "input is present"
  then:
    status: success
rule_fallback:
  id: explicit_id
  when: true
  then:
    status: skip
"#,
        );
        let normalized = normalize(&raw);
        assert!(normalized.errors.is_empty());
        assert_eq!(
            normalized.config.conflict_resolution,
            ConflictResolution::Warn
        );
        assert_eq!(
            normalized.rule_ids().collect::<Vec<_>>(),
            vec!["rule_validation", "explicit_id"]
        );
    }

    #[test]
    fn test_normalize_bare_list_generates_positional_ids() {
        let raw = yaml(
            r#"
- when: "a > 1"
  then:
    status: success
- when: "b > 2"
  then:
    status: error
"#,
        );
        let normalized = normalize(&raw);
        assert_eq!(
            normalized.rule_ids().collect::<Vec<_>>(),
            vec!["rule_0", "rule_1"]
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for text in [
            "- when: \"x\"\n  then:\n    status: success\n",
            "rule_a:\n  when: \"x\"\n  then:\n    status: success\n",
            "_config: {}\nrules:\n  - when: \"x\"\n    then:\n      status: success\n",
        ] {
            let first = normalize(&yaml(text));
            let second = normalize(&first.to_value());
            assert_eq!(first.config, second.config);
            assert_eq!(first.rules, second.rules);
            assert!(second.errors.is_empty());
        }
    }

    #[test]
    fn test_malformed_entries_become_errors_not_panics() {
        let raw = yaml(
            r#"
- "just a string"
- when: "valid"
  then:
    status: success
"#,
        );
        let normalized = normalize(&raw);
        assert_eq!(normalized.rules.len(), 1);
        assert_eq!(normalized.errors.len(), 1);
        assert_eq!(normalized.errors[0].path, "decision_rules[0]");
        // The surviving rule keeps its positional id.
        assert_eq!(normalized.rules[0].id.as_deref(), Some("rule_1"));
    }

    #[test]
    fn test_scalar_section_is_an_error() {
        let normalized = normalize(&Value::from("nope"));
        assert!(normalized.rules.is_empty());
        assert_eq!(normalized.errors.len(), 1);
    }

    #[test]
    fn test_condition_shapes() {
        let raw = yaml(
            r#"
- when: true
  then: {status: success}
- when: "len(input) > 0"
  then: {status: success}
- when:
    field: input
    op: present
  then: {status: success}
"#,
        );
        let normalized = normalize(&raw);
        assert!(normalized.errors.is_empty());
        assert!(matches!(
            normalized.rules[0].when,
            Some(RuleCondition::Bool(true))
        ));
        assert!(matches!(
            normalized.rules[1].when,
            Some(RuleCondition::Expr(_))
        ));
        assert!(matches!(
            normalized.rules[2].when,
            Some(RuleCondition::Predicate(_))
        ));
    }

    #[test]
    fn test_action_keeps_extra_fields() {
        let raw = yaml(
            r#"
- when: "x"
  then:
    status: error
    code: EMPTY_INPUT
    retry_after: 30
"#,
        );
        let normalized = normalize(&raw);
        let action = normalized.rules[0].then.as_ref().unwrap();
        assert_eq!(action.code.as_deref(), Some("EMPTY_INPUT"));
        assert!(action.extra.contains_key("retry_after"));
    }
}
