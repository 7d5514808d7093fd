//! Quality validation: forbidden-pattern scanning and rule/contract
//! semantic checks.
//!
//! The pattern scan covers the string leaves selected by the scan scope,
//! with code spans stripped first so examples never trip prose rules.
//! Literal patterns match by case-insensitive containment (the original
//! casing is extracted for reporting); regex patterns search
//! case-insensitively. Pattern files merge by union across requested
//! languages.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::Severity;
use super::scope::ScanScope;
use crate::spec::rules::DecisionRules;

/// A single quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternViolation {
    /// Field path (or document name) the violation was found in.
    pub path: String,
    /// The pattern or check that fired.
    pub pattern: String,
    /// The offending text as it appears in the source.
    pub matched_text: String,
    pub category: String,
    pub severity: Severity,
    pub fix_suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl fmt::Display for PatternViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "[{}:{line}]", self.path)?,
            None => write!(f, "[{}]", self.path)?,
        }
        write!(
            f,
            " [{}] {}: Found '{}'. Fix: {}",
            self.severity.to_string().to_uppercase(),
            self.category,
            self.matched_text,
            self.fix_suggestion
        )
    }
}

/// Result of quality validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityResult {
    pub valid: bool,
    pub violations: Vec<PatternViolation>,
    pub category_counts: BTreeMap<String, usize>,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_info: usize,
}

impl QualityResult {
    fn new() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    fn add(&mut self, violation: PatternViolation) {
        *self
            .category_counts
            .entry(violation.category.clone())
            .or_insert(0) += 1;
        match violation.severity {
            Severity::Error => {
                self.total_errors += 1;
                self.valid = false;
            }
            Severity::Warning => self.total_warnings += 1,
            Severity::Info => self.total_info += 1,
        }
        self.violations.push(violation);
    }
}

#[derive(Debug, Deserialize)]
struct PatternDef {
    pattern: String,
    category: String,
    #[serde(default = "default_severity")]
    severity: Severity,
    #[serde(default = "default_context")]
    context: String,
    #[serde(default = "default_fix")]
    fix: String,
    #[serde(default, rename = "regex")]
    is_regex: bool,
}

fn default_severity() -> Severity {
    Severity::Warning
}

fn default_context() -> String {
    "any".to_string()
}

fn default_fix() -> String {
    "Review and revise".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct PatternsFile {
    #[serde(default)]
    patterns: Vec<PatternDef>,
}

/// A compiled forbidden-pattern rule.
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub pattern: String,
    pub category: String,
    pub severity: Severity,
    /// Where the pattern applies (instruction, action, any).
    pub context: String,
    pub fix: String,
    regex: Option<Regex>,
}

impl ForbiddenPattern {
    fn literal(pattern: &str, category: &str, severity: Severity, context: &str, fix: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            category: category.to_string(),
            severity,
            context: context.to_string(),
            fix: fix.to_string(),
            regex: None,
        }
    }

    fn regex(pattern: &str, category: &str, severity: Severity, context: &str, fix: &str) -> Self {
        Self {
            regex: compile_insensitive(pattern),
            pattern: pattern.to_string(),
            category: category.to_string(),
            severity,
            context: context.to_string(),
            fix: fix.to_string(),
        }
    }

    fn from_def(def: PatternDef) -> Option<Self> {
        let regex = if def.is_regex {
            let compiled = compile_insensitive(&def.pattern);
            if compiled.is_none() {
                tracing::warn!(pattern = %def.pattern, "skipping invalid forbidden pattern");
                return None;
            }
            compiled
        } else {
            None
        };
        Some(Self {
            pattern: def.pattern,
            category: def.category,
            severity: def.severity,
            context: def.context,
            fix: def.fix,
            regex,
        })
    }

    /// Search `text`, returning the matched text in its original casing.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<String> {
        if let Some(regex) = &self.regex {
            return regex.find(text).map(|m| m.as_str().to_string());
        }

        let haystack = text.to_ascii_lowercase();
        let needle = self.pattern.to_ascii_lowercase();
        let idx = haystack.find(&needle)?;
        Some(
            text.get(idx..idx + needle.len())
                .map_or_else(|| self.pattern.clone(), ToString::to_string),
        )
    }
}

fn compile_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// The built-in English pattern set, used when no pattern files are
/// configured.
#[must_use]
pub fn default_patterns() -> Vec<ForbiddenPattern> {
    vec![
        ForbiddenPattern::literal(
            "as needed",
            "VAGUE_CONDITION",
            Severity::Error,
            "instruction",
            "Replace with explicit condition",
        ),
        ForbiddenPattern::literal(
            "if appropriate",
            "VAGUE_CONDITION",
            Severity::Error,
            "instruction",
            "Define what 'appropriate' means",
        ),
        ForbiddenPattern::literal(
            "try to",
            "VAGUE_ACTION",
            Severity::Error,
            "action",
            "Remove 'try to' and state definite action",
        ),
        ForbiddenPattern::regex(
            r"\bhelp\b",
            "VAGUE_ACTION",
            Severity::Error,
            "action",
            "Replace with specific action",
        ),
        ForbiddenPattern::regex(
            r"\bgenerally\b",
            "VAGUE_DEGREE",
            Severity::Error,
            "any",
            "Remove or specify exact cases",
        ),
        ForbiddenPattern::regex(
            r"\btypically\b",
            "VAGUE_DEGREE",
            Severity::Error,
            "any",
            "Remove or specify exact cases",
        ),
        ForbiddenPattern::regex(
            r"\bmight\b",
            "HEDGE_WORDS",
            Severity::Warning,
            "any",
            "State definite outcome",
        ),
        ForbiddenPattern::regex(
            r"\bcould\b",
            "HEDGE_WORDS",
            Severity::Warning,
            "any",
            "State definite outcome",
        ),
    ]
}

/// Load pattern files for the requested languages and merge them by union.
///
/// Files are named `forbidden_patterns_<lang>.yaml`. Missing files are
/// skipped; if nothing loads, the built-in set applies.
#[must_use]
pub fn load_patterns(dir: &Path, languages: &[&str]) -> Vec<ForbiddenPattern> {
    let mut patterns = Vec::new();
    for lang in languages {
        let path = dir.join(format!("forbidden_patterns_{lang}.yaml"));
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        match serde_yaml::from_str::<PatternsFile>(&content) {
            Ok(file) => {
                tracing::debug!(language = lang, count = file.patterns.len(), "loaded patterns");
                patterns.extend(file.patterns.into_iter().filter_map(ForbiddenPattern::from_def));
            }
            Err(e) => tracing::warn!(path = %path.display(), "ignoring malformed pattern file: {e}"),
        }
    }

    if patterns.is_empty() {
        default_patterns()
    } else {
        patterns
    }
}

/// Layer 2: prose quality and rule/contract semantics.
pub struct QualityLayer<'a> {
    patterns: &'a [ForbiddenPattern],
    scope: &'a ScanScope,
}

impl<'a> QualityLayer<'a> {
    #[must_use]
    pub const fn new(patterns: &'a [ForbiddenPattern], scope: &'a ScanScope) -> Self {
        Self { patterns, scope }
    }

    /// Scan the spec's prose fields and validate rule/contract semantics.
    #[must_use]
    pub fn check(&self, spec: &Value, rules: &DecisionRules) -> QualityResult {
        let mut result = QualityResult::new();

        let mut fields = Vec::new();
        collect_fields(spec, String::new(), self.scope, &mut fields);

        for (path, text) in &fields {
            let stripped = self.scope.strip_code(text);
            for pattern in self.patterns {
                if let Some(matched) = pattern.find(&stripped) {
                    result.add(PatternViolation {
                        path: path.clone(),
                        pattern: pattern.pattern.clone(),
                        matched_text: matched,
                        category: pattern.category.clone(),
                        severity: pattern.severity,
                        fix_suggestion: pattern.fix.clone(),
                        line_number: None,
                    });
                }
            }
        }

        check_decision_rules(rules, &mut result);
        check_output_contract(spec, &mut result);

        result
    }
}

fn collect_fields(value: &Value, path: String, scope: &ScanScope, out: &mut Vec<(String, String)>) {
    if !path.is_empty() && scope.is_ignored(&path) {
        return;
    }

    match value {
        Value::String(text) => {
            if scope.is_scanned(&path) {
                out.push((path, text.clone()));
            }
        }
        Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = key.as_str() else {
                    continue;
                };
                let child_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{path}.{key}")
                };
                collect_fields(child, child_path, scope, out);
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_fields(child, format!("{path}[{i}]"), scope, out);
            }
        }
        _ => {}
    }
}

fn check_decision_rules(rules: &DecisionRules, result: &mut QualityResult) {
    for rule in &rules.rules {
        let id = rule.id.as_deref().unwrap_or("rule");

        match &rule.when {
            None => result.add(PatternViolation {
                path: format!("decision_rules.{id}.when"),
                pattern: "missing".to_string(),
                matched_text: "<missing>".to_string(),
                category: "MISSING_CONDITION".to_string(),
                severity: Severity::Error,
                fix_suggestion: "Add 'when' condition to decision rule".to_string(),
                line_number: None,
            }),
            Some(when) if when.is_empty() => result.add(PatternViolation {
                path: format!("decision_rules.{id}.when"),
                pattern: "empty".to_string(),
                matched_text: "<empty>".to_string(),
                category: "EMPTY_CONDITION".to_string(),
                severity: Severity::Error,
                fix_suggestion: "Provide non-empty 'when' condition".to_string(),
                line_number: None,
            }),
            Some(_) => {}
        }

        if rule.then.is_none() {
            result.add(PatternViolation {
                path: format!("decision_rules.{id}.then"),
                pattern: "missing".to_string(),
                matched_text: "<missing>".to_string(),
                category: "MISSING_ACTION".to_string(),
                severity: Severity::Error,
                fix_suggestion: "Add 'then' action to decision rule".to_string(),
                line_number: None,
            });
        }
    }

    let defaults: Vec<&str> = rules.default_rule_ids().collect();
    if defaults.len() > 1 {
        result.add(PatternViolation {
            path: "decision_rules".to_string(),
            pattern: "is_default".to_string(),
            matched_text: defaults.join(", "),
            category: "MULTIPLE_DEFAULT_RULES".to_string(),
            severity: Severity::Warning,
            fix_suggestion: "Keep a single default rule; conflict_resolution governs ties"
                .to_string(),
            line_number: None,
        });
    }
}

fn check_output_contract(spec: &Value, result: &mut QualityResult) {
    let contract = spec.get("output_contract").cloned().unwrap_or(Value::Null);
    let schema = contract.get("schema");

    match schema {
        None => result.add(PatternViolation {
            path: "output_contract.schema".to_string(),
            pattern: "missing".to_string(),
            matched_text: "<missing>".to_string(),
            category: "MISSING_SCHEMA".to_string(),
            severity: Severity::Error,
            fix_suggestion: "Add JSON Schema for output validation".to_string(),
            line_number: None,
        }),
        Some(value) if !value.is_mapping() => result.add(PatternViolation {
            path: "output_contract.schema".to_string(),
            pattern: "invalid_type".to_string(),
            matched_text: type_name(value).to_string(),
            category: "INVALID_SCHEMA".to_string(),
            severity: Severity::Error,
            fix_suggestion: "Schema must be a JSON Schema object".to_string(),
            line_number: None,
        }),
        Some(value) => {
            if value.get("type").is_none() && value.get("$ref").is_none() {
                result.add(PatternViolation {
                    path: "output_contract.schema".to_string(),
                    pattern: "missing_type".to_string(),
                    matched_text: "<no type>".to_string(),
                    category: "INCOMPLETE_SCHEMA".to_string(),
                    severity: Severity::Warning,
                    fix_suggestion: "Add 'type' field to schema".to_string(),
                    line_number: None,
                });
            }
        }
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid regex"));

/// Relaxed quality validation for rendered documentation prose.
///
/// Placeholder tokens are errors; vague language is only a warning here.
#[derive(Debug, Default)]
pub struct DocQualityLayer;

impl DocQualityLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn patterns() -> Vec<ForbiddenPattern> {
        vec![
            ForbiddenPattern::literal(
                "TODO",
                "INCOMPLETE_CONTENT",
                Severity::Error,
                "any",
                "Complete the TODO item",
            ),
            ForbiddenPattern::literal(
                "TBD",
                "INCOMPLETE_CONTENT",
                Severity::Error,
                "any",
                "Determine and specify the content",
            ),
            ForbiddenPattern::literal(
                "FIXME",
                "INCOMPLETE_CONTENT",
                Severity::Error,
                "any",
                "Fix the issue before publishing",
            ),
            ForbiddenPattern::literal(
                "as needed",
                "VAGUE_LANGUAGE",
                Severity::Warning,
                "instruction",
                "Consider being more specific",
            ),
            ForbiddenPattern::literal(
                "if appropriate",
                "VAGUE_LANGUAGE",
                Severity::Warning,
                "instruction",
                "Consider defining criteria",
            ),
            ForbiddenPattern::regex(
                r"##\s+\w+\s*\n\s*\n##",
                "EMPTY_SECTION",
                Severity::Warning,
                "structure",
                "Add content to the section",
            ),
        ]
    }

    /// Validate rendered document content.
    #[must_use]
    pub fn check(&self, content: &str) -> QualityResult {
        let mut result = QualityResult::new();

        let stripped = INLINE_CODE
            .replace_all(&FENCED_CODE.replace_all(content, ""), "")
            .into_owned();

        for pattern in Self::patterns() {
            if let Some(matched) = pattern.find(&stripped) {
                result.add(PatternViolation {
                    path: "document".to_string(),
                    pattern: pattern.pattern.clone(),
                    matched_text: matched.clone(),
                    category: pattern.category.clone(),
                    severity: pattern.severity,
                    fix_suggestion: pattern.fix.clone(),
                    line_number: find_line(content, &matched),
                });
            }
        }

        result
    }
}

fn find_line(content: &str, matched: &str) -> Option<usize> {
    let needle = matched.to_ascii_lowercase();
    content
        .lines()
        .position(|line| line.to_ascii_lowercase().contains(&needle))
        .map(|i| i + 1)
}
