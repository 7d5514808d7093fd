//! Field-path grammar and scan-scope configuration.
//!
//! Paths address string leaves of a spec document with dot/bracket syntax
//! (`inputs[2].name`). Patterns add a single-level `[*]` wildcard that
//! matches any list index (`steps[*].action`). Patterns are compiled once
//! at load time, not re-translated per call.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::Result;

/// One segment of a field path.
#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    AnyIndex,
}

fn parse_segments(raw: &str, allow_wildcard: bool) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    for part in raw.split('.') {
        let bracket = part.find('[');
        let key = bracket.map_or(part, |i| &part[..i]);
        if key.is_empty() {
            return None;
        }
        segments.push(Segment::Key(key.to_string()));

        if let Some(i) = bracket {
            let mut rest = &part[i..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let end = stripped.find(']')?;
                let token = &stripped[..end];
                if token == "*" {
                    if !allow_wildcard {
                        return None;
                    }
                    segments.push(Segment::AnyIndex);
                } else {
                    segments.push(Segment::Index(token.parse().ok()?));
                }
                rest = &stripped[end + 1..];
            }
            if !rest.is_empty() {
                return None;
            }
        }
    }
    if segments.is_empty() { None } else { Some(segments) }
}

/// A compiled field-path pattern with optional `[*]` wildcards.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPattern {
    /// Compile a pattern like `steps[*].action`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        parse_segments(raw, true).map(|segments| Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The source text the pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a concrete path (no wildcards) against this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let Some(concrete) = parse_segments(path, false) else {
            return false;
        };
        if concrete.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&concrete)
            .all(|(pattern, actual)| match (pattern, actual) {
                (Segment::Key(a), Segment::Key(b)) => a == b,
                (Segment::Index(a), Segment::Index(b)) => a == b,
                (Segment::AnyIndex, Segment::Index(_)) => true,
                _ => false,
            })
    }
}

/// Look up a concrete dot/bracket path inside a YAML value.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_segments(path, false)?;
    let mut current = root;
    for segment in &segments {
        current = match segment {
            Segment::Key(key) => current.get(key.as_str())?,
            Segment::Index(i) => current.as_sequence()?.get(*i)?,
            Segment::AnyIndex => return None,
        };
    }
    Some(current)
}

/// Scan priority attached to a selected field.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPriority {
    High,
    #[default]
    Medium,
    Low,
}

/// Reporting thresholds carried alongside the scan scope.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub max_errors: usize,
    #[serde(default = "default_max_warnings")]
    pub max_warnings: usize,
}

const fn default_max_warnings() -> usize {
    10
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_errors: 0,
            max_warnings: default_max_warnings(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScannedFieldDef {
    path: String,
    #[serde(default)]
    #[allow(dead_code)]
    priority: Option<ScanPriority>,
}

#[derive(Debug, Deserialize)]
struct IgnoredFieldDef {
    path: String,
}

#[derive(Debug, Deserialize)]
struct IgnorePatternDef {
    pattern: String,
}

#[derive(Debug, Default, Deserialize)]
struct ScanScopeFile {
    #[serde(default)]
    scanned_fields: Vec<ScannedFieldDef>,
    #[serde(default)]
    ignored_fields: Vec<IgnoredFieldDef>,
    #[serde(default)]
    ignore_patterns: Vec<IgnorePatternDef>,
    #[serde(default)]
    thresholds: Thresholds,
}

/// Which string leaves of the spec tree the pattern scan covers.
#[derive(Debug, Clone)]
pub struct ScanScope {
    scanned: Vec<FieldPattern>,
    ignored: BTreeSet<String>,
    strip: Vec<Regex>,
    pub thresholds: Thresholds,
}

impl ScanScope {
    /// Load a scan scope from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ScanScopeFile = serde_yaml::from_str(&content)?;
        Ok(Self::from_parts(file))
    }

    fn from_parts(file: ScanScopeFile) -> Self {
        let scanned = file
            .scanned_fields
            .iter()
            .filter_map(|f| {
                let pattern = FieldPattern::parse(&f.path);
                if pattern.is_none() {
                    tracing::warn!(path = %f.path, "skipping malformed scan path");
                }
                pattern
            })
            .collect();
        let ignored = file
            .ignored_fields
            .into_iter()
            .map(|f| f.path)
            .collect();
        let strip = file
            .ignore_patterns
            .iter()
            .filter_map(|p| {
                let regex = Regex::new(&p.pattern);
                if regex.is_err() {
                    tracing::warn!(pattern = %p.pattern, "skipping invalid strip regex");
                }
                regex.ok()
            })
            .collect();

        Self {
            scanned,
            ignored,
            strip,
            thresholds: file.thresholds,
        }
    }

    /// Whether a subtree rooted at `path` is excluded from scanning.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.contains(path)
    }

    /// Whether a string leaf at `path` should be scanned.
    ///
    /// With no configured field patterns every string leaf is in scope.
    #[must_use]
    pub fn is_scanned(&self, path: &str) -> bool {
        if self.scanned.is_empty() {
            return true;
        }
        self.scanned.iter().any(|p| p.matches(path))
    }

    /// Remove code spans and other stripped regions before pattern matching.
    #[must_use]
    pub fn strip_code(&self, text: &str) -> String {
        let mut result = text.to_string();
        for regex in &self.strip {
            result = regex.replace_all(&result, "").into_owned();
        }
        result
    }
}

impl Default for ScanScope {
    fn default() -> Self {
        Self::from_parts(ScanScopeFile {
            scanned_fields: vec![
                ScannedFieldDef {
                    path: "steps[*].action".to_string(),
                    priority: Some(ScanPriority::High),
                },
                ScannedFieldDef {
                    path: "skill.purpose".to_string(),
                    priority: Some(ScanPriority::High),
                },
                ScannedFieldDef {
                    path: "inputs[*].description".to_string(),
                    priority: Some(ScanPriority::Medium),
                },
            ],
            ignored_fields: vec![
                IgnoredFieldDef {
                    path: "spec_version".to_string(),
                },
                IgnoredFieldDef {
                    path: "skill.name".to_string(),
                },
                IgnoredFieldDef {
                    path: "skill.version".to_string(),
                },
            ],
            ignore_patterns: vec![
                IgnorePatternDef {
                    pattern: r"```[\s\S]*?```".to_string(),
                },
                IgnorePatternDef {
                    pattern: r"`[^`]+`".to_string(),
                },
            ],
            thresholds: Thresholds::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_wildcard_matches_any_index() {
        let pattern = FieldPattern::parse("steps[*].action").unwrap();
        assert!(pattern.matches("steps[0].action"));
        assert!(pattern.matches("steps[17].action"));
        assert!(!pattern.matches("steps[0].output"));
        assert!(!pattern.matches("steps[0].action.extra"));
        assert!(!pattern.matches("inputs[0].action"));
    }

    #[test]
    fn test_pattern_literal_segments() {
        let pattern = FieldPattern::parse("skill.purpose").unwrap();
        assert!(pattern.matches("skill.purpose"));
        assert!(!pattern.matches("skill.name"));
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        assert!(FieldPattern::parse("").is_none());
        assert!(FieldPattern::parse("steps[").is_none());
        assert!(FieldPattern::parse("steps[x]").is_none());
    }

    #[test]
    fn test_lookup_descends_mappings_and_lists() {
        let value: Value = serde_yaml::from_str(
            r#"
inputs:
  - name: first
  - name: second
skill:
  purpose: do things
"#,
        )
        .unwrap();
        assert_eq!(
            lookup(&value, "inputs[1].name").and_then(Value::as_str),
            Some("second")
        );
        assert_eq!(
            lookup(&value, "skill.purpose").and_then(Value::as_str),
            Some("do things")
        );
        assert!(lookup(&value, "inputs[5].name").is_none());
        assert!(lookup(&value, "missing.key").is_none());
    }

    #[test]
    fn test_default_scope_strips_code_spans() {
        let scope = ScanScope::default();
        let text = "Run the check.\n```bash\ntry to do it as needed\n```\nUse `as needed` carefully.";
        let stripped = scope.strip_code(text);
        assert!(!stripped.contains("try to"));
        assert!(!stripped.contains("as needed"));
    }

    #[test]
    fn test_default_scope_selects_configured_fields() {
        let scope = ScanScope::default();
        assert!(scope.is_scanned("steps[2].action"));
        assert!(scope.is_scanned("skill.purpose"));
        assert!(!scope.is_scanned("failure_modes[0].description"));
        assert!(scope.is_ignored("skill.name"));
    }
}
