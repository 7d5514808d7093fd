//! Message localization.
//!
//! A deliberately small surface: a [`Locale`], an [`I18nContext`] carried by
//! value into whatever needs localized text, and a pure [`translate`] lookup
//! over a built-in catalog. There is no process-wide locale state.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported message locales.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Zh => write!(f, "zh"),
        }
    }
}

/// Which forbidden-pattern languages to load.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PatternLanguages {
    En,
    Zh,
    #[default]
    Union,
}

impl PatternLanguages {
    /// Language codes to load pattern files for, in load order.
    #[must_use]
    pub fn codes(self) -> Vec<&'static str> {
        match self {
            PatternLanguages::En => vec!["en"],
            PatternLanguages::Zh => vec!["zh"],
            PatternLanguages::Union => vec!["en", "zh"],
        }
    }
}

/// Locale settings threaded explicitly through the CLI layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct I18nContext {
    /// Locale for report and status messages.
    pub report_locale: Locale,
    /// Which forbidden-pattern files to load.
    pub patterns: PatternLanguages,
}

/// Look up a message by key and interpolate `{name}` placeholders.
///
/// Unknown keys fall back to the key itself so a missing catalog entry is
/// visible rather than silent.
#[must_use]
pub fn translate(key: &str, locale: Locale, args: &[(&str, &str)]) -> String {
    let template = catalog_lookup(key, locale)
        .or_else(|| catalog_lookup(key, Locale::En))
        .unwrap_or(key);

    let mut message = template.to_string();
    for (name, value) in args {
        message = message.replace(&format!("{{{name}}}"), value);
    }
    message
}

fn catalog_lookup(key: &str, locale: Locale) -> Option<&'static str> {
    match locale {
        Locale::En => match key {
            "cli.spec_not_found" => Some("Spec file '{path}' not found"),
            "cli.validation_passed" => Some("Validation PASSED: {name}"),
            "cli.validation_failed" => Some("Validation FAILED: {name}"),
            "cli.generated" => Some("Generated: {path}"),
            "cli.preserved_blocks" => Some("Preserved {count} manual block(s)"),
            "cli.consistency_passed" => Some("Consistency Check: PASSED"),
            "cli.consistency_failed" => Some("Consistency Check: FAILED"),
            _ => None,
        },
        Locale::Zh => match key {
            "cli.spec_not_found" => Some("未找到规格文件 '{path}'"),
            "cli.validation_passed" => Some("校验通过: {name}"),
            "cli.validation_failed" => Some("校验失败: {name}"),
            "cli.generated" => Some("已生成: {path}"),
            "cli.preserved_blocks" => Some("已保留 {count} 个手工区块"),
            "cli.consistency_passed" => Some("一致性检查: 通过"),
            "cli.consistency_failed" => Some("一致性检查: 失败"),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_interpolates_args() {
        let msg = translate("cli.preserved_blocks", Locale::En, &[("count", "3")]);
        assert_eq!(msg, "Preserved 3 manual block(s)");
    }

    #[test]
    fn test_translate_falls_back_to_english() {
        // A key present in en but (hypothetically) missing in zh still resolves.
        let msg = translate("cli.generated", Locale::Zh, &[("path", "SKILL.md")]);
        assert!(msg.contains("SKILL.md"));
    }

    #[test]
    fn test_translate_unknown_key_returns_key() {
        assert_eq!(translate("no.such.key", Locale::En, &[]), "no.such.key");
    }

    #[test]
    fn test_pattern_languages_union() {
        assert_eq!(PatternLanguages::Union.codes(), vec!["en", "zh"]);
        assert_eq!(PatternLanguages::En.codes(), vec!["en"]);
    }
}
