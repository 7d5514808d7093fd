//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, ValueEnum};

use crate::i18n::{I18nContext, Locale, PatternLanguages};

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "skillspec",
    version,
    about = "Validate skill specifications and keep generated docs in sync",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: commands::Commands,

    /// Locale for report and status messages
    #[arg(long, global = true, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Forbidden-pattern languages to load
    #[arg(long, global = true, value_enum, default_value_t = PatternLanguages::Union)]
    pub patterns: PatternLanguages,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// The locale settings threaded into command implementations.
    #[must_use]
    pub const fn i18n(&self) -> I18nContext {
        I18nContext {
            report_locale: self.locale,
            patterns: self.patterns,
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
