//! CLI command implementations.
//!
//! Each subcommand has its own module with an Args struct and a `run()`
//! function.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_yaml::Value;

use crate::cli::Cli;
use crate::i18n::translate;

pub mod consistency;
pub mod generate;
pub mod validate;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a skill spec
    Validate(validate::ValidateArgs),

    /// Generate the skill document from a spec, preserving manual blocks
    Generate(generate::GenerateArgs),

    /// Check that a document's generated blocks match the current spec
    CheckConsistency(consistency::CheckConsistencyArgs),
}

pub fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Validate(args) => validate::run(cli, args),
        Commands::Generate(args) => generate::run(cli, args),
        Commands::CheckConsistency(args) => consistency::run(cli, args),
    }
}

/// Read and parse a spec file, failing with a localized message when it is
/// missing or unreadable.
pub(crate) fn load_spec(path: &Path, cli: &Cli) -> Result<Value> {
    if !path.exists() {
        bail!(
            "{}",
            translate(
                "cli.spec_not_found",
                cli.locale,
                &[("path", &path.display().to_string())]
            )
        );
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let spec: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parse {}", path.display()))?;
    if spec.is_null() {
        bail!("spec file is empty: {}", path.display());
    }
    Ok(spec)
}

/// Display name for a spec path: the skill name when present, the file
/// stem otherwise.
pub(crate) fn spec_display_name(spec: &Value, path: &Path) -> String {
    spec.get("skill")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map_or_else(
            || {
                path.file_stem()
                    .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
            },
            ToString::to_string,
        )
}
