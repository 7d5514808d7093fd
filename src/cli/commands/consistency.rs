//! skillspec check-consistency - verify a document's generated blocks can
//! be reproduced from the current spec.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::cli::output::{emit_json, print_section, print_status};
use crate::cli::{Cli, OutputFormat};
use crate::i18n::translate;
use crate::render;
use crate::validate::{ConsistencyLayer, Severity};

use super::load_spec;

#[derive(Args, Debug)]
pub struct CheckConsistencyArgs {
    /// Path to the spec file
    pub spec: PathBuf,

    /// Rendered document (defaults to SKILL.md beside the spec)
    pub doc: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(cli: &Cli, args: &CheckConsistencyArgs) -> Result<ExitCode> {
    let spec = load_spec(&args.spec, cli)?;

    let doc_path = args.doc.clone().unwrap_or_else(|| {
        args.spec
            .parent()
            .map_or_else(|| PathBuf::from("SKILL.md"), |dir| dir.join("SKILL.md"))
    });
    if !doc_path.exists() {
        bail!(
            "{} not found. Run 'skillspec generate' first.",
            doc_path.display()
        );
    }
    let document = std::fs::read_to_string(&doc_path)
        .with_context(|| format!("read {}", doc_path.display()))?;

    let fresh = render::skill_md(&spec);
    let result = ConsistencyLayer::new().check_document(&document, &fresh);

    match args.format {
        OutputFormat::Json => emit_json(&result)?,
        OutputFormat::Text => {
            let key = if result.valid {
                "cli.consistency_passed"
            } else {
                "cli.consistency_failed"
            };
            println!();
            print_status(result.valid, &translate(key, cli.locale, &[]));
            println!("  Generated blocks checked: {}", result.blocks_checked);

            if result.issues.is_empty() {
                println!("  All generated blocks are up-to-date with the spec");
            } else {
                println!();
                print_section(Severity::Warning, "Inconsistencies found:");
                for issue in &result.issues {
                    println!("  - {}: {}", issue.source, issue.description);
                }
                println!();
                println!("Run 'skillspec generate' to update generated blocks.");
            }
        }
    }

    Ok(if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
