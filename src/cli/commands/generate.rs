//! skillspec generate - render a spec into its document, preserving manual
//! blocks across regenerations.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::cli::Cli;
use crate::cli::output::print_warning;
use crate::i18n::translate;
use crate::preserve;
use crate::render;

use super::load_spec;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the spec file
    pub spec: PathBuf,

    /// Output document (defaults to SKILL.md beside the spec)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Overwrite everything, including manual blocks
    #[arg(long)]
    pub force: bool,

    /// Write the document without preservation markers
    #[arg(long)]
    pub no_preserve: bool,
}

pub fn run(cli: &Cli, args: &GenerateArgs) -> Result<ExitCode> {
    let spec = load_spec(&args.spec, cli)?;

    let out = args.out.clone().unwrap_or_else(|| {
        args.spec
            .parent()
            .map_or_else(|| PathBuf::from("SKILL.md"), |dir| dir.join("SKILL.md"))
    });

    let fresh = render::skill_md(&spec);

    let final_content = if out.exists() {
        let existing =
            std::fs::read_to_string(&out).with_context(|| format!("read {}", out.display()))?;

        if args.no_preserve {
            if !args.force {
                bail!("{} already exists. Use --force to overwrite.", out.display());
            }
            fresh
        } else {
            let merged = preserve::reconcile(&existing, &fresh, args.force)
                .with_context(|| format!("merge {}", out.display()))?;

            if merged.manual_blocks_preserved > 0 {
                println!(
                    "{}",
                    translate(
                        "cli.preserved_blocks",
                        cli.locale,
                        &[("count", &merged.manual_blocks_preserved.to_string())]
                    )
                );
            }
            for warning in &merged.warnings {
                print_warning(warning);
            }
            merged.merged
        }
    } else if args.no_preserve {
        fresh
    } else {
        preserve::wrap_generated(&fresh)
    };

    // The merge has fully succeeded by this point; only now touch the file.
    std::fs::write(&out, final_content).with_context(|| format!("write {}", out.display()))?;
    println!(
        "{}",
        translate(
            "cli.generated",
            cli.locale,
            &[("path", &out.display().to_string())]
        )
    );

    Ok(ExitCode::SUCCESS)
}
