//! skillspec validate - run the layered validation pipeline on a spec.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::cli::output::{emit_json, print_section, print_status};
use crate::cli::{Cli, OutputFormat};
use crate::i18n::translate;
use crate::validate::{Severity, ValidationEngine, ValidationResult};

use super::{load_spec, spec_display_name};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the spec file
    pub spec: PathBuf,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Compliance policy file (repeatable, additive)
    #[arg(long = "policy", value_name = "FILE")]
    pub policies: Vec<PathBuf>,

    /// Directory holding forbidden-pattern and scan-scope files
    #[arg(long, value_name = "DIR")]
    pub patterns_dir: Option<PathBuf>,

    /// Supplementary JSON-Schema document
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(cli: &Cli, args: &ValidateArgs) -> Result<ExitCode> {
    let spec = load_spec(&args.spec, cli)?;
    let name = spec_display_name(&spec, &args.spec);

    let mut engine = ValidationEngine::new().with_languages(cli.patterns.codes());
    if let Some(dir) = &args.patterns_dir {
        engine = engine.with_patterns_dir(dir);
    }
    if let Some(schema) = &args.schema {
        engine = engine.with_schema_path(schema);
    }
    for policy in &args.policies {
        engine = engine.with_policy_file(policy);
    }

    let result = engine.validate(&spec, args.strict);

    match args.format {
        OutputFormat::Json => emit_json(&result)?,
        OutputFormat::Text => print_validation_result(cli, &result, &name),
    }

    Ok(if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_validation_result(cli: &Cli, result: &ValidationResult, name: &str) {
    let key = if result.valid {
        "cli.validation_passed"
    } else {
        "cli.validation_failed"
    };
    println!();
    print_status(result.valid, &translate(key, cli.locale, &[("name", name)]));
    println!();

    if !result.schema.errors.is_empty() {
        print_section(Severity::Error, "Schema Errors:");
        for error in &result.schema.errors {
            println!("  - {error}");
        }
        println!();
    }

    let quality_errors: Vec<_> = result
        .quality
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .collect();
    let quality_warnings: Vec<_> = result
        .quality
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .collect();

    if !quality_errors.is_empty() {
        print_section(Severity::Error, "Quality Errors:");
        for violation in quality_errors {
            println!(
                "  [{}] {}: '{}'",
                violation.path, violation.category, violation.matched_text
            );
            println!("    Fix: {}", violation.fix_suggestion);
        }
        println!();
    }

    if !quality_warnings.is_empty() {
        print_section(Severity::Warning, "Quality Warnings:");
        for violation in quality_warnings {
            println!(
                "  [{}] {}: '{}'",
                violation.path, violation.category, violation.matched_text
            );
        }
        println!();
    }

    if !result.coverage.gaps.is_empty() {
        print_section(Severity::Warning, "Coverage Gaps:");
        for gap in &result.coverage.gaps {
            print_section(
                gap.severity,
                &format!("  [{}] {}: {}", gap.gap_type, gap.item, gap.description),
            );
        }
        println!();
    }

    if !result.consistency.issues.is_empty() {
        print_section(Severity::Warning, "Consistency Issues:");
        for issue in &result.consistency.issues {
            println!("  {} -> {}: {}", issue.source, issue.target, issue.description);
        }
        println!();
    }

    if let Some(compliance) = &result.compliance {
        if !compliance.violations.is_empty() {
            print_section(Severity::Error, "Compliance Violations:");
            for violation in &compliance.violations {
                println!(
                    "  [{}/{}] {}: {}",
                    violation.policy, violation.rule_id, violation.predicate, violation.message
                );
            }
            println!();
        }
    }

    println!("{}", "-".repeat(40));
    println!("Errors: {}", result.total_errors);
    println!("Warnings: {}", result.total_warnings);
    println!(
        "Structural Coverage: {}%",
        result.coverage.metrics.structural_score
    );
    println!(
        "Behavioral Coverage: {}%",
        result.coverage.metrics.behavioral_score
    );
    if let Some(compliance) = &result.compliance {
        println!(
            "Compliance: {} passed, {} failed ({} policies)",
            compliance.rules_passed, compliance.rules_failed, compliance.policies_applied
        );
    }
}
