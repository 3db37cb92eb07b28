//! Dossier command-line tool.
//!
//! Validates report config documents and binds them against a values file.
//!
//! Usage:
//!   dossier validate report.json --settings dossier.toml
//!   dossier normalize report.json
//!   dossier bind report.json --values values.json
//!   dossier fingerprint report.json --values values.json

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dossier_core::{Binder, StaticValues};
use dossier_schema::{DossierError, DossierResult, ReportConfig, ValidationReport};
use dossier_validate::{ReportValidator, ValidatorSettings};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Dossier: report config validation and binding.
#[derive(Parser)]
#[command(
    name = "dossier",
    about = "Validate and bind report config documents",
    long_about = "Checks report config documents for malformed nodes and dangling\n\
                  references, and binds them against computed values into a render model."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a document and print every issue found.
    Validate {
        document: PathBuf,
        /// TOML file with a [validation] table.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate a document and print it in canonical form.
    Normalize {
        document: PathBuf,
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Bind a document and print the render model.
    Bind {
        document: PathBuf,
        /// JSON file with dataPoints, visualizations, conditions and placeholders.
        #[arg(long)]
        values: Option<PathBuf>,
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Bind a document and print the render model's SHA-256 fingerprint.
    Fingerprint {
        document: PathBuf,
        #[arg(long)]
        values: Option<PathBuf>,
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-check output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate {
            document,
            settings,
            json,
        } => run_validate(&document, settings.as_deref(), json),
        Command::Normalize { document, settings } => run_normalize(&document, settings.as_deref()),
        Command::Bind {
            document,
            values,
            settings,
        } => run_bind(&document, values.as_deref(), settings.as_deref(), Output::Model),
        Command::Fingerprint {
            document,
            values,
            settings,
        } => run_bind(&document, values.as_deref(), settings.as_deref(), Output::Fingerprint),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("dossier: {e}");
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_validate(document: &Path, settings: Option<&Path>, json: bool) -> DossierResult<bool> {
    let validator = load_validator(settings)?;
    let report = match validator.validate_str(&read(document)?) {
        Ok(doc) => {
            info!(document = %doc.name, "document is valid");
            ValidationReport::passed()
        }
        Err(report) => report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.passed {
        println!("{}: valid", document.display());
    } else {
        print_issues(document, &report);
    }
    Ok(report.passed)
}

fn run_normalize(document: &Path, settings: Option<&Path>) -> DossierResult<bool> {
    let validator = load_validator(settings)?;
    match load_document(&validator, document)? {
        Some(doc) => {
            println!("{}", doc.to_json_pretty()?);
            Ok(true)
        }
        None => Ok(false),
    }
}

enum Output {
    Model,
    Fingerprint,
}

fn run_bind(
    document: &Path,
    values: Option<&Path>,
    settings: Option<&Path>,
    output: Output,
) -> DossierResult<bool> {
    let validator = load_validator(settings)?;
    let Some(doc) = load_document(&validator, document)? else {
        return Ok(false);
    };

    let values = match values {
        Some(path) => StaticValues::from_file(path)?,
        None => StaticValues::default(),
    };

    let parallel = validator.settings().parallel;
    let model = Binder::new(Box::new(validator))
        .with_parallel(parallel)
        .bind(&doc, &values)?;

    match output {
        Output::Model => println!("{}", serde_json::to_string_pretty(&model)?),
        Output::Fingerprint => println!("{}", model.fingerprint()?),
    }
    Ok(true)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_validator(settings: Option<&Path>) -> DossierResult<ReportValidator> {
    let settings = match settings {
        Some(path) => ValidatorSettings::from_file(path)?,
        None => ValidatorSettings::default(),
    };
    Ok(ReportValidator::with_settings(settings))
}

fn load_document(validator: &ReportValidator, document: &Path) -> DossierResult<Option<ReportConfig>> {
    match validator.validate_str(&read(document)?) {
        Ok(doc) => Ok(Some(doc)),
        Err(report) => {
            print_issues(document, &report);
            Ok(None)
        }
    }
}

fn read(path: &Path) -> DossierResult<String> {
    std::fs::read_to_string(path).map_err(|e| DossierError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn print_issues(document: &Path, report: &ValidationReport) {
    for issue in &report.issues {
        eprintln!("{}: {issue}", document.display());
    }
    if report.truncated > 0 {
        eprintln!("{}: ... and {} more", document.display(), report.truncated);
    }
    eprintln!(
        "{}: {} issue(s)",
        document.display(),
        report.issues.len() + report.truncated
    );
}
