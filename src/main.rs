// declcheck: check and re-emit namespaced struct declarations

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use declcheck::config::CheckOptions;
use declcheck::emit::{emit_source, emit_symbols, emit_tree};
use declcheck::logging::{init_logging, LogLevel};
use declcheck::parser::ast::SourceLocation;
use declcheck::pipeline::{check_bytes, CheckOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Declarations re-emitted in header layout
    Source,
    /// Indented declaration tree
    Tree,
    /// Resolved types with folded field values
    Symbols,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Check a declaration file and re-emit it
#[derive(Debug, Parser)]
#[command(name = "declcheck", version, about)]
struct Cli {
    /// Declaration source file
    input: PathBuf,

    /// What to print after checking
    #[arg(long, value_enum, default_value_t = Emit::Source)]
    emit: Emit,

    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the emission to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with check options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject references to types declared later in the file
    #[arg(long)]
    no_forward_refs: bool,

    /// Do not check folded constants against their type's range
    #[arg(long)]
    no_range_checks: bool,

    /// Report warnings as errors
    #[arg(long)]
    warnings_as_errors: bool,

    /// Stop reporting after this many diagnostics
    #[arg(long)]
    max_diagnostics: Option<usize>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

impl Cli {
    fn options(&self) -> anyhow::Result<CheckOptions> {
        let mut options = match &self.config {
            Some(path) => CheckOptions::from_file(path)?,
            None => CheckOptions::default(),
        };

        if self.no_forward_refs {
            options.allow_forward_references = false;
        }
        if self.no_range_checks {
            options.range_checks = false;
        }
        if self.warnings_as_errors {
            options.warnings_as_errors = true;
        }
        if self.max_diagnostics.is_some() {
            options.max_diagnostics = self.max_diagnostics;
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the input checked without errors. Only configuration
/// and output failures are errors here.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let options = cli.options()?;

    // Read failures go through the same report as parse errors
    let output = match fs::read(&cli.input) {
        Ok(bytes) => {
            tracing::info!(
                target: "pipeline",
                input = %cli.input.display(),
                bytes = bytes.len(),
                "checking"
            );
            check_bytes(&bytes, &options)
        }
        Err(err) => CheckOutput::unreadable(
            format!("failed to read {}: {}", cli.input.display(), err),
            SourceLocation::new(1, 1),
        ),
    };

    report(&cli.input, &output, cli.format)?;

    let emitted = match cli.emit {
        Emit::Source => Some(emit_source(&output.unit)),
        Emit::Tree => Some(emit_tree(&output.unit)),
        Emit::Symbols => Some(emit_symbols(&output.symbols)),
        Emit::None => None,
    };
    if let Some(text) = emitted {
        match &cli.output {
            Some(path) => fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => print!("{}", text),
        }
    }

    tracing::info!(
        target: "pipeline",
        errors = output.error_count(),
        diagnostics = output.diagnostics.len(),
        "done"
    );
    Ok(!output.has_errors())
}

/// Diagnostics go to stderr in either format
fn report(input: &std::path::Path, output: &CheckOutput, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Text => {
            for diag in &output.diagnostics {
                eprintln!("{}: {}", input.display(), diag);
            }
            if !output.diagnostics.is_empty() {
                eprintln!(
                    "{} error(s), {} warning(s)",
                    output.error_count(),
                    output.diagnostics.len() - output.error_count()
                );
            }
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(&output.diagnostics)
                .context("failed to serialize diagnostics")?;
            eprintln!("{}", json);
        }
    }
    Ok(())
}
