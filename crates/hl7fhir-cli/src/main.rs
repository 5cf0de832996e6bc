//! HL7 v2 to FHIR command-line interface

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use hl7fhir::{Catalog, ConvertOptions, Converter, tokenize};
use std::path::PathBuf;
use std::process::ExitCode;

/// HL7 v2 to FHIR command-line tool
#[derive(Parser)]
#[command(name = "hl7fhir")]
#[command(author, version, about = "HL7 v2.x to FHIR R4 conversion tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HL7 v2 message file to a FHIR transaction bundle
    Convert {
        /// Message file to convert
        file: PathBuf,
        /// Terminology JSON file (default: embedded ANS catalog)
        #[arg(short, long)]
        terminology: Option<PathBuf>,
        /// Pretty-print the bundle JSON
        #[arg(short, long)]
        pretty: bool,
        /// Emit a partial bundle when the message has no PID segment
        #[arg(long)]
        allow_partial: bool,
    },
    /// Tokenize a message and dump its segments and fields
    Inspect {
        /// Message file to inspect
        file: PathBuf,
    },
    /// Validate a terminology JSON file and print table statistics
    Terminology {
        /// Terminology JSON file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Convert {
            file,
            terminology,
            pretty,
            allow_partial,
        } => convert(&file, terminology.as_deref(), pretty, allow_partial),
        Commands::Inspect { file } => inspect(&file),
        Commands::Terminology { file } => terminology_stats(&file),
    }
}

fn read_message(file: &std::path::Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn load_catalog(terminology: Option<&std::path::Path>) -> anyhow::Result<Catalog> {
    match terminology {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("loading terminology from {}", path.display())),
        None => Catalog::embedded().context("loading embedded terminology"),
    }
}

fn convert(
    file: &std::path::Path,
    terminology: Option<&std::path::Path>,
    pretty: bool,
    allow_partial: bool,
) -> anyhow::Result<ExitCode> {
    let raw = read_message(file)?;
    let catalog = load_catalog(terminology)?;
    let converter = Converter::with_options(ConvertOptions {
        require_patient: !allow_partial,
    });

    let outcome = converter.convert(&raw, &catalog);
    for warning in &outcome.warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }

    if !outcome.success {
        let kind = outcome.error_kind.as_deref().unwrap_or("unknown");
        let message = outcome.error_message.as_deref().unwrap_or("unknown error");
        eprintln!("{} {kind}: {message}", "error:".red().bold());
        return Ok(ExitCode::FAILURE);
    }

    let bundle = outcome
        .bundle
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("successful conversion produced no bundle"))?;
    let json = if pretty {
        serde_json::to_string_pretty(bundle)?
    } else {
        serde_json::to_string(bundle)?
    };
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn inspect(file: &std::path::Path) -> anyhow::Result<ExitCode> {
    let raw = read_message(file)?;
    let msg = tokenize(&raw).context("tokenizing message")?;

    println!(
        "{} {}^{} control id '{}'",
        "message:".bold(),
        msg.message_type,
        msg.trigger_event,
        msg.control_id
    );
    for segment in &msg.segments {
        println!("{}", segment.name.green().bold());
        for i in 1..=segment.field_count() {
            let value = segment.field_value(i);
            if !value.is_empty() {
                println!("  {}-{i}: {value}", segment.name);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn terminology_stats(file: &std::path::Path) -> anyhow::Result<ExitCode> {
    let catalog = Catalog::from_file(file)
        .with_context(|| format!("loading terminology from {}", file.display()))?;
    let tables = catalog.snapshot();

    println!(
        "{} version {} (updated {})",
        "terminology:".bold(),
        tables.version,
        tables.last_updated
    );
    let counts = [
        ("systems", tables.systems.len()),
        ("oids", tables.oids.len()),
        ("extensions", tables.extensions.len()),
        ("coverage types", tables.coverage_types.len()),
        ("professions", tables.professions.len()),
        ("identifier types", tables.identifiers.len()),
        ("encounter classes", tables.encounter_class.len()),
        ("movement types", tables.movement_types.len()),
    ];
    for (label, count) in counts {
        println!("  {label}: {count}");
    }
    println!("{}", "ok".green().bold());
    Ok(ExitCode::SUCCESS)
}
