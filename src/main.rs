use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use extract_street_addresses::{
    count_elements_in_file, parse_file, write_records, ConfigError, CorrectionTables, CsvSink,
    Diagnostics, JsonLinesSink, ParseError, ReconcileSummary, RecordSink, SinkError,
    StreetNormalizer,
};
use log::info;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Sink(#[from] SinkError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("no .osm files found in {0:?}")]
    NoInput(PathBuf),
    #[error("multiple .osm files found in {0:?}; pass --input explicitly")]
    AmbiguousInput(PathBuf),
    #[error("failed to inspect {path:?}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report to {path:?}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(
    name = "extract_street_addresses",
    about = "Extract and clean addresses from an OpenStreetMap XML export",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse nodes and ways, normalize their streets and write the records.
    Parse(ParseArgs),
    /// Count every element in the document by tag name.
    CountTags(CountTagsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Jsonl,
}

impl OutputFormat {
    fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jsonl" | "json") => Self::Jsonl,
            _ => Self::Csv,
        }
    }
}

#[derive(Debug, clap::Args)]
struct ParseArgs {
    /// Path to a .osm file. Defaults to the only .osm in the current folder.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// Output path.
    #[arg(long, value_name = "FILE", default_value = "addresses.csv")]
    output: PathBuf,
    /// Output format; inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// TOML file overriding the built-in correction tables.
    #[arg(long, value_name = "FILE")]
    corrections: Option<PathBuf>,
    /// Write run diagnostics as JSON to this path.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct CountTagsArgs {
    /// Path to a .osm file. Defaults to the only .osm in the current folder.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    records: usize,
    reconcile: &'a ReconcileSummary,
    diagnostics: &'a Diagnostics,
}

fn find_default_osm(folder: &Path) -> Result<PathBuf> {
    let inspect = |source| CliError::Inspect {
        path: folder.to_path_buf(),
        source,
    };
    let mut osm_files = Vec::new();
    for entry in folder.read_dir().map_err(inspect)? {
        let path = entry.map_err(inspect)?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("osm") {
            osm_files.push(path);
        }
    }
    osm_files.sort();

    match osm_files.len() {
        0 => Err(CliError::NoInput(folder.to_path_buf())),
        1 => Ok(osm_files.remove(0)),
        _ => Err(CliError::AmbiguousInput(folder.to_path_buf())),
    }
}

fn resolve_input(input: Option<PathBuf>) -> Result<PathBuf> {
    match input {
        Some(path) => Ok(path),
        None => {
            let cwd = env::current_dir().map_err(|source| CliError::Inspect {
                path: PathBuf::from("."),
                source,
            })?;
            find_default_osm(&cwd)
        }
    }
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let input = resolve_input(args.input)?;
    let tables = match &args.corrections {
        Some(path) => CorrectionTables::load(path)?,
        None => CorrectionTables::default(),
    };
    let normalizer = StreetNormalizer::new(tables);

    info!("Parsing {}", input.display());
    let output = parse_file(&input, &normalizer)?;
    output.diagnostics.log_summary();

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::infer(&args.output));
    let mut sink: Box<dyn RecordSink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::from_path(&args.output)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::from_path(&args.output)?),
    };
    let written = write_records(&output.records, sink.as_mut())?;
    info!("Wrote {written} records to {}", args.output.display());

    if let Some(path) = &args.report {
        let report = Report {
            records: output.records.len(),
            reconcile: &output.reconcile,
            diagnostics: &output.diagnostics,
        };
        let file = File::create(path).map_err(SinkError::from)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report).map_err(|source| {
            CliError::Report {
                path: path.clone(),
                source,
            }
        })?;
    }

    Ok(())
}

fn run_count_tags(args: CountTagsArgs) -> Result<()> {
    let input = resolve_input(args.input)?;
    for (name, count) in count_elements_in_file(&input)? {
        println!("{name}\t{count}");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Command::Parse(args) => run_parse(args),
        Command::CountTags(args) => run_count_tags(args),
    }
}
