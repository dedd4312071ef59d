//! sheetrange CLI - export an Excel worksheet range to JSON
//!
//! Reads one range of one sheet, keeps formulas as text, and writes a JSON
//! object keyed by cell coordinate.

use clap::Parser;
use colored::*;
use sheetrange::{ExportConfig, RangeExporter};
use std::path::PathBuf;

/// Export a worksheet range to JSON
#[derive(Parser)]
#[command(
    name = "sheetrange",
    author = "iyulab",
    version,
    about = "Export an Excel worksheet range to JSON",
    long_about = "sheetrange - export a rectangular range of an Excel worksheet to JSON.\n\n\
                  Formulas are written as text (never evaluated) and empty cells as null."
)]
struct Cli {
    /// Workbook to read (.xlsx, .xlsm, .xltx, .xltm)
    #[arg(short, long, env = "SHEETRANGE_INPUT")]
    input: PathBuf,

    /// Sheet name (exact, case-sensitive)
    #[arg(short, long, env = "SHEETRANGE_SHEET")]
    sheet: String,

    /// Cell range, e.g. A1:U182
    #[arg(short, long, env = "SHEETRANGE_RANGE")]
    range: String,

    /// JSON file to create or replace
    #[arg(short, long, env = "SHEETRANGE_OUTPUT")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> sheetrange::Result<()> {
    let config = ExportConfig::new(&cli.input, &cli.sheet, &cli.range, &cli.output);
    let report = RangeExporter::new(config).export()?;

    tracing::info!(cells = report.cells, range = %report.range, "export finished");
    println!(
        "{} Converted range '{}' from '{}' to '{}'",
        "✓".green().bold(),
        cli.range,
        report.sheet,
        report.output.display()
    );
    Ok(())
}
