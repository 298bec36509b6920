//! CSV to XLSX converter
//!
//! Turns an interim CSV (e.g. a Rolling Stone list) into a single-sheet
//! workbook next to it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use award_scrape::export::csv_to_workbook;

#[derive(Parser, Debug)]
#[command(name = "csv2xlsx", about = "Convert a UTF-8 CSV file into an XLSX workbook")]
struct Args {
    /// Input CSV
    input: PathBuf,

    /// Output workbook; defaults to the input path with an `.xlsx` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "Sheet1")]
    sheet: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("xlsx"));

    let rows = csv_to_workbook(&args.input, &output, &args.sheet)?;
    println!("{} rows written to {}", rows, output.display());
    Ok(())
}
