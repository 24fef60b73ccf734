//! Batch country tagger.
//!
//! Reads a CSV of coordinates and writes it back out with the containing
//! country code appended to each row.

mod tagger;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use countrypip::pip::DEFAULT_DATA_FILE;
use countrypip::{BoundaryStore, PointLocator};

use crate::tagger::{tag_csv, Columns};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "tag")]
#[command(about = "Tag CSV rows with the country containing their coordinates")]
struct Args {
    /// Input CSV file (stdin if omitted)
    input: Option<PathBuf>,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Polygon data file (.gz is decompressed)
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Longitude column name
    #[arg(long, default_value = "lon")]
    lon_column: String,

    /// Latitude column name
    #[arg(long, default_value = "lat")]
    lat_column: String,

    /// Name of the appended column
    #[arg(long, default_value = "country")]
    country_column: String,

    /// Rows resolved per parallel batch
    #[arg(long, default_value = "10000")]
    batch_size: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout may carry the CSV
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = Arc::new(BoundaryStore::new(&args.data_file));
    store
        .data()
        .with_context(|| format!("Failed to load {}", args.data_file.display()))?;
    let locator = PointLocator::new(store);

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} rows ({per_sec})")?,
    );

    let columns = Columns {
        lon: args.lon_column,
        lat: args.lat_column,
        output: args.country_column,
    };

    let stats = tag_csv(input, output, &locator, &columns, args.batch_size, &pb)?;
    pb.finish_and_clear();

    info!(
        "Tagged {} rows: {} matched, {} unmatched, {} invalid",
        stats.rows,
        stats.matched,
        stats.rows - stats.matched - stats.invalid,
        stats.invalid
    );

    Ok(())
}
