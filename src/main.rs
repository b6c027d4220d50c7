// src/main.rs
mod render;
mod storage;
mod theses;
mod utils;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use render::{BandSet, HtmlRenderer};
use theses::SortPolicy;
use utils::AppError;

/// Command Line Interface for the thesis/dissertation HTML builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text file with one 7-line record per thesis/dissertation
    #[arg(default_value = "superdarn_theses.txt")]
    input: PathBuf,

    /// Ordering of the entries (and with it the page navigation)
    #[arg(long, value_enum, default_value_t = SortPolicy::Author)]
    order: SortPolicy,

    /// JSON file replacing the default A-G/H-N/O-U/V-Z bands
    #[arg(long)]
    bands: Option<PathBuf>,

    /// Write the fragment to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also save a JSON summary of the run
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Fail if the input holds more than this many records
    #[arg(long)]
    max_records: Option<usize>,
}

fn run(args: &Args) -> Result<(), AppError> {
    // 1. Band configuration (only consulted for author order)
    let bands = match &args.bands {
        Some(path) => BandSet::load(path)?,
        None => BandSet::default(),
    };

    // 2. Load records; the file handle is dropped when this block ends
    let mut records = {
        let file = File::open(&args.input).map_err(|source| AppError::FileNotFound {
            path: args.input.clone(),
            source,
        })?;
        theses::load_records(BufReader::new(file), args.max_records)?
    };
    tracing::info!("Loaded {} records from {}", records.len(), args.input.display());

    // 3. Order, then render into memory so failures leave no partial output
    args.order.sort(&mut records);
    let mut fragment = Vec::new();
    let summary = HtmlRenderer::new(args.order, &bands).render(&records, &mut fragment)?;

    // 4. Write results; metadata is serialized before anything touches disk
    let metadata = match &args.metadata {
        Some(path) => Some((path.as_path(), storage::metadata_json(&args.input, args.order, &summary)?)),
        None => None,
    };
    storage::publish(
        &fragment,
        args.output.as_deref(),
        metadata.as_ref().map(|(path, document)| (*path, document.as_str())),
    )?;

    Ok(())
}

fn main() -> ExitCode {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
