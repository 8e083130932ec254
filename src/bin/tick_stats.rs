//! CLI for computing per-symbol tick statistics from a tick file.
//!
//! # Usage
//!
//! ```bash
//! # Summary on stdout, fixed-width report to data.csv
//! cargo run --release --bin tick_stats -- scandi.csv --output data.csv
//!
//! # First 80k lines only, plus a JSON report and warning log
//! cargo run --release --bin tick_stats -- scandi.csv \
//!     --limit 80000 --json report.json --warnings warnings.json
//!
//! # Stop at the first undecodable line
//! cargo run --release --bin tick_stats -- scandi.csv --strict
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use tick_ledger::report;
use tick_ledger::{
    DuplicateQuotePolicy, LedgerConfig, LedgerTable, Record, Result, TickFileLoader,
    WarningTracker,
};

/// Per-symbol trade interval, tick interval and spread statistics.
#[derive(Parser, Debug)]
#[command(name = "tick_stats", version)]
struct Cli {
    /// Comma-delimited tick file
    input: PathBuf,

    /// Where to write the fixed-width report
    #[arg(short, long, default_value = "data.csv")]
    output: PathBuf,

    /// Also write a JSON report here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Export warnings (decode failures, invalid records, ordering violations) as JSON
    #[arg(long)]
    warnings: Option<PathBuf>,

    /// Read at most this many lines
    #[arg(short, long)]
    limit: Option<u64>,

    /// Fail on the first undecodable line or invalid record instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Ingest symbols on a thread pool
    #[arg(long)]
    parallel: bool,

    /// Keep the previous quote baseline when a quote repeats its price
    #[arg(long)]
    keep_duplicate_baseline: bool,
}

impl Cli {
    fn ledger_config(&self) -> LedgerConfig {
        let policy = if self.keep_duplicate_baseline {
            DuplicateQuotePolicy::KeepBaseline
        } else {
            DuplicateQuotePolicy::RefreshBaseline
        };
        LedgerConfig::default().with_duplicate_quote_policy(policy)
    }
}

fn run(cli: &Cli) -> Result<LedgerTable> {
    let config = cli.ledger_config();
    let loader = TickFileLoader::new(&cli.input)?
        .skip_invalid(!cli.strict)
        .limit(cli.limit);

    log::info!("Started reading {}", cli.input.display());
    let mut records = loader.iter_records()?;
    let mut rejected = WarningTracker::new();

    // Invalid records end a strict run; otherwise they are skipped and noted.
    let mut screen = |record: &Record| -> Result<bool> {
        match record.validate() {
            Ok(()) => Ok(true),
            Err(e) if cli.strict => Err(e),
            Err(e) => {
                log::warn!("Skipping record: {e}");
                rejected.record_invalid_record(record, &e);
                Ok(false)
            }
        }
    };

    let mut table = if cli.parallel {
        let mut batch = Vec::new();
        for record in records.by_ref() {
            if screen(&record)? {
                batch.push(record);
            }
        }
        LedgerTable::from_records_parallel(config, batch)?
    } else {
        let mut table = LedgerTable::with_config(config);
        for record in records.by_ref() {
            if screen(&record)? {
                table.process(&record)?;
            }
        }
        table
    };

    if let Some(err) = records.take_error() {
        return Err(err);
    }

    let stats = records.stats().clone();
    log::info!(
        "Finished reading: {} lines, {} accepted, {} filtered, {} rejected",
        stats.lines_read,
        stats.records_accepted,
        stats.records_filtered,
        stats.lines_rejected
    );
    table.absorb_warnings(records.into_warnings());
    table.absorb_warnings(rejected);

    Ok(table)
}

fn write_outputs(cli: &Cli, table: &LedgerTable) -> Result<()> {
    report::save_report(&cli.output, &table.snapshot())?;

    if let Some(path) = &cli.json {
        report::save_json(path, table)?;
    }

    if let Some(path) = &cli.warnings {
        table.warnings().export_to_file(path)?;
        log::info!(
            "Exported {} warnings to {}",
            table.warnings().len(),
            path.display()
        );
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    let table = match run(&cli) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    print!("{}", report::summary(&table));

    if table.stats().violations > 0 {
        log::warn!(
            "{} out-of-order records; their intervals were skipped",
            table.stats().violations
        );
    }

    if let Err(e) = write_outputs(&cli, &table) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!(
        "Execution time: {} milliseconds",
        start_time.elapsed().as_millis()
    );
}
