//! Basic usage example for tick-ledger.
//!
//! Run with: cargo run --example basic_usage

use tick_ledger::report;
use tick_ledger::{decode_line, EventKind, LedgerTable, LineOutcome, Record};

fn main() {
    println!("=================================================================");
    println!("tick-ledger - Basic Usage Example");
    println!("=================================================================\n");

    let mut table = LedgerTable::new();
    println!("✓ Created ledger table\n");

    // Trades for ABC at 0, 10 and 25 seconds
    println!("Processing trades...\n");
    for ts in [0, 10, 25] {
        let trade = Record::new("ABC", EventKind::Trade, ts)
            .with_bid(10.0, 100)
            .with_ask(10.5, 100)
            .with_trade(10.25, 50);
        table.process(&trade).unwrap();
    }

    let abc = table.symbol_snapshot("ABC").unwrap();
    println!("ABC after 3 trades:");
    println!("  Trade intervals: {:?}", table.ledger("ABC").unwrap().trade_intervals());
    println!("  Mean:   {:.2}s", abc.mean_trade_interval);
    println!("  Median: {:.2}s", abc.median_trade_interval);
    println!("  Max:    {:.2}s", abc.max_trade_interval);
    println!();

    // Bid changes for XYZ: 10.0 at t=0, repeat at t=5, 10.5 at t=8
    println!("Processing bid changes...\n");
    for (price, ts) in [(10.0, 0), (10.0, 5), (10.5, 8)] {
        let quote = Record::new("XYZ", EventKind::BidChange, ts)
            .with_bid(price, 100)
            .with_ask(11.0, 100);
        table.process(&quote).unwrap();
    }
    println!(
        "XYZ tick intervals: {:?} (repeated price refreshes the baseline)",
        table.ledger("XYZ").unwrap().tick_intervals()
    );
    println!();

    // Out-of-order trade: reported, interval skipped
    let outcome = table
        .process(&Record::new("ABC", EventKind::Trade, 20))
        .unwrap();
    if let Some(event) = outcome.violation {
        println!("⚠ {event}");
        println!();
    }

    // Decoding raw lines
    println!("Decoding lines...\n");
    let lines = [
        "DEF SS Equity,x,20.0,20.1,20.05,10,10,5,1,x,20150420,36000,x,x,XT",
        "DEF SS Equity,x,20.0,20.1,20.05,10,10,5,1,x,20150420,36030,x,x,ZT",
        "DEF SS Equity,x,20.0,20.1,20.05,10,10,5,1,x,20150420,36060,x,x,@1",
    ];
    for line in lines {
        match decode_line(line) {
            Ok(LineOutcome::Accepted(record)) => {
                println!("  accepted {} at {}", record.symbol, tick_ledger::format_timestamp(record.timestamp));
                table.process(&record).unwrap();
            }
            Ok(LineOutcome::Filtered { condition_code, .. }) => {
                println!("  filtered (condition '{condition_code}')");
            }
            Err(e) => println!("  rejected: {e}"),
        }
    }
    println!();

    print!("{}", report::summary(&table));
    println!();

    println!("{}", report::header());
    for snapshot in table.snapshot() {
        println!("{}", report::format_row(&snapshot));
    }

    println!("\n=================================================================");
    println!("✓ Example completed successfully!");
    println!("=================================================================");
}
