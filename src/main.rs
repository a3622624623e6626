use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::env;
use std::sync::Arc;

use toll_calculator::{
    CachedHolidayProvider, MemoryLedger, SqliteLedger, StaticVehicleRegistry, TollCalculator,
};

const HOLIDAY_CACHE_DIR: &str = "data/holidays";
const LEDGER_PATH: &str = "tolls.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None => run_demo(),
        Some("register") => {
            let usage = "Usage: toll-calculator register <plate> <timestamp>";
            let plate = args.get(2).context(usage)?;
            let timestamp = parse_timestamp(args.get(3).context(usage)?)?;
            run_register(plate, timestamp)
        }
        Some("total") => {
            let plate = args.get(2).context("Usage: toll-calculator total <plate>")?;
            run_total(plate)
        }
        Some("history") => {
            let plate = args.get(2).context("Usage: toll-calculator history <plate>")?;
            run_history(plate)
        }
        Some(other) => {
            eprintln!("Unknown command '{}'", other);
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  toll-calculator                         run the demo scenario");
            eprintln!("  toll-calculator register <plate> <ts>   register a passage (RFC 3339)");
            eprintln!("  toll-calculator total <plate>           total recorded toll");
            eprintln!("  toll-calculator history <plate>         recorded passages");
            std::process::exit(1);
        }
    }
}

/// Malformed timestamps are rejected here, before any collaborator call
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .with_context(|| {
            format!(
                "Invalid timestamp '{}' (expected RFC 3339, e.g. 2025-02-04T07:00:00+01:00)",
                raw
            )
        })
}

/// Calculator over the durable SQLite ledger, shared by the subcommands
fn open_calculator() -> Result<TollCalculator> {
    let holidays = Arc::new(CachedHolidayProvider::new(HOLIDAY_CACHE_DIR));
    let vehicles = Arc::new(StaticVehicleRegistry::default_fleet());
    let ledger = Arc::new(SqliteLedger::open(LEDGER_PATH)?);

    Ok(TollCalculator::new(holidays, vehicles, ledger))
}

fn run_register(plate: &str, timestamp: DateTime<Utc>) -> Result<()> {
    let calculator = open_calculator()?;
    let charged = calculator.register_toll_fee(plate, timestamp)?;

    if charged > 0 {
        println!("✓ Charged {} to vehicle '{}'", charged, plate);
    } else {
        println!("✓ No charge for vehicle '{}'", plate);
    }

    Ok(())
}

fn run_total(plate: &str) -> Result<()> {
    let calculator = open_calculator()?;
    let total = calculator.total_toll_for_vehicle(plate)?;

    println!("Vehicle '{}' total toll: {}", plate, total);

    Ok(())
}

fn run_history(plate: &str) -> Result<()> {
    let calculator = open_calculator()?;
    let history = calculator.toll_history_for(plate)?;

    if history.is_empty() {
        println!("No recorded passages for vehicle '{}'", plate);
        return Ok(());
    }

    println!("Recorded passages for vehicle '{}':", plate);
    for record in &history {
        println!("  {}  {:>3}", record.timestamp, record.amount);
    }

    Ok(())
}

fn run_demo() -> Result<()> {
    println!("🚦 Congestion Toll Calculator - Demo");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let holidays = Arc::new(CachedHolidayProvider::new(HOLIDAY_CACHE_DIR));
    let vehicles = Arc::new(StaticVehicleRegistry::default_fleet());
    let calculator = TollCalculator::new(holidays, vehicles, Arc::new(MemoryLedger::new()));

    // A Tuesday of passages for an ordinary car
    println!("\n📋 Registering passages for ABC123 (car), Tuesday 2025-02-04...");
    demo_passage(&calculator, "ABC123", "2025-02-04T06:15:00+01:00")?;
    demo_passage(&calculator, "ABC123", "2025-02-04T07:00:00+01:00")?;
    demo_passage(&calculator, "ABC123", "2025-02-04T08:30:00+01:00")?;
    demo_passage(&calculator, "ABC123", "2025-02-04T15:07:00+01:00")?;

    println!("\n📋 Exempt and toll-free cases...");
    demo_passage(&calculator, "MNO345", "2025-02-04T07:30:00+01:00")?;
    demo_passage(&calculator, "ABC123", "2025-02-08T10:00:00+01:00")?;
    demo_passage(&calculator, "ABC123", "2025-01-01T10:00:00+01:00")?;

    println!("\n📊 History for ABC123:");
    for record in calculator.toll_history_for("ABC123")? {
        println!("  {}  {:>3}", record.timestamp, record.amount);
    }

    println!(
        "\n✓ Total toll for ABC123: {}",
        calculator.total_toll_for_vehicle("ABC123")?
    );

    Ok(())
}

fn demo_passage(calculator: &TollCalculator, plate: &str, raw: &str) -> Result<()> {
    let timestamp = parse_timestamp(raw)?;
    let charged = calculator.register_toll_fee(plate, timestamp)?;

    if charged > 0 {
        println!("  {} {}  → charged {}", plate, raw, charged);
    } else {
        println!("  {} {}  → no charge", plate, raw);
    }

    Ok(())
}
