//! # Register Entry Point
//!
//! ## Usage
//! ```bash
//! register status
//! register pending
//! register report [--date YYYY-MM-DD]
//! register open --float 20000 --operator <ID> --email <EMAIL>
//! register close [--yes]
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load `RegisterConfig` from the environment
//! 3. Open the database and run migrations
//! 4. Run one command, print the result on stdout

use anyhow::{bail, Context};
use chrono::NaiveDate;

use comanda_core::{Money, Operator, ShiftReport};
use comanda_register::commands::{order, report, shift};
use comanda_register::{init_tracing, open_database, RegisterConfig};

const USAGE: &str = "\
Comanda register

Usage: register <COMMAND> [OPTIONS]

Commands:
  status                                   Open shift and pending count
  pending                                  List pending orders
  report [--date YYYY-MM-DD]               Shift report (JSON)
  open --float N --operator ID --email E   Open a shift
  close [--yes]                            Show closing totals; --yes closes
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print!("{}", USAGE);
        return Ok(());
    };

    let config = RegisterConfig::from_env().context("loading configuration")?;
    let db = open_database(&config).await.context("opening database")?;

    let result = match command.as_str() {
        "status" => status(&db, &config).await,
        "pending" => pending(&db, &config).await,
        "report" => print_report(&db, &config, &args[1..]).await,
        "open" => open(&db, &config, &args[1..]).await,
        "close" => close(&db, &config, &args[1..]).await,
        "help" | "--help" | "-h" => {
            print!("{}", USAGE);
            Ok(())
        }
        other => Err(anyhow::anyhow!("unknown command '{}'\n\n{}", other, USAGE)),
    };

    db.close().await;
    result
}

async fn status(db: &comanda_db::Database, config: &RegisterConfig) -> anyhow::Result<()> {
    let outstanding = shift::count_outstanding(db).await?;

    match shift::current_shift(db).await? {
        Some(open) => {
            println!("Shift {} OPEN since {}", open.id, open.opened_at);
            println!("  opened by    {}", open.opened_by.email);
            println!("  float        {}", config.format_currency(open.initial_float));
            println!(
                "  next folio   {}",
                shift::next_sequence_number(db, &open).await?
            );
        }
        None => println!("No open shift"),
    }
    println!("Pending orders: {}", outstanding);
    Ok(())
}

async fn pending(db: &comanda_db::Database, config: &RegisterConfig) -> anyhow::Result<()> {
    let orders = order::pending_orders(db).await?;
    if orders.is_empty() {
        println!("No pending orders");
    }
    for o in orders {
        println!(
            "#{:<4} {:<9} {:<12} {:>12}  {}",
            o.sequence_number,
            format!("{:?}", o.channel).to_uppercase(),
            o.table_label,
            config.format_currency(o.running_total()),
            o.id
        );
    }
    Ok(())
}

async fn print_report(
    db: &comanda_db::Database,
    config: &RegisterConfig,
    args: &[String],
) -> anyhow::Result<()> {
    let date = match option_value(args, "--date") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{}'", raw))?,
        ),
        None => None,
    };

    let report = report::shift_report(db, config, date).await?;
    print_summary(config, &report);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn open(db: &comanda_db::Database, config: &RegisterConfig, args: &[String]) -> anyhow::Result<()> {
    let float = match option_value(args, "--float") {
        Some(raw) => Money::from_minor(
            raw.parse()
                .with_context(|| format!("invalid float '{}'", raw))?,
        ),
        None => config.default_float,
    };
    let operator = option_value(args, "--operator").map(|id| {
        Operator::new(id, option_value(args, "--email").unwrap_or_default())
    });

    let opened = shift::open_shift(db, float, operator).await?;
    println!(
        "Shift {} opened with float {}",
        opened.id,
        config.format_currency(opened.initial_float)
    );
    Ok(())
}

async fn close(db: &comanda_db::Database, config: &RegisterConfig, args: &[String]) -> anyhow::Result<()> {
    let Some(open) = shift::current_shift(db).await? else {
        bail!("no open shift");
    };

    let confirmation = shift::prepare_close(db, &open).await?;
    let s = &confirmation.snapshot;
    println!("Closing shift {}", open.id);
    println!("  total sales     {}", config.format_currency(s.total_sales));
    println!("  cash            {}", config.format_currency(s.cash));
    println!("  debit           {}", config.format_currency(s.debit));
    println!("  transfer        {}", config.format_currency(s.transfer));
    println!("  voucher         {}", config.format_currency(s.voucher));
    println!("  voided ({:>3})    {}", s.voided_count, config.format_currency(s.total_voided));
    println!("  cash in drawer  {}", config.format_currency(confirmation.expected_cash));

    if !args.iter().any(|a| a == "--yes") {
        println!();
        println!("Re-run with --yes to close.");
        return Ok(());
    }

    let closed = shift::close_shift(db, &open, &confirmation).await?;
    if let Some(closed_at) = closed.closed_at {
        println!("Shift {} CLOSED at {}", closed.id, closed_at);
    }
    Ok(())
}

fn print_summary(config: &RegisterConfig, report: &ShiftReport) {
    println!("{}", config.store_name);
    if report.no_movements {
        println!("No movements");
        return;
    }
    match &report.shift {
        Some(s) => println!("Shift {} ({:?})", s.id, s.state),
        None => println!("No shift"),
    }
    println!(
        "Sales {} (local {}, delivery {}), voided {} x{}",
        config.format_currency(report.snapshot.total_sales),
        config.format_currency(report.snapshot.total_local_sales),
        config.format_currency(report.snapshot.total_delivery_sales),
        config.format_currency(report.snapshot.total_voided),
        report.snapshot.voided_count
    );
    println!("Cash in drawer {}", config.format_currency(report.expected_cash));
}

fn option_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
