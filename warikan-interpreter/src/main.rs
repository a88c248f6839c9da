mod output;

use std::{fs, path::PathBuf, process};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use warikan_domain::{AggregationContext, Ledger, RoundingMode, settle_ledger};

use crate::output::{render_json, render_text};

/// Computes balances and settlement transfers for a ledger snapshot.
#[derive(Debug, Parser)]
#[command(name = "warikan", version)]
struct Cli {
    /// Ledger snapshot: `{"members": [...], "expenses": [...]}`.
    ledger: PathBuf,

    #[arg(long, value_enum, env = "WARIKAN_ROUNDING", default_value_t = RoundingArg::HalfUp)]
    rounding: RoundingArg,

    #[arg(long, value_enum, env = "WARIKAN_FORMAT", default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RoundingArg {
    HalfUp,
    HalfAwayFromZero,
    HalfEven,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<RoundingArg> for RoundingMode {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::HalfUp => RoundingMode::HalfUp,
            RoundingArg::HalfAwayFromZero => RoundingMode::HalfAwayFromZero,
            RoundingArg::HalfEven => RoundingMode::HalfEven,
        }
    }
}

impl Cli {
    fn context(&self) -> AggregationContext {
        AggregationContext {
            rounding_mode: self.rounding.into(),
        }
    }
}

fn main() {
    init_logging();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

/// Logs go to stderr so stdout only carries the settlement output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let source = fs::read_to_string(&cli.ledger)
        .with_context(|| format!("Failed to read '{}'", cli.ledger.display()))?;
    let ledger = parse_ledger(&source)
        .with_context(|| format!("Failed to parse '{}'", cli.ledger.display()))?;

    tracing::info!(
        path = %cli.ledger.display(),
        member_count = ledger.members.len(),
        expense_count = ledger.expenses.len(),
        rounding_mode = ?cli.rounding,
        "Ledger loaded"
    );

    let report = settle_ledger(&ledger, cli.context())?;
    let output = match cli.format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => render_json(&report)?,
    };
    println!("{output}");
    Ok(())
}

fn parse_ledger(source: &str) -> serde_json::Result<Ledger> {
    serde_json::from_str(source)
}
