use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use seller_console_engine::SqliteDatabase;

mod formatting;

use formatting::{format_cost_table, format_payout_summary};
use seller_console_engine::payouts::{parse_payout_ledger, reconcile};
use usc_common::Money;

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the unified seller console")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile a payout ledger export offline and print the summary
    #[clap(name = "reconcile")]
    Reconcile {
        /// Path to the semicolon-delimited ledger export
        file: PathBuf,
        /// Estimate of funds the marketplace still holds, in dollars
        #[arg(short = 's', long = "still-held", default_value = "0")]
        still_held: String,
    },
    /// Inspect or seed the SKU cost table
    #[clap(name = "costs")]
    Costs {
        #[command(subcommand)]
        command: CostsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CostsCommand {
    /// Print the stored cost table
    List,
    /// Insert the default cost rows (existing rows are kept)
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Reconcile { file, still_held } => reconcile_file(&file, &still_held),
        Command::Costs { command } => costs_command(command).await,
    }
}

fn reconcile_file(file: &PathBuf, still_held: &str) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let rows = parse_payout_ledger(&text);
    if rows.is_empty() {
        return Err(anyhow!("No valid rows found in {}", file.display()));
    }
    let summary = reconcile(&rows, Money::parse_lenient(still_held));
    println!("{}", format_payout_summary(&summary, rows.len()));
    Ok(())
}

async fn costs_command(command: CostsCommand) -> Result<()> {
    let url = std::env::var("USC_DATABASE_URL").unwrap_or_else(|_| "sqlite://seller_console.sqlite".to_string());
    let db = SqliteDatabase::new(&url, 5).await?;
    match command {
        CostsCommand::List => {
            let costs = db.fetch_sku_costs().await?;
            if costs.is_empty() {
                println!("No cost rows stored. Run `seller_tools costs seed` to install the defaults.");
            } else {
                println!("{}", format_cost_table(&costs));
            }
        },
        CostsCommand::Seed => {
            let seeded = db.seed_default_costs().await?;
            println!("Seeded {seeded} cost rows into {url}");
        },
    }
    Ok(())
}
