//! Splitledger Simulator
//!
//! Seeds an in-memory ledger with generated users, groups, expenses, and
//! settlements, runs every balance view, and verifies the zero-sum
//! invariant on each group's internal ledger.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod scenario;

use scenario::ScenarioConfig;

/// Splitledger Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Splitledger test and simulation environment")]
struct Args {
    /// Number of users to create
    #[arg(short, long, default_value = "6")]
    users: usize,

    /// Number of groups to create
    #[arg(short, long, default_value = "2")]
    groups: usize,

    /// Number of expenses to record
    #[arg(short, long, default_value = "40")]
    expenses: usize,

    /// Number of settlements to record
    #[arg(short, long, default_value = "10")]
    settlements: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting splitledger simulator");

    let config = ScenarioConfig {
        users: args.users,
        groups: args.groups,
        expenses: args.expenses,
        settlements: args.settlements,
        seed: args.seed.unwrap_or_else(rand::random),
    };
    info!(
        seed = config.seed,
        users = config.users,
        groups = config.groups,
        "Scenario configured"
    );

    let report = scenario::run(config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            expenses = report.expenses_recorded,
            settlements = report.settlements_recorded,
            groups = report.groups_verified,
            outstanding = %report.total_outstanding,
            "Simulation complete; every group ledger balanced"
        );
    }

    Ok(())
}
