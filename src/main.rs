//! Betster demo driver
//!
//! Runs one synthetic-load round end to end: create, start, inject
//! participants and bets, place one real bet, wait out the timer, and print
//! the resolved outcome as JSON.

use betster_engine::{BetsterEngine, RoundConfig, RoundStatus};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "betster")]
#[command(about = "Betster round engine demo", long_about = None)]
struct Args {
    /// Round duration in seconds
    #[arg(long, default_value = "3")]
    duration: u64,

    /// Synthetic participants to inject
    #[arg(long, default_value = "50")]
    participants: usize,

    /// Synthetic bets to inject
    #[arg(long, default_value = "200")]
    bets: usize,

    /// Highest pickable number (inclusive)
    #[arg(long, default_value = "15")]
    domain_max: u32,

    /// Minimum bet in currency units
    #[arg(long, default_value = "100")]
    min_bet: u64,

    /// Maximum bet in currency units
    #[arg(long, default_value = "1000")]
    max_bet: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let engine = BetsterEngine::new();
    let host = engine.register_user("You");

    let config = RoundConfig {
        name: "Demo Round".to_string(),
        min_bet: args.min_bet,
        max_bet: args.max_bet,
        duration_secs: args.duration,
        number_domain_max: args.domain_max,
        ..RoundConfig::default()
    };
    let round_id = engine.create_round(&host.id, config)?;
    engine.start_round(&round_id)?;

    engine.inject_synthetic_load(&round_id, args.participants, args.bets)?;
    let bet = engine.place_bet(&round_id, &host.id, args.domain_max / 2, args.min_bet)?;
    tracing::info!(number = bet.number, amount = bet.amount, "Placed host bet");

    // Wait out the round timer, then a beat for the deferred resolution.
    tokio::time::sleep(Duration::from_secs(args.duration)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let view = engine.get_round(&round_id)?;
    if view.status != RoundStatus::Completed {
        // Timer hasn't landed yet on a loaded machine; force it.
        engine.resolve_round(&round_id)?;
    }

    let view = engine.get_round(&round_id)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    tracing::info!(
        host_balance = engine.balance_of(&host.id).unwrap_or(0),
        "Demo round finished"
    );
    Ok(())
}
