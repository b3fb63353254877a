use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use log::info;

mod api;
mod auth;
mod health;
mod simulator;
mod state;
mod stats;
mod store;

use api::router;
use common::Config;
use simulator::{rng_for, start_simulators, RngStream};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "sentinel-agent", about = "Simulated badge-access and DoS telemetry service")]
struct Args {
    /// Path to the TOML config; built-in defaults are used when the file is absent
    #[arg(short, long, env = "SENTINEL_CONFIG")]
    config: Option<String>,

    /// Override the configured listen address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting sentinel agent");

    // Load configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;
    if let Some(bind) = args.bind {
        config.agent.bind_addr = bind;
    }
    config.validate()?;
    info!("Config loaded from {}", config_path);

    // Seed the stores
    let mut seed_rng = rng_for(config.simulator.rng_seed, RngStream::SeedBatch);
    let state = AppState::from_config(&config, &mut seed_rng);
    info!(
        "Event store seeded with {} events (capacity {})",
        state.events.read().await.len(),
        config.simulator.max_events
    );

    // Start simulators
    start_simulators(state.clone(), &config.simulator);
    info!("Simulators started");

    // Start HTTP server
    let listener = TcpListener::bind(&config.agent.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.agent.bind_addr))?;
    info!("HTTP API listening on {}", config.agent.bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            // Wait for ctrl-c
            let _ = signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
