use rentals::{AppState, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rentals=info")),
        )
        .init();

    // Load configuration using lib.rs method
    let config = load_config()?;
    tracing::info!("Loaded configuration:\n{}", config);

    // Credentials are checked here, before any connection attempt
    let state = AppState::from_config(&config).await?;
    state.pool.initialize().await?;

    tracing::info!("Rentals backend ready, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    state.pool.close().await;
    tracing::info!("Rentals backend stopped");

    Ok(())
}
