//! Snake relay - plain WebSocket server binary

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Snake relay (WebSocket only) v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  Grid: {}x{}", config.grid.size, config.grid.size);
    info!("  Foods per room: {}", config.food.count);

    server::run(config).await?;

    Ok(())
}
