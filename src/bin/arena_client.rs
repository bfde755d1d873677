//! Headless arena display
//!
//! Connects to the relay as viewer (default) or admin (`CLIENT_ROLE=admin`),
//! simulates the ball locally, and logs the "Current Move" label.

use tracing::info;

use ball_relay::client;
use ball_relay::config::ClientConfig;
use ball_relay::util::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()?;
    init_tracing(&config.log_level);

    client::run(config).await?;

    info!("Client stopped");
    Ok(())
}
