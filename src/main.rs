use anyhow::Result;
use storefront_auth::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry, config.app.environment)?;

    info!("Starting {} credential service", config.app.name);
    info!("HTTP server listening on {}", config.http_addr());

    server::run(config, prometheus_handle).await
}
