use anyhow::Context;
use clinic_booking_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.level()?)
        .init();

    clinic_booking_server::serve(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
