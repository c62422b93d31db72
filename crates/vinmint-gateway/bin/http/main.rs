mod cli;

use crate::cli::CLI;
use anyhow::Context;
use clap::Parser;
use tracing::info;
use vinmint_gateway::{App, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    vinmint_telemetry::init(config.log_format)?;

    let store = config
        .selector()
        .select()
        .await
        .context("failed to open sequence store")?;
    let router = App::router(AppState::new(store, config.allocation_timeout()));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(
        listen_addr = %listener.local_addr()?,
        allocation_timeout_ms = config.allocation_timeout_ms,
        "starting gateway server"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down gateway server");
    }
}
