use std::time::Duration;

use anyhow::Context;
use seatfill::{Resolver, ResolverConfig};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8055";

fn config_from_env() -> anyhow::Result<ResolverConfig> {
    let mut config = ResolverConfig::default();

    if let Ok(path) = std::env::var("SEATFILL_DATASET") {
        config = config.with_dataset_path(path);
    }
    if let Ok(secs) = std::env::var("SEATFILL_FETCH_TIMEOUT_SECS") {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("SEATFILL_FETCH_TIMEOUT_SECS is not a number: {secs}"))?;
        config = config.with_fetch_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .write_style(env_logger::WriteStyle::Never)
        .init();

    let config = config_from_env()?;
    log::info!(
        "Dataset at {}, fetch timeout {:?}",
        config.dataset_path.display(),
        config.fetch_timeout
    );
    let resolver = Resolver::live(config).context("Failed to init resolver")?;

    let address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.into());
    let router = seatfill_server::router(resolver);
    let tcp_listener = tokio::net::TcpListener::bind(&address).await?;

    log::info!("Starting seatfill server on address: {}", address);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
        })
        .await?;

    Ok(())
}
