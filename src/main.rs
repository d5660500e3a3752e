use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use restaurant_platform::{config::GatewayConfig, routes, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env().context("loading gateway configuration")?;
    tracing::info!(?config, "Gateway configuration loaded");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let state = Arc::new(AppState::from_config(&config).context("building route table")?);
    for route in &state.routes {
        tracing::info!(
            id = %route.definition.id,
            path = %route.definition.path,
            uri = %route.definition.uri,
            filters = route.filters.len(),
            "Route registered"
        );
    }

    let (bound, server) = warp::serve(routes::gateway(state))
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("API Gateway running on http://{}", bound);
    server.await;
    tracing::info!("API Gateway stopped");
    Ok(())
}
