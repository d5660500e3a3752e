use std::net::SocketAddr;

use anyhow::Context;
use restaurant_platform::config::RestaurantConfig;
use restaurant_platform::restaurant::{self, RestaurantRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RestaurantConfig::from_env().context("loading restaurant service configuration")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let repo = RestaurantRepository::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;
    tracing::info!(db_path = %config.db_path, "Restaurant database ready");

    let (bound, server) = warp::serve(restaurant::routes(repo))
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("Restaurant service running on http://{}", bound);
    server.await;
    tracing::info!("Restaurant service stopped");
    Ok(())
}
