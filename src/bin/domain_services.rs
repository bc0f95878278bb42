//! Serves the in-process user, event and auth services over RPC so the
//! gateway can run with `SERVICE_MODE=remote`.

use std::sync::Arc;

use gateway::{config::ServicesConfig, rpc, services::local::InMemoryDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = ServicesConfig::from_env()?;
    let directory = Arc::new(InMemoryDirectory::new());
    let app = rpc::server::router(directory.clone(), directory.clone(), directory);

    tracing::info!("🚀 Domain services listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
