use std::sync::Arc;

use anyhow::Context;

use quorum_api::app::{build_app, services::ServiceRegistry};
use quorum_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quorum_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr.clone();

    let registry = Arc::new(ServiceRegistry::new(config).context("service boot failed")?);
    let app = build_app(registry);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
