use anyhow::Context;
use deployment::Deployment;
use server::{DeploymentImpl, app};
use services::services::config::StorefrontConfig;
use tokio::net::TcpListener;
use tracing::info;
use utils::logging::{DEFAULT_FILTER, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(DEFAULT_FILTER);

    let config = StorefrontConfig::from_env();
    let address = config.bind_address();

    let deployment = DeploymentImpl::new(config)
        .await
        .context("failed to initialise deployment")?;

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %listener.local_addr()?, "Storefront API listening");

    axum::serve(listener, app(deployment))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
    }
}
