use anyhow::Context;

use userguard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    userguard_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = userguard_api::app::build_app(&config).context("failed to initialise services")?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
