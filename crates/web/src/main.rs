use anyhow::Context;

use aurora_web::config::{DATABASE_URL_VAR, WebConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WebConfig::from_env()?;
    aurora_observability::init_with_level(&config.log_level);
    tracing::info!(?config, "configuration loaded");
    if config.uses_default_database() {
        tracing::warn!("{DATABASE_URL_VAR} not set; using in-memory sqlite");
    }

    let app = aurora_web::app::build_app(&config)
        .await
        .context("failed to initialise database")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
