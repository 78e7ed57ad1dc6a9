use anyhow::Context;

use jktdocs_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    jktdocs_observability::init_with(config.log_format);
    config.warn_insecure_defaults();

    let app = jktdocs_api::app::build_app_from_config(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        documents_dir = %config.documents_dir.display(),
        "listening"
    );

    axum::serve(listener, app).await.with_context(|| "serve")?;
    Ok(())
}
