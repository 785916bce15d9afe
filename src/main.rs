use anyhow::{Context, Result};
use devtools_research::server::{router, AppState};
use devtools_research::store::InMemoryResultStore;
use devtools_research::{build_pipeline, Config};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devtools_research=debug,graph_flow=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        search_backend = config.search_backend.as_str(),
        model = %config.llm_model,
        "Configuration loaded"
    );

    let pipeline = build_pipeline(&config).context("Failed to build research pipeline")?;
    let state = AppState {
        pipeline: Arc::new(pipeline),
        store: Arc::new(InMemoryResultStore::new(config.result_cache_capacity)),
        search_backend: config.search_backend.as_str().to_string(),
        llm_configured: true,
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Developer tools research API running on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
