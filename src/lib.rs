pub mod config;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod tasks;
pub mod tools;

pub use config::Config;
pub use models::{ResearchState, SearchResult, ToolAnalysis, ToolRecord};
pub use pipeline::ResearchPipeline;

use anyhow::Result;
use config::SearchBackend;
use std::sync::Arc;
use tasks::{FallbackTable, PipelineLimits, ResearchToolkit};
use tools::fetcher::DEFAULT_PAGE_CHARS;
use tools::{
    DuckDuckGoSearch, HttpPageFetcher, InferenceClient, RigModel, SearchGateway, SearchProvider,
    TavilySearch,
};

/// Wire the live collaborators described by `config` into a pipeline.
pub fn build_pipeline(config: &Config) -> Result<ResearchPipeline> {
    let provider: Arc<dyn SearchProvider> = match config.search_backend {
        SearchBackend::DuckDuckGo => Arc::new(DuckDuckGoSearch::new()?),
        SearchBackend::Tavily => {
            let key = config
                .tavily_api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("TAVILY_API_KEY not configured"))?;
            Arc::new(TavilySearch::new(key)?)
        }
    };

    let model = RigModel::new(&config.llm_api_key, &config.llm_base_url, &config.llm_model);

    let toolkit = ResearchToolkit {
        search: SearchGateway::new(provider),
        fetcher: Arc::new(HttpPageFetcher::new(config.fetch_timeout, DEFAULT_PAGE_CHARS)?),
        inference: InferenceClient::new(Arc::new(model)),
        fallback: FallbackTable::default(),
        limits: PipelineLimits::default(),
    };

    Ok(ResearchPipeline::new(toolkit).with_deadline(config.pipeline_timeout))
}
