use super::{load_state, record_stage_time, store_update, ResearchToolkit};
use crate::models::{ResearchState, StateUpdate, ToolRecord};
use crate::tools::fetcher::domain_of;
use async_trait::async_trait;
use futures::future::join_all;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ToolResearchTask {
    toolkit: Arc<ResearchToolkit>,
}

impl ToolResearchTask {
    pub const ID: &'static str = "tool_research";

    pub fn new(toolkit: Arc<ResearchToolkit>) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl Task for ToolResearchTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting tool research task");

        let state = load_state(&context).await?;
        let update = research_tools(&self.toolkit, &state).await;

        info!(
            "Researched {} tools",
            update.companies.as_ref().map_or(0, Vec::len)
        );
        store_update(&context, state, update).await;
        record_stage_time(&context, Self::ID, start_time.elapsed().as_millis() as u64).await;

        Ok(TaskResult::new(
            Some("Tool research completed".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}

/// Stage 2: research up to `max_researched` candidates concurrently.
/// `join_all` yields outputs in input order, so `companies` follows the
/// candidate order.
pub async fn research_tools(toolkit: &ResearchToolkit, state: &ResearchState) -> StateUpdate {
    let candidates = state
        .extracted_tools
        .iter()
        .take(toolkit.limits.max_researched);

    let records = join_all(candidates.map(|name| research_tool(toolkit, name))).await;

    StateUpdate {
        companies: Some(records.into_iter().flatten().collect()),
        ..Default::default()
    }
}

/// search -> fetch -> analyze for one tool. `None` when no official site
/// could be found.
async fn research_tool(toolkit: &ResearchToolkit, name: &str) -> Option<ToolRecord> {
    let Some(site) = toolkit.search.search_official_site(name).await else {
        info!("  No site found, skipping: {}", name);
        return None;
    };

    let page = toolkit.fetcher.fetch(&site.url).await;
    match page {
        Some(text) if text.chars().count() > toolkit.limits.min_page_text => {
            let analysis = toolkit.inference.analyze_tool(name, &text).await;
            info!(
                "  Analyzed: {} ({})",
                name,
                domain_of(&site.url).unwrap_or_else(|| site.url.clone())
            );
            Some(ToolRecord::from_analysis(name, &site.url, analysis))
        }
        _ => {
            info!("  Limited data: {}", name);
            Some(ToolRecord::degraded(name, &site.url, &site.snippet))
        }
    }
}
