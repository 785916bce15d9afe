use super::{load_state, record_stage_time, store_update, ResearchToolkit};
use crate::models::{ResearchState, StateUpdate};
use crate::tools::fetcher::truncate_chars;
use async_trait::async_trait;
use futures::future::join_all;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ToolDiscoveryTask {
    toolkit: Arc<ResearchToolkit>,
}

impl ToolDiscoveryTask {
    pub const ID: &'static str = "tool_discovery";

    pub fn new(toolkit: Arc<ResearchToolkit>) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl Task for ToolDiscoveryTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting tool discovery task");

        let state = load_state(&context).await?;
        let update = discover_tools(&self.toolkit, &state).await;

        info!("Discovered candidates: {:?}", update.extracted_tools);
        store_update(&context, state, update).await;
        record_stage_time(&context, Self::ID, start_time.elapsed().as_millis() as u64).await;

        Ok(TaskResult::new(
            Some("Tool discovery completed".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}

/// Stage 1: find candidate tool names for the query. Always yields at least
/// one candidate.
pub async fn discover_tools(toolkit: &ResearchToolkit, state: &ResearchState) -> StateUpdate {
    let limits = &toolkit.limits;
    let query = state.query.as_str();

    let results = toolkit
        .search
        .search_for_tools(query, limits.discovery_results)
        .await;

    if results.is_empty() {
        warn!("No search results for '{}', using fallback candidates", query);
        let tools = toolkit
            .fallback
            .lookup(query)
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec![query.to_string()]);
        return StateUpdate {
            extracted_tools: Some(bound_candidates(tools, toolkit)),
            search_results: Some(Vec::new()),
            error: Some("No search results found".to_string()),
            ..Default::default()
        };
    }

    let mut content = String::new();
    for result in &results {
        content.push_str(&format!("\n\n--- {} ---\n{}", result.title, result.snippet));
    }

    let pages = join_all(
        results
            .iter()
            .take(limits.enrich_fetches)
            .map(|result| toolkit.fetcher.fetch(&result.url)),
    )
    .await;
    for (result, page) in results.iter().zip(pages) {
        if let Some(text) = page {
            content.push_str(&format!(
                "\n\n--- From {} ---\n{}",
                result.title,
                truncate_chars(&text, limits.enrich_chars)
            ));
        }
    }

    let (tools, error) = if content.trim().chars().count() < limits.min_discovery_content {
        warn!("Discovery content too thin ({} chars), using fallback", content.trim().len());
        (
            toolkit.fallback.suggest(query),
            Some("Not enough content to extract tools from".to_string()),
        )
    } else {
        let extracted = toolkit.inference.extract_tool_names(query, &content).await;
        if extracted.is_empty() {
            warn!("No tools extracted for '{}', using fallback", query);
            (
                toolkit.fallback.suggest(query),
                Some("No tools could be extracted".to_string()),
            )
        } else {
            (extracted, None)
        }
    };

    StateUpdate {
        extracted_tools: Some(bound_candidates(tools, toolkit)),
        search_results: Some(results),
        error,
        ..Default::default()
    }
}

fn bound_candidates(tools: Vec<String>, toolkit: &ResearchToolkit) -> Vec<String> {
    let limits = &toolkit.limits;
    let mut bounded: Vec<String> = Vec::new();
    for tool in tools {
        let name = truncate_chars(tool.trim(), limits.max_name_len.saturating_sub(1))
            .trim()
            .to_string();
        if name.is_empty() || bounded.iter().any(|b| b.eq_ignore_ascii_case(&name)) {
            continue;
        }
        bounded.push(name);
    }
    bounded.truncate(limits.max_candidates);
    bounded
}
