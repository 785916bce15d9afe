mod fallback;
mod synthesis;
mod tool_discovery;
mod tool_research;

pub use fallback::FallbackTable;
pub use synthesis::{render_tool_blocks, synthesize, SynthesisTask, NO_TOOLS_MESSAGE};
pub use tool_discovery::{discover_tools, ToolDiscoveryTask};
pub use tool_research::{research_tools, ToolResearchTask};

use crate::models::{ResearchState, StateUpdate};
use crate::tools::{InferenceClient, PageFetcher, SearchGateway};
use graph_flow::{Context, GraphError};
use std::collections::HashMap;
use std::sync::Arc;

pub const STATE_KEY: &str = "research_state";
pub const STAGE_TIMES_KEY: &str = "stage_times";

/// Empirically tuned bounds applied by the stages.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    pub discovery_results: usize,
    pub enrich_fetches: usize,
    pub enrich_chars: usize,
    pub min_discovery_content: usize,
    pub max_candidates: usize,
    pub max_researched: usize,
    pub max_name_len: usize,
    pub min_page_text: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            discovery_results: 3,
            enrich_fetches: 2,
            enrich_chars: 1500,
            min_discovery_content: 50,
            max_candidates: 5,
            max_researched: 4,
            max_name_len: 50,
            min_page_text: 100,
        }
    }
}

/// Everything the stages call out to.
#[derive(Clone)]
pub struct ResearchToolkit {
    pub search: SearchGateway,
    pub fetcher: Arc<dyn PageFetcher>,
    pub inference: InferenceClient,
    pub fallback: FallbackTable,
    pub limits: PipelineLimits,
}

async fn load_state(context: &Context) -> Result<ResearchState, GraphError> {
    context
        .get(STATE_KEY)
        .await
        .ok_or_else(|| GraphError::ContextError("Research state not found".to_string()))
}

async fn store_update(context: &Context, mut state: ResearchState, update: StateUpdate) {
    state.apply(update);
    context.set(STATE_KEY, state).await;
}

async fn record_stage_time(context: &Context, stage: &str, elapsed_ms: u64) {
    let mut stage_times: HashMap<String, u64> =
        context.get(STAGE_TIMES_KEY).await.unwrap_or_default();
    stage_times.insert(stage.to_string(), elapsed_ms);
    context.set(STAGE_TIMES_KEY, stage_times).await;
}
