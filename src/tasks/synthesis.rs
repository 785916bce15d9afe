use super::{load_state, record_stage_time, store_update, ResearchToolkit};
use crate::models::{ResearchState, StateUpdate, ToolRecord};
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument};

pub const NO_TOOLS_MESSAGE: &str = "No tools found to analyze. Try a different query.";

pub struct SynthesisTask {
    toolkit: Arc<ResearchToolkit>,
}

impl SynthesisTask {
    pub const ID: &'static str = "synthesis";

    pub fn new(toolkit: Arc<ResearchToolkit>) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl Task for SynthesisTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting synthesis task");

        let state = load_state(&context).await?;
        let update = synthesize(&self.toolkit, &state).await;

        info!(
            "Generated recommendations with {} characters",
            update.analysis.as_ref().map_or(0, String::len)
        );
        store_update(&context, state, update).await;
        record_stage_time(&context, Self::ID, start_time.elapsed().as_millis() as u64).await;

        Ok(TaskResult::new(
            Some("Recommendations generated".to_string()),
            NextAction::End,
        ))
    }
}

/// Stage 3: turn the researched records into a narrative.
pub async fn synthesize(toolkit: &ResearchToolkit, state: &ResearchState) -> StateUpdate {
    let analysis = if state.companies.is_empty() {
        NO_TOOLS_MESSAGE.to_string()
    } else {
        let tools_data = render_tool_blocks(&state.companies);
        toolkit
            .inference
            .synthesize_recommendations(&state.query, &tools_data)
            .await
    };

    StateUpdate {
        analysis: Some(analysis),
        ..Default::default()
    }
}

pub fn render_tool_blocks(companies: &[ToolRecord]) -> String {
    companies
        .iter()
        .map(render_tool_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_tool_block(tool: &ToolRecord) -> String {
    let open_source = match tool.is_open_source {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "Unknown",
    };
    format!(
        "**{}**\n- Website: {}\n- Pricing: {}\n- Open Source: {}\n- Description: {}\n- Languages: {}\n- Integrations: {}",
        tool.name,
        tool.website,
        tool.pricing_model,
        open_source,
        tool.description,
        join_or_na(&tool.language_support),
        join_or_na(&tool.integration_capabilities),
    )
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricingModel;

    #[test]
    fn renders_placeholders_for_missing_facts() {
        let degraded = ToolRecord::degraded("Neon", "https://neon.tech", "Serverless Postgres");
        let full = ToolRecord {
            name: "Supabase".into(),
            website: "https://supabase.com".into(),
            description: "Postgres development platform".into(),
            pricing_model: PricingModel::Freemium,
            is_open_source: Some(true),
            language_support: vec!["JavaScript".into(), "Dart".into()],
            integration_capabilities: vec!["GitHub".into()],
            ..Default::default()
        };

        let rendered = render_tool_blocks(&[full, degraded]);
        assert_eq!(
            rendered,
            "**Supabase**\n- Website: https://supabase.com\n- Pricing: Freemium\n- Open Source: Yes\n\
             - Description: Postgres development platform\n- Languages: JavaScript, Dart\n- Integrations: GitHub\n\n\
             **Neon**\n- Website: https://neon.tech\n- Pricing: Unknown\n- Open Source: Unknown\n\
             - Description: Serverless Postgres\n- Languages: N/A\n- Integrations: N/A"
        );
    }
}
