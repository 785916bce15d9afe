use crate::models::ResearchState;
use crate::tasks::{
    ResearchToolkit, SynthesisTask, ToolDiscoveryTask, ToolResearchTask, NO_TOOLS_MESSAGE,
    STAGE_TIMES_KEY, STATE_KEY,
};
use anyhow::{anyhow, bail, Context as _};
use graph_flow::{
    ExecutionStatus, FlowRunner, GraphBuilder, InMemorySessionStorage, Session, SessionStorage,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Discovery -> Research -> Synthesis over a fixed graph. Each `run` gets its
/// own session, so concurrent runs share no state.
pub struct ResearchPipeline {
    runner: FlowRunner,
    storage: Arc<dyn SessionStorage>,
    deadline: Option<Duration>,
}

impl ResearchPipeline {
    pub fn new(toolkit: ResearchToolkit) -> Self {
        let toolkit = Arc::new(toolkit);
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());

        let graph = GraphBuilder::new("devtools_research")
            .add_task(Arc::new(ToolDiscoveryTask::new(toolkit.clone())))
            .add_task(Arc::new(ToolResearchTask::new(toolkit.clone())))
            .add_task(Arc::new(SynthesisTask::new(toolkit)))
            .add_edge(ToolDiscoveryTask::ID, ToolResearchTask::ID)
            .add_edge(ToolResearchTask::ID, SynthesisTask::ID)
            .build();

        Self {
            runner: FlowRunner::new(Arc::new(graph), storage.clone()),
            storage,
            deadline: None,
        }
    }

    /// Bound the whole run; on expiry a degraded state is returned.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run the research workflow. Never fails: collaborator and workflow
    /// errors end up as a degraded, renderable state.
    #[instrument(skip(self))]
    pub async fn run(&self, query: &str) -> ResearchState {
        let started = std::time::Instant::now();
        let session_id = Uuid::new_v4().to_string();
        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.execute(&session_id, query))
                .await
                .unwrap_or_else(|_| Err(anyhow!("research timed out after {:?}", deadline))),
            None => self.execute(&session_id, query).await,
        };
        if let Err(e) = self.storage.delete(&session_id).await {
            warn!("failed to drop session {}: {}", session_id, e);
        }

        match outcome {
            Ok(state) => {
                info!(
                    tools = state.companies.len(),
                    "Workflow completed in {:?}",
                    started.elapsed()
                );
                state
            }
            Err(e) => {
                error!("Workflow failed for '{}': {:#}", query, e);
                let mut state = ResearchState::new(query);
                state.error = Some(format!("{e:#}"));
                state.analysis = Some(NO_TOOLS_MESSAGE.to_string());
                state
            }
        }
    }

    async fn execute(&self, session_id: &str, query: &str) -> anyhow::Result<ResearchState> {
        let session = Session::new_from_task(session_id.to_string(), ToolDiscoveryTask::ID);
        session.context.set(STATE_KEY, ResearchState::new(query)).await;
        self.storage
            .save(session)
            .await
            .context("failed to save research session")?;

        loop {
            let result = self
                .runner
                .run(session_id)
                .await
                .context("workflow step failed")?;

            match &result.status {
                ExecutionStatus::Completed => break,
                ExecutionStatus::Paused { next_task_id, .. } => {
                    info!("Workflow paused, next task: {}", next_task_id);
                    continue;
                }
                ExecutionStatus::Error(e) => bail!("workflow error: {}", e),
                #[allow(unreachable_patterns)]
                _ => bail!("workflow stopped waiting for input"),
            }
        }

        let session = self
            .storage
            .get(session_id)
            .await
            .context("failed to load research session")?
            .ok_or_else(|| anyhow!("research session {} disappeared", session_id))?;

        let mut state: ResearchState = session
            .context
            .get(STATE_KEY)
            .await
            .ok_or_else(|| anyhow!("research state missing from session"))?;
        state.stage_times_ms = session.context.get(STAGE_TIMES_KEY).await.unwrap_or_default();
        Ok(state)
    }
}
