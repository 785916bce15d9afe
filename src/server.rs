use crate::models::{HealthResponse, ResearchRequest, ResearchResponse, ToolSummary};
use crate::pipeline::ResearchPipeline;
use crate::store::ResultStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};
use uuid::Uuid;

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 200;
const NO_RECOMMENDATIONS: &str = "No recommendations generated";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResearchPipeline>,
    pub store: Arc<dyn ResultStore>,
    pub search_backend: String,
    pub llm_configured: bool,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/examples", get(examples))
        .route("/research", post(research))
        .route("/research/:id", get(get_research))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Developer Tools Research API",
        "health": "/health",
        "examples": "/examples",
        "research": "POST /research",
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_configured: state.llm_configured,
        search_backend: state.search_backend.clone(),
    })
}

async fn examples() -> Json<Value> {
    Json(json!({
        "examples": [
            {"query": "best database for startups", "description": "Compare Supabase, PlanetScale, Neon"},
            {"query": "React state management libraries", "description": "Compare Redux, Zustand, Jotai"},
            {"query": "Python web frameworks 2024", "description": "Compare FastAPI, Django, Flask"},
            {"query": "free backend as a service", "description": "Compare Firebase alternatives"},
            {"query": "best CI/CD tools for small teams", "description": "Compare GitHub Actions, GitLab CI"},
        ]
    }))
}

pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let query = query.trim();
    let len = query.chars().count();
    if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&len) {
        return Err(ApiError::BadRequest(format!(
            "query must be between {MIN_QUERY_CHARS} and {MAX_QUERY_CHARS} characters (got {len})"
        )));
    }
    Ok(query)
}

#[instrument(skip(state, req))]
async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let query = validate_query(&req.query)?;
    let id = Uuid::new_v4().to_string();
    info!("Starting research {} for '{}'", id, query);

    let result = state.pipeline.run(query).await;

    let response = ResearchResponse {
        id,
        query: query.to_string(),
        tools: result.companies.iter().map(ToolSummary::from).collect(),
        recommendations: result
            .analysis
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| NO_RECOMMENDATIONS.to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
        stage_times_ms: result.stage_times_ms,
    };

    state.store.insert(response.clone());
    Ok(Json(response))
}

async fn get_research(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResearchResponse>, ApiError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Research not found".to_string()))
}
