use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The state threaded through the three pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchState {
    pub query: String,
    pub extracted_tools: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub companies: Vec<ToolRecord>,
    pub analysis: Option<String>,
    pub error: Option<String>,
    pub stage_times_ms: HashMap<String, u64>,
}

impl ResearchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Merges a stage's partial update. Fields left as `None` in the update
    /// keep their current value; set fields overwrite.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(tools) = update.extracted_tools {
            self.extracted_tools = tools;
        }
        if let Some(results) = update.search_results {
            self.search_results = results;
        }
        if let Some(companies) = update.companies {
            self.companies = companies;
        }
        if let Some(analysis) = update.analysis {
            self.analysis = Some(analysis);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
    }
}

/// Partial update produced by a single stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub extracted_tools: Option<Vec<String>>,
    pub search_results: Option<Vec<SearchResult>>,
    pub companies: Option<Vec<ToolRecord>>,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PricingModel {
    Free,
    Freemium,
    Paid,
    Enterprise,
    #[default]
    Unknown,
}

impl PricingModel {
    /// Case-insensitive; anything outside the known buckets is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "free" => Self::Free,
            "freemium" => Self::Freemium,
            "paid" => Self::Paid,
            "enterprise" => Self::Enterprise,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Freemium => "Freemium",
            Self::Paid => "Paid",
            Self::Enterprise => "Enterprise",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for PricingModel {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<PricingModel> for String {
    fn from(pricing: PricingModel) -> Self {
        pricing.as_str().to_string()
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured facts about one researched tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    pub website: String,
    pub description: String,
    pub pricing_model: PricingModel,
    pub is_open_source: Option<bool>,
    pub tech_stack: Vec<String>,
    pub language_support: Vec<String>,
    pub integration_capabilities: Vec<String>,
    pub api_available: Option<bool>,
}

impl ToolRecord {
    pub fn from_analysis(name: &str, website: &str, analysis: ToolAnalysis) -> Self {
        Self {
            name: name.to_string(),
            website: website.to_string(),
            description: analysis.description,
            pricing_model: analysis.pricing_model,
            is_open_source: analysis.is_open_source,
            tech_stack: analysis.tech_stack,
            language_support: analysis.language_support,
            integration_capabilities: analysis.integration_capabilities,
            api_available: analysis.api_available,
        }
    }

    /// Record built from search data alone, when the site could not be analyzed.
    pub fn degraded(name: &str, website: &str, snippet: &str) -> Self {
        let description = if snippet.trim().is_empty() {
            placeholder_description(name)
        } else {
            snippet.trim().to_string()
        };
        Self {
            name: name.to_string(),
            website: website.to_string(),
            description,
            ..Default::default()
        }
    }
}

pub fn placeholder_description(name: &str) -> String {
    format!("{name} - developer tool")
}

/// Best-effort model output for a single tool. Every field tolerates being
/// missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub pricing_model: PricingModel,
    pub is_open_source: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub api_available: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub language_support: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub integration_capabilities: Vec<String>,
}

impl ToolAnalysis {
    pub fn unknown(tool_name: &str) -> Self {
        Self {
            description: placeholder_description(tool_name),
            ..Default::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub website: String,
    pub description: String,
    pub pricing_model: Option<String>,
    pub is_open_source: Option<bool>,
    pub language_support: Vec<String>,
    pub integrations: Vec<String>,
}

impl From<&ToolRecord> for ToolSummary {
    fn from(record: &ToolRecord) -> Self {
        Self {
            name: record.name.clone(),
            website: record.website.clone(),
            description: record.description.clone(),
            pricing_model: Some(record.pricing_model.to_string()),
            is_open_source: record.is_open_source,
            language_support: record.language_support.clone(),
            integrations: record.integration_capabilities.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub id: String,
    pub query: String,
    pub tools: Vec<ToolSummary>,
    pub recommendations: String,
    pub timestamp: String,
    pub stage_times_ms: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub llm_configured: bool,
    pub search_backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchRequest {
    pub query: String,
    pub max_results: usize,
    pub search_depth: String,
    pub include_raw_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_labels_normalize_case_insensitively() {
        assert_eq!(PricingModel::from_label(" freemium "), PricingModel::Freemium);
        assert_eq!(PricingModel::from_label("ENTERPRISE"), PricingModel::Enterprise);
        assert_eq!(PricingModel::from_label(""), PricingModel::Unknown);
        assert_eq!(PricingModel::from_label("Usage-based"), PricingModel::Unknown);

        let analysis: ToolAnalysis =
            serde_json::from_str(r#"{"pricing_model": "Open Core"}"#).unwrap();
        assert_eq!(analysis.pricing_model, PricingModel::Unknown);
        assert_eq!(serde_json::to_value(&analysis.pricing_model).unwrap(), "Unknown");
    }

    #[test]
    fn analysis_tolerates_nulls_and_missing_fields() {
        let analysis: ToolAnalysis = serde_json::from_str(
            r#"{"pricing_model": null, "tech_stack": null, "is_open_source": true}"#,
        )
        .unwrap();
        assert_eq!(analysis.pricing_model, PricingModel::Unknown);
        assert!(analysis.tech_stack.is_empty());
        assert!(analysis.language_support.is_empty());
        assert_eq!(analysis.is_open_source, Some(true));
    }

    #[test]
    fn apply_overwrites_only_set_fields() {
        let mut state = ResearchState::new("q");
        state.apply(StateUpdate {
            extracted_tools: Some(vec!["A".into()]),
            error: Some("thin".into()),
            ..Default::default()
        });
        state.apply(StateUpdate {
            analysis: Some("done".into()),
            ..Default::default()
        });
        assert_eq!(state.extracted_tools, vec!["A".to_string()]);
        assert_eq!(state.error.as_deref(), Some("thin"));
        assert_eq!(state.analysis.as_deref(), Some("done"));
        assert_eq!(state.query, "q");
    }

    #[test]
    fn degraded_record_falls_back_to_placeholder() {
        let record = ToolRecord::degraded("Neon", "https://neon.tech", "  ");
        assert_eq!(record.description, "Neon - developer tool");
        assert_eq!(record.pricing_model, PricingModel::Unknown);
        assert!(record.tech_stack.is_empty());
        assert_eq!(record.is_open_source, None);
    }
}
