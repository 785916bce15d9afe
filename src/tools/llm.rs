use crate::models::ToolAnalysis;
use crate::tools::prompts;
use anyhow::Result;
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::openai;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SYNTHESIS_APOLOGY: &str = "Unable to generate recommendations. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    ExtractTools,
    AnalyzeTool,
    Synthesize,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub purpose: Purpose,
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// A hosted chat model. Errors are reported; [`InferenceClient`] absorbs them.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// OpenAI-compatible chat model through rig (Groq by default).
pub struct RigModel {
    client: openai::Client,
    model: String,
}

impl RigModel {
    pub fn new(api_key: &str, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client: openai::Client::from_url(api_key, base_url),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for RigModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&request.system)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build();
        let response = agent
            .prompt(request.user)
            .await
            .map_err(|e| anyhow::anyhow!("Prompt error: {}", e))?;
        Ok(response)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InferenceLimits {
    pub max_tools: usize,
    pub max_name_len: usize,
    pub extract_prompt_chars: usize,
    pub analyze_prompt_chars: usize,
}

impl Default for InferenceLimits {
    fn default() -> Self {
        Self {
            max_tools: 5,
            max_name_len: 50,
            extract_prompt_chars: 3000,
            analyze_prompt_chars: 2500,
        }
    }
}

/// The three model-backed capabilities the pipeline uses. Every method is
/// total and returns a usable value when the model fails.
#[derive(Clone)]
pub struct InferenceClient {
    model: Arc<dyn LanguageModel>,
    limits: InferenceLimits,
}

impl InferenceClient {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            limits: InferenceLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: InferenceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn extract_tool_names(&self, query: &str, content: &str) -> Vec<String> {
        let request = CompletionRequest {
            purpose: Purpose::ExtractTools,
            system: prompts::TOOL_EXTRACTION_SYSTEM.to_string(),
            user: prompts::tool_extraction_user(query, content, self.limits.extract_prompt_chars),
            temperature: 0.1,
            max_tokens: 500,
        };
        match self.model.complete(request).await {
            Ok(text) => parse_tool_names(&text, self.limits.max_tools, self.limits.max_name_len),
            Err(e) => {
                warn!("Tool extraction error: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn analyze_tool(&self, tool_name: &str, content: &str) -> ToolAnalysis {
        let request = CompletionRequest {
            purpose: Purpose::AnalyzeTool,
            system: prompts::TOOL_ANALYSIS_SYSTEM.to_string(),
            user: prompts::tool_analysis_user(tool_name, content, self.limits.analyze_prompt_chars),
            temperature: 0.1,
            max_tokens: 800,
        };
        let text = match self.model.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Analysis error for {}: {:#}", tool_name, e);
                return ToolAnalysis::unknown(tool_name);
            }
        };

        match parse_analysis(&text) {
            Some(mut analysis) => {
                if analysis.description.trim().is_empty() {
                    analysis.description = ToolAnalysis::unknown(tool_name).description;
                }
                analysis
            }
            None => {
                debug!("unparseable analysis for {}: {}", tool_name, text);
                ToolAnalysis::unknown(tool_name)
            }
        }
    }

    pub async fn synthesize_recommendations(&self, query: &str, tools_data: &str) -> String {
        let request = CompletionRequest {
            purpose: Purpose::Synthesize,
            system: prompts::RECOMMENDATIONS_SYSTEM.to_string(),
            user: prompts::recommendations_user(query, tools_data),
            temperature: 0.3,
            max_tokens: 1000,
        };
        match self.model.complete(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => SYNTHESIS_APOLOGY.to_string(),
            Err(e) => {
                warn!("Recommendations error: {:#}", e);
                SYNTHESIS_APOLOGY.to_string()
            }
        }
    }
}

/// One product name per line; list markers, numbering and emphasis removed.
pub fn parse_tool_names(text: &str, max_tools: usize, max_name_len: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in text.lines() {
        let name = clean_name_line(line);
        if name.is_empty() || name.chars().count() >= max_name_len || name.ends_with(':') {
            continue;
        }
        if names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            continue;
        }
        names.push(name);
        if names.len() == max_tools {
            break;
        }
    }
    names
}

fn clean_name_line(line: &str) -> String {
    let mut s = line.trim();
    s = s.trim_start_matches(['-', '*', '•', '+', '>']).trim_start();

    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(stripped) = rest.strip_prefix(['.', ')', ':']) {
            s = stripped.trim_start();
        }
    }

    s.trim_matches(|c: char| c == '*' || c == '`' || c == '"' || c == '_')
        .trim()
        .to_string()
}

/// Two-phase decode: the whole (unfenced) text, then the first balanced
/// `{...}` span. `None` when neither decodes.
pub fn parse_analysis(text: &str) -> Option<ToolAnalysis> {
    let body = strip_code_fence(text);
    if let Ok(analysis) = serde_json::from_str::<ToolAnalysis>(body) {
        return Some(analysis);
    }
    let candidate = first_balanced_object(body).or_else(|| first_balanced_object(text))?;
    serde_json::from_str::<ToolAnalysis>(candidate).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // drop the info string (e.g. `json`) on the opening line
    match rest.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => rest
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim(),
    }
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
