use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    DuckDuckGo,
    Tavily,
}

impl SearchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "duckduckgo",
            Self::Tavily => "tavily",
        }
    }
}

impl FromStr for SearchBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(Self::DuckDuckGo),
            "tavily" => Ok(Self::Tavily),
            other => bail!("unknown SEARCH_BACKEND '{other}' (expected duckduckgo or tavily)"),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub search_backend: SearchBackend,
    pub tavily_api_key: Option<String>,
    pub fetch_timeout: Duration,
    pub pipeline_timeout: Option<Duration>,
    pub result_cache_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables. A missing model
    /// credential is fatal here so no request is ever served without one.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let llm_api_key = ["LLM_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .find_map(|key| var(key).filter(|v| !v.trim().is_empty()))
            .context("LLM_API_KEY (or GROQ_API_KEY / OPENAI_API_KEY) must be set")?;

        let search_backend: SearchBackend = var("SEARCH_BACKEND")
            .unwrap_or_else(|| "duckduckgo".to_string())
            .parse()?;

        let tavily_api_key = var("TAVILY_API_KEY").filter(|v| !v.is_empty());
        if search_backend == SearchBackend::Tavily && tavily_api_key.is_none() {
            bail!("TAVILY_API_KEY must be set when SEARCH_BACKEND=tavily");
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            llm_api_key,
            llm_base_url: var("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            search_backend,
            tavily_api_key,
            fetch_timeout: Duration::from_secs(
                var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .context("FETCH_TIMEOUT_SECS must be a number of seconds")?,
            ),
            pipeline_timeout: var("PIPELINE_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("PIPELINE_TIMEOUT_SECS must be a number of seconds")?
                .map(Duration::from_secs),
            result_cache_capacity: var("RESULT_CACHE_CAPACITY")
                .unwrap_or_else(|| "1000".to_string())
                .parse()
                .context("RESULT_CACHE_CAPACITY must be a valid number")?,
        })
    }
}
