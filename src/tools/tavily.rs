use crate::models::{SearchResult, TavilySearchRequest, TavilySearchResponse};
use crate::tools::search::SearchProvider;
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone)]
pub struct TavilySearch {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build Tavily HTTP client")?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: TAVILY_ENDPOINT.to_string(),
            client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let request = TavilySearchRequest {
            query: query.to_string(),
            max_results,
            search_depth: "basic".to_string(),
            include_raw_content: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Tavily request failed")?
            .error_for_status()
            .context("Tavily returned an error status")?;

        let search_response: TavilySearchResponse = response
            .json()
            .await
            .context("failed to parse Tavily response")?;

        Ok(search_response
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}
