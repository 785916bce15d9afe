use crate::models::SearchResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A raw web search backend. Implementations may fail; the gateway absorbs it.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>>;
}

/// Total wrapper over a [`SearchProvider`]: any provider failure becomes an
/// empty result list.
#[derive(Clone)]
pub struct SearchGateway {
    provider: Arc<dyn SearchProvider>,
}

impl SearchGateway {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.provider.search(query, max_results).await {
            Ok(mut results) => {
                results.truncate(max_results);
                debug!(
                    provider = self.provider.name(),
                    count = results.len(),
                    "search completed for '{}'",
                    query
                );
                results
            }
            Err(e) => {
                warn!(provider = self.provider.name(), "search failed for '{}': {:#}", query, e);
                Vec::new()
            }
        }
    }

    /// Search for comparison articles about the query.
    pub async fn search_for_tools(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let enhanced = format!("{query} developer tools comparison best 2024");
        self.search(&enhanced, max_results).await
    }

    /// Narrow search for a tool's official site; at most one result.
    pub async fn search_official_site(&self, tool_name: &str) -> Option<SearchResult> {
        let query = format!("{tool_name} official site documentation");
        self.search(&query, 1).await.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProvider {
        queries: Mutex<Vec<(String, usize)>>,
        fail: bool,
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push((query.to_string(), max_results));
            if self.fail {
                anyhow::bail!("quota exceeded");
            }
            Ok((0..10)
                .map(|i| SearchResult {
                    title: format!("Result {i}"),
                    url: format!("https://example.com/{i}"),
                    snippet: String::new(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn provider_errors_become_empty_results() {
        let provider = Arc::new(RecordingProvider { queries: Mutex::new(vec![]), fail: true });
        let gateway = SearchGateway::new(provider);
        assert!(gateway.search("anything", 5).await.is_empty());
        assert!(gateway.search_official_site("Neon").await.is_none());
    }

    #[tokio::test]
    async fn specialised_queries_are_augmented_and_bounded() {
        let provider = Arc::new(RecordingProvider { queries: Mutex::new(vec![]), fail: false });
        let gateway = SearchGateway::new(provider.clone());

        let results = gateway.search_for_tools("best database", 3).await;
        assert_eq!(results.len(), 3);

        let site = gateway.search_official_site("Neon").await.unwrap();
        assert_eq!(site.url, "https://example.com/0");

        let queries = provider.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![
                ("best database developer tools comparison best 2024".to_string(), 3),
                ("Neon official site documentation".to_string(), 1),
            ]
        );
    }
}
