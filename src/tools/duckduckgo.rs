use crate::models::SearchResult;
use crate::tools::fetcher::BROWSER_USER_AGENT;
use crate::tools::search::SearchProvider;
use anyhow::Context;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use std::time::Duration;

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Keyless search via the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build DuckDuckGo HTTP client")?;
        Ok(Self {
            endpoint: DUCKDUCKGO_HTML_URL.to_string(),
            client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let html = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("kl", "wt-wt")])
            .send()
            .await
            .context("DuckDuckGo request failed")?
            .error_for_status()
            .context("DuckDuckGo returned an error status")?
            .text()
            .await
            .context("failed to read DuckDuckGo response body")?;

        Ok(parse_results(&html, max_results))
    }
}

/// Parse the result blocks of a DuckDuckGo HTML page.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    doc.select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let title = link.text().collect::<String>().trim().to_string();
            let url = unwrap_redirect(link.value().attr("href").unwrap_or_default());
            if title.is_empty() || !url.starts_with("http") {
                return None;
            }
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            Some(SearchResult { title, url, snippet })
        })
        .take(max_results)
        .collect()
}

/// Result links are wrapped as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn unwrap_redirect(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + "uddg=".len();
        let end = href[start..].find('&').map_or(href.len(), |i| start + i);
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            return percent_decode_str(encoded).decode_utf8_lossy().into_owned();
        }
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html><body>
  <div class="result results_links web-result">
    <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fredux.js.org%2F&amp;rut=abc">Redux - A JS library</a></h2>
    <a class="result__snippet" href="#">A predictable state container for JS apps.</a>
  </div>
  <div class="result">
    <h2><a class="result__a" href="https://zustand-demo.pmnd.rs/">Zustand</a></h2>
    <div class="result__snippet">Bear necessities for state management.</div>
  </div>
  <div class="result result--ad">
    <h2><a class="result__a" href="/y.js?ad=1">Sponsored</a></h2>
  </div>
</body></html>"##;

    #[test]
    fn parses_titles_urls_and_snippets() {
        let results = parse_results(PAGE, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Redux - A JS library");
        assert_eq!(results[0].url, "https://redux.js.org/");
        assert_eq!(results[0].snippet, "A predictable state container for JS apps.");
        assert_eq!(results[1].url, "https://zustand-demo.pmnd.rs/");
    }

    #[test]
    fn respects_max_results() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results("<html></html>", 3).is_empty());
    }
}
