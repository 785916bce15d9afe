use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, warn};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_PAGE_CHARS: usize = 5000;

const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "form", "button", "iframe",
    "noscript", "svg", "video", "audio", "picture", "object", "embed", "canvas",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "blockquote", "pre", "figcaption", "dt", "dd", "ul", "ol", "table",
];

/// Turns a URL into bounded plain text. Never fails: any problem is `None`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        // Best-effort reads of public marketing pages; broken certificates are tolerated.
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(true)
            .build()
            .context("failed to build page fetch client")?;

        Ok(Self { client, max_chars })
    }

    async fn fetch_html(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("non-success status")?;
        response.text().await.context("failed to read body")
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.fetch_html(url).await {
            Ok(html) => {
                let text = html_to_text(&html, self.max_chars);
                debug!(chars = text.chars().count(), "fetched {}", url);
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                warn!("fetch failed for {}: {:#}", url, e);
                None
            }
        }
    }
}

/// Reduce an HTML document to plain text, preferring the main content region.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let doc = Html::parse_document(html);

    let region = content_region(&doc);
    let mut buf = String::new();
    match region {
        Some(el) => collect_text(el, &mut buf),
        None => {
            for text in doc.root_element().text() {
                buf.push_str(text);
                buf.push('\n');
            }
        }
    }

    let cleaned = buf
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&cleaned, max_chars)
}

fn content_region(doc: &Html) -> Option<ElementRef<'_>> {
    for tag in ["main", "article"] {
        if let Ok(sel) = Selector::parse(tag) {
            if let Some(el) = doc.select(&sel).next() {
                return Some(el);
            }
        }
    }

    if let Ok(sel) = Selector::parse("[class]") {
        let by_class = doc.select(&sel).find(|el| {
            let class = el.value().attr("class").unwrap_or_default().to_ascii_lowercase();
            ["content", "main", "article"].iter().any(|hint| class.contains(hint))
                && !SKIP_TAGS.contains(&el.value().name())
                && !inside_skipped(el)
        });
        if by_class.is_some() {
            return by_class;
        }
    }

    Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
}

fn inside_skipped(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| SKIP_TAGS.contains(&a.value().name()))
}

fn collect_text(node: ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, buf);
                }
                if block {
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Truncate on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

pub fn domain_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::Html as HtmlBody, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[test]
    fn prefers_main_and_strips_noise() {
        let html = r#"<html><head><style>body{}</style></head><body>
            <nav>Home | Pricing</nav>
            <main><h1>Neon</h1><p>Serverless   Postgres
            with branching.</p><script>track()</script><form>Sign up</form></main>
            <footer>© Neon</footer></body></html>"#;
        let text = html_to_text(html, 5000);
        assert_eq!(text, "Neon\nServerless Postgres\nwith branching.");
    }

    #[test]
    fn falls_back_to_content_class_then_body() {
        let html = r#"<body><div class="sidebar">Links</div>
            <div class="page-content"><p>Actual docs</p></div></body>"#;
        assert_eq!(html_to_text(html, 5000), "Actual docs");

        let html = r#"<body><header><div class="header-content">Logo Menu Login</div></header>
            <div class="page-content"><p>Real product docs</p></div></body>"#;
        assert_eq!(html_to_text(html, 5000), "Real product docs");

        let html = "<body><p>Just a body</p><iframe>ad</iframe></body>";
        assert_eq!(html_to_text(html, 5000), "Just a body");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 50), "short");
        let html = format!("<main><p>{}</p></main>", "é".repeat(6000));
        assert_eq!(html_to_text(&html, DEFAULT_PAGE_CHARS).chars().count(), DEFAULT_PAGE_CHARS);
    }

    #[test]
    fn extracts_domain() {
        assert_eq!(domain_of("https://docs.neon.tech/intro").as_deref(), Some("docs.neon.tech"));
        assert_eq!(domain_of("not a url"), None);
    }

    #[tokio::test]
    async fn fetches_follows_redirects_and_absorbs_failures() {
        let app = Router::new()
            .route(
                "/page",
                get(|| async { HtmlBody("<html><body><article><p>Jotai primitives</p></article></body></html>") }),
            )
            .route(
                "/moved",
                get(|| async { axum::response::Redirect::permanent("/page") }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        let addr = serve(app).await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5), DEFAULT_PAGE_CHARS).unwrap();
        assert_eq!(
            fetcher.fetch(&format!("http://{addr}/moved")).await.as_deref(),
            Some("Jotai primitives")
        );
        assert_eq!(fetcher.fetch(&format!("http://{addr}/missing")).await, None);
        assert_eq!(fetcher.fetch("http://127.0.0.1:1/unreachable").await, None);
    }
}
