//! Web search tool - DuckDuckGo HTML results (no API key required)

use super::{int_arg, str_arg};
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition};
use crate::schema::{ParamSpec, ParamType};
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of search results to return
const MAX_RESULTS_CAP: i64 = 10;

/// Default number of results
const DEFAULT_MAX_RESULTS: i64 = 5;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// User-Agent header to avoid bot blocking
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("TITLE_RE is a compile-time constant")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)
        .expect("SNIPPET_RE is a compile-time constant")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("TAG_RE is a compile-time constant"));

/// A single search result entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

/// DuckDuckGo HTML-based web search tool.
pub struct WebSearchTool {
    definition: ToolDefinition,
    client: Client,
}

impl WebSearchTool {
    /// Create a new web search tool.
    pub fn new(timeout: Duration) -> Result<Self> {
        let definition = ToolDefinition::new(
            "web_search",
            "Search the web for current information. Returns titles, URLs and snippets.",
        )
        .with_category(ToolCategory::Search)
        .with_param(ParamSpec::required(
            "query",
            ParamType::String,
            "Search query string",
        ))
        .with_param(ParamSpec::optional(
            "max_results",
            ParamType::Integer,
            "Maximum number of results (1-10)",
            json!(DEFAULT_MAX_RESULTS),
        ));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { definition, client })
    }

    async fn fetch(&self, query: &str) -> Result<String> {
        debug!(query = %query, "Fetching DuckDuckGo search results");

        let response = self
            .client
            .post(SEARCH_URL)
            .header("Referer", "https://html.duckduckgo.com/")
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("search request: {}", e))
                } else {
                    Error::Network(format!("search connection failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("search returned HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let query = str_arg(&arguments, "query")?;
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let max_results =
            int_arg(&arguments, "max_results", DEFAULT_MAX_RESULTS).clamp(1, MAX_RESULTS_CAP);

        let html = self.fetch(query).await?;
        if html.contains("anomaly-modal") {
            warn!("DuckDuckGo returned CAPTCHA page");
            return Err(Error::Network(
                "search temporarily blocked by bot detection".to_string(),
            ));
        }

        let results = parse_search_results(&html, max_results as usize);

        Ok(json!({
            "query": query,
            "total": results.len(),
            "results": results,
        }))
    }
}

/// Parse search results from DuckDuckGo HTML.
fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let snippets: Vec<String> = SNIPPET_RE
        .captures_iter(html)
        .map(|cap| strip_html_tags(cap.get(1).map_or("", |m| m.as_str())))
        .collect();

    TITLE_RE
        .captures_iter(html)
        .enumerate()
        .map(|(i, cap)| SearchResult {
            url: extract_real_url(cap.get(1).map_or("", |m| m.as_str())),
            title: strip_html_tags(cap.get(2).map_or("", |m| m.as_str())),
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .filter(|r| !r.url.is_empty() && !r.title.is_empty())
        .take(max_results)
        .collect()
}

/// DuckDuckGo wraps URLs in a redirect: `//duckduckgo.com/l/?uddg=REAL_URL&...`
fn extract_real_url(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| raw.to_string())
}

/// Remove HTML tags and decode common HTML entities.
fn strip_html_tags(s: &str) -> String {
    TAG_RE
        .replace_all(s, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<b>rust</b> async"), "rust async");
        assert_eq!(strip_html_tags("a &amp; b"), "a & b");
    }

    #[test]
    fn test_extract_real_url() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Ftokio.rs%2Fblog&rut=abc";
        assert_eq!(extract_real_url(raw), "https://tokio.rs/blog");
        assert_eq!(extract_real_url("https://docs.rs"), "https://docs.rs");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let html = r#"
            <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example">First</a>
            <a class="result__snippet">Snippet <b>one</b></a>
            <a rel="nofollow" class="result__a" href="https://b.example">Second</a>
            <a class="result__snippet">Snippet two</a>
        "#;

        let results = parse_search_results(html, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://a.example");
        assert_eq!(results[0].snippet, "Snippet one");

        let limited = parse_search_results(html, 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].title, "First");
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let tool = WebSearchTool::new(Duration::from_secs(1)).unwrap();
        let mut arguments = Map::new();
        arguments.insert("query".into(), json!("   "));
        let err = tool.execute(arguments).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
