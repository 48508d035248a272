// ABOUTME: ScrapeTool - fetches a web page, extracts readable text, and
// ABOUTME: summarizes it through the model's generate endpoint.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::OllamaClient;
use crate::tool::{Tool, ToolResult};

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_CONTENT_LEN: usize = 50_000;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; relay/0.3)";

/// Elements whose contents are never readable page text.
const SKIP_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript",
];

/// Tool that scrapes a URL and summarizes its main content.
pub struct ScrapeTool {
    llm: Arc<OllamaClient>,
    http: reqwest::Client,
}

impl ScrapeTool {
    /// Create a new scrape tool summarizing through the given client.
    pub fn new(llm: Arc<OllamaClient>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SCRAPE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { llm, http }
    }

    /// Extract readable text from an HTML document.
    fn extract_text(html: &str) -> String {
        let mut content = html.to_string();

        for tag in SKIP_ELEMENTS {
            strip_element(&mut content, tag);
        }

        // Strip remaining tags.
        let mut text = String::with_capacity(content.len());
        let mut in_tag = false;
        for ch in content.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => text.push(ch),
                _ => {}
            }
        }

        let text = text
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'");

        static WHITESPACE: OnceLock<Regex> = OnceLock::new();
        let ws = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
        ws.replace_all(&text, " ").trim().to_string()
    }

    async fn summarize(&self, text: &str, url: &str) -> Result<String, crate::error::LlmError> {
        let prompt = format!(
            "Summarize the main topics and ideas from this webpage in 2-3 concise bullet points.\n\n\
             URL: {url}\n\nContent:\n{text}\n\nProvide only the summary, no preamble:"
        );
        self.llm.generate(&prompt).await
    }
}

/// Remove every `<tag ...>...</tag>` block from the document.
fn strip_element(html: &mut String, tag: &str) {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    while let Some(start) = html.find(&open) {
        match html[start..].find(&close) {
            Some(rel_end) => {
                html.replace_range(start..start + rel_end + close.len(), "");
            }
            None => break,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{cut}...")
}

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        "scrape"
    }

    fn description(&self) -> &str {
        "Scrape a website and summarize its main content.

Input: A URL
Output: A concise summary of the main topics/ideas on the page

Use this to quickly understand what a webpage is about without reading the whole thing."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the webpage to scrape and summarize"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            url: String,
        }
        let params: Params = serde_json::from_value(params)?;
        if params.url.is_empty() {
            anyhow::bail!("url is required");
        }

        let url = if params.url.starts_with("http://") || params.url.starts_with("https://") {
            params.url
        } else {
            format!("https://{}", params.url)
        };

        debug!(url = %url, "scrape fetch");

        let response = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => return Ok(ToolResult::error(format!("Failed to fetch URL: {e}"))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(ToolResult::error(format!("Failed to read response: {e}"))),
        };

        debug!(bytes = body.len(), "scrape fetched");

        let text = Self::extract_text(&body);
        if text.is_empty() {
            return Ok(ToolResult::text(
                "Could not extract text content from the page.",
            ));
        }

        let text = truncate_chars(&text, MAX_CONTENT_LEN);

        match self.summarize(&text, &url).await {
            Ok(summary) => Ok(ToolResult::text(summary)),
            Err(e) => {
                warn!(error = %e, "summarization failed");
                Ok(ToolResult::text(format!(
                    "Failed to summarize, here's the extracted text:\n\n{}",
                    truncate_chars(&text, 2_000)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let html = "<html><body><h1>Title</h1><p>Hello <b>world</b>!</p></body></html>";
        let text = ScrapeTool::extract_text(html);
        assert!(text.contains("Title"));
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_extract_text_skips_chrome_elements() {
        let html = "<html><script>alert('x')</script><nav>Menu</nav>\
                    <body>Content</body><footer>Legal</footer></html>";
        let text = ScrapeTool::extract_text(html);
        assert!(text.contains("Content"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("Legal"));
    }

    #[test]
    fn test_extract_text_decodes_entities() {
        let html = "&lt;tag&gt; &amp; &quot;quoted&quot;";
        let text = ScrapeTool::extract_text(html);
        assert!(text.contains("<tag>"));
        assert!(text.contains('&'));
        assert!(text.contains("\"quoted\""));
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<p>one</p>\n\n\n  <p>two</p>";
        assert_eq!(ScrapeTool::extract_text(html), "one two");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
