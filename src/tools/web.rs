use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::html::{collapse_blank_lines, html_to_markdown};
use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};

/// Fetch a page and convert it to markdown.
///
/// Request failures (connection errors, non-2xx statuses) come back as a
/// string starting with `Error fetching the webpage:` so the caller can keep
/// going.
pub async fn fetch_and_convert(client: &Client, url: &str) -> String {
    match fetch_page(client, url).await {
        Ok(html) => {
            let markdown = collapse_blank_lines(html_to_markdown(&html).trim());
            debug!(url, bytes = markdown.len(), "fetched webpage");
            markdown
        }
        Err(e) => {
            warn!(url, error = %e, "failed to fetch webpage");
            format!("Error fetching the webpage: {}", e)
        }
    }
}

async fn fetch_page(client: &Client, url: &str) -> reqwest::Result<String> {
    client.get(url).send().await?.error_for_status()?.text().await
}

/// Tool for visiting a webpage
pub struct VisitWebpageTool {
    client: Client,
    descriptor: ToolDescriptor,
}

impl VisitWebpageTool {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            descriptor: ToolDescriptor::new(
                "visit_webpage",
                "Visits a webpage at the given URL and returns its content as a markdown string.",
            )
            .param("url", ParamKind::String, "The URL of the webpage to visit.")
            .returns(
                ReturnKind::Text,
                "The content of the webpage converted to Markdown, or an error message if the request fails.",
            ),
        }
    }
}

#[async_trait]
impl Tool for VisitWebpageTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let url = args.str("url")?;
        Ok(Value::String(fetch_and_convert(&self.client, url).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn converts_html_and_collapses_blank_lines() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<h1>News</h1><p>first</p>\n\n\n\n\n<p>second</p>"),
            )
            .mount(&server)
            .await;

        let body = fetch_and_convert(&Client::new(), &format!("{}/article", server.uri())).await;

        assert_eq!(body, "# News\n\nfirst\n\nsecond");
        assert!(!body.contains("\n\n\n"));
    }

    #[tokio::test]
    async fn http_error_status_becomes_error_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let body = fetch_and_convert(&Client::new(), &format!("{}/missing", server.uri())).await;

        assert!(body.starts_with("Error fetching the webpage:"));
        assert!(body.contains("404"));
    }

    #[tokio::test]
    async fn connection_failure_becomes_error_string() {
        // Bind then drop a listener to get a port nothing is serving on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let body = fetch_and_convert(&Client::new(), &format!("http://127.0.0.1:{}/", port)).await;
        assert!(body.starts_with("Error fetching the webpage:"));
    }

    #[tokio::test]
    async fn tool_returns_markdown_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
            .mount(&server)
            .await;

        let tool = VisitWebpageTool::new(Client::new());
        let result = tool
            .execute(&Arguments::from_json(json!({"url": server.uri()})))
            .await
            .unwrap();
        assert_eq!(result, Value::String("hello".to_string()));
    }
}
