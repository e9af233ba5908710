//! Thin HTTP layer shared by the resolvers.
//!
//! One attempt per call: no retry, no backoff, no timeout beyond the
//! client defaults. Callers decide what a failure means.

use crate::error::{CacheError, Result};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// `Accept` header for JSON APIs
pub const ACCEPT_JSON: &str = "application/json";

/// `Accept` header for DOI content negotiation
pub const ACCEPT_CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// `Accept` header for landing pages
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// A fetched HTML page and the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub body: String,
}

/// Shared HTTP client. Redirects are followed.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| CacheError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        debug!(url = %url, accept = accept, "GET");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// GET `url` and parse the body as JSON.
    pub async fn get_json(&self, url: &str, accept: &str) -> Result<Value> {
        let body = self.get(url, accept).await?.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CacheError::Parse(format!("Invalid JSON from {}: {}", url, e)))
    }

    /// GET an HTML page, following redirects.
    pub async fn get_page(&self, url: &str) -> Result<Page> {
        let response = self.get(url, ACCEPT_HTML).await?;
        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok(Page {
            url: final_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_get_json_success_and_status_error() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/ok")
            .match_header("accept", ACCEPT_JSON)
            .with_status(200)
            .with_body(r#"{"a": 1}"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = Fetcher::new("test-agent").expect("client");
        let value = fetcher
            .get_json(&format!("{}/ok", server.url()), ACCEPT_JSON)
            .await
            .expect("json");
        assert_eq!(value["a"], 1);

        let err = fetcher
            .get_json(&format!("{}/missing", server.url()), ACCEPT_JSON)
            .await;
        assert!(matches!(err, Err(CacheError::Http { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_get_json_rejects_non_json() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/html")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let fetcher = Fetcher::new("test-agent").expect("client");
        let err = fetcher
            .get_json(&format!("{}/html", server.url()), ACCEPT_JSON)
            .await;
        assert!(matches!(err, Err(CacheError::Parse(_))));
    }

    #[tokio::test]
    async fn test_get_page_follows_redirects() {
        let mut server = Server::new_async().await;
        let _redirect = server
            .mock("GET", "/start")
            .with_status(302)
            .with_header("location", "/records/42")
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/records/42")
            .with_status(200)
            .with_body("<title>done</title>")
            .create_async()
            .await;

        let fetcher = Fetcher::new("test-agent").expect("client");
        let page = fetcher
            .get_page(&format!("{}/start", server.url()))
            .await
            .expect("page");
        assert_eq!(page.url.path(), "/records/42");
        assert!(page.body.contains("done"));
    }
}
