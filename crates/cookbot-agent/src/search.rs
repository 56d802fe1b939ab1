//! Web search enrichment
//!
//! Search never fails loudly: every outcome, including errors, is text that
//! can be pasted into a prompt.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::env;
use tracing::{debug, instrument, warn};

/// Google Custom Search JSON API endpoint
pub const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Text returned when search is not configured
pub const NO_SEARCH_DATA: &str = "No search data available.";

/// Source of search snippets (allows mocking in tests)
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Whether calls can reach a real search engine
    fn is_configured(&self) -> bool;

    /// Newline-joined snippets for `query`, or a readable error message
    async fn search(&self, query: &str, count: usize) -> String;
}

/// Run `queries` concurrently; results are sectioned per query, in query order
pub async fn search_all(provider: &dyn SearchProvider, queries: &[String], count: usize) -> String {
    let results = join_all(queries.iter().map(|q| provider.search(q, count))).await;
    queries
        .iter()
        .zip(results)
        .map(|(query, result)| format!("\n--- RESULTS FOR '{}' ---\n{}\n", query, result))
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Google Custom Search client
#[derive(Clone)]
pub struct GoogleSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    cx: Option<String>,
}

impl std::fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl GoogleSearch {
    pub fn new(api_key: Option<String>, cx: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: GOOGLE_SEARCH_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cx: cx.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Read the key and engine id from the named environment variables
    pub fn from_env(api_key_env: &str, cx_env: &str) -> Self {
        Self::new(env::var(api_key_env).ok(), env::var(cx_env).ok())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn join_snippets(query: &str, response: SearchResponse) -> String {
    let snippets: Vec<String> = response.items.into_iter().map(|item| item.snippet).collect();
    if snippets.is_empty() {
        return format!("No results for query: '{}'", query);
    }
    snippets.join("\n")
}

fn server_error_message(body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "no details".to_string());
    format!("Search server error: {}", detail)
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.cx.is_some()
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> String {
        let (Some(api_key), Some(cx)) = (&self.api_key, &self.cx) else {
            warn!("Search requested without GOOGLE_API_KEY/GOOGLE_CX");
            return NO_SEARCH_DATA.to_string();
        };

        let num = count.clamp(1, 10).to_string();
        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", cx.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Search transport error: {}", e);
                return format!("Search failed for query: {}", query);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Search API returned {}", status);
            return server_error_message(&body);
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => {
                debug!("Search returned {} item(s)", parsed.items.len());
                join_snippets(query, parsed)
            }
            Err(e) => {
                warn!("Search response unreadable: {}", e);
                format!("Search failed for query: {}", query)
            }
        }
    }
}
