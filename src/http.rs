//! Admin dashboard HTTP page source.
//!
//! Implements [`PageSource`] over a REST collection endpoint that understands
//! the standard list query string (`page`, `pageSize`, `search`, `sortBy`,
//! `sortOrder`, `filters[<key>]`). Authentication is the embedding app's
//! concern; callers attach whatever headers their interceptor would have set.

use crate::error::SourceError;
use crate::query::QueryParams;
use crate::source::{Page, PageSource};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for page fetches (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise a dashboard base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into an operator-readable message.
fn friendly_error(url: &str, err: &reqwest::Error) -> SourceError {
    if err.is_connect() {
        return SourceError::Network(format!("Cannot reach data source at {url}"));
    }
    if err.is_timeout() {
        return SourceError::Network(format!("Connection to {url} timed out"));
    }
    if err.is_builder() {
        return SourceError::Network(format!("Invalid data source URL: {url}"));
    }
    SourceError::Network(format!("Network error communicating with {url}: {err}"))
}

/// Convert an HTTP status code into an operator-readable message.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Not authorized for this collection".to_string(),
        403 => "Access to this collection is forbidden".to_string(),
        404 => "Collection endpoint not found".to_string(),
        s if s >= 500 => format!("Data source server error (HTTP {s})"),
        s => format!("Unexpected response from data source (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Query-string encoding
// ---------------------------------------------------------------------------

/// Encode query params as the dashboard list query string. Empty search and
/// absent sort are omitted; every filter entry is sent (the backend treats
/// `""` as "no constraint").
pub(crate) fn query_pairs(params: &QueryParams) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("page".to_string(), params.page.to_string()),
        ("pageSize".to_string(), params.page_size.to_string()),
    ];
    if !params.search.is_empty() {
        pairs.push(("search".to_string(), params.search.clone()));
    }
    if let (Some(key), Some(order)) = (&params.sort_by, params.sort_order) {
        pairs.push(("sortBy".to_string(), key.clone()));
        pairs.push(("sortOrder".to_string(), order.as_str().to_string()));
    }
    for (key, value) in &params.filters {
        pairs.push((format!("filters[{key}]"), value.clone()));
    }
    pairs
}

// ---------------------------------------------------------------------------
// Page source
// ---------------------------------------------------------------------------

/// [`PageSource`] backed by a REST collection endpoint.
pub struct HttpPageSource {
    client: Client,
    url: String,
    headers: Vec<(String, String)>,
}

impl HttpPageSource {
    /// `base_url` is normalised; `path` should include the leading slash,
    /// e.g. `/api/vendors`.
    pub fn new(base_url: &str, path: &str) -> Result<Self, SourceError> {
        let base = normalize_base_url(base_url);
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(HttpPageSource {
            client,
            url: format!("{base}{path}"),
            headers: Vec::new(),
        })
    }

    /// Attach a header to every fetch (auth tokens, terminal ids, …).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, params: &QueryParams) -> Result<Page, SourceError> {
        let mut req = self.client.get(&self.url).query(&query_pairs(params));
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }

        debug!(url = %self.url, page = params.page, "fetching collection page");
        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.url, &e))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            // Preserve server-provided detail where the backend sends one.
            let message = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|json| {
                    json.get("error")
                        .or_else(|| json.get("message"))
                        .and_then(Value::as_str)
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| status_message(status));
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<Page>(&body_text)
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_adds_scheme() {
        assert_eq!(normalize_base_url("localhost:8000"), "http://localhost:8000");
        assert_eq!(
            normalize_base_url("admin.thesmall.app"),
            "https://admin.thesmall.app"
        );
    }

    #[test]
    fn test_normalize_base_url_strips_api_and_slashes() {
        assert_eq!(
            normalize_base_url("https://example.com/api/"),
            "https://example.com"
        );
        assert_eq!(
            normalize_base_url("https://example.com///"),
            "https://example.com"
        );
    }

    #[test]
    fn test_query_pairs_omits_empty_search_and_absent_sort() {
        let q = QueryParams::new(10);
        let pairs = query_pairs(&q);
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "1".to_string()),
                ("pageSize".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_includes_sort_search_and_filters() {
        let mut q = QueryParams::new(25);
        q.commit_search("mug");
        q.cycle_sort("name");
        q.set_filter("category", "3");
        q.set_filter("status", "");
        let pairs = query_pairs(&q);
        assert!(pairs.contains(&("search".to_string(), "mug".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "name".to_string())));
        assert!(pairs.contains(&("sortOrder".to_string(), "asc".to_string())));
        assert!(pairs.contains(&("filters[category]".to_string(), "3".to_string())));
        // Cleared filters still travel as "no constraint".
        assert!(pairs.contains(&("filters[status]".to_string(), String::new())));
    }

    #[test]
    fn test_status_message_mapping() {
        assert_eq!(
            status_message(StatusCode::NOT_FOUND),
            "Collection endpoint not found"
        );
        assert_eq!(
            status_message(StatusCode::INTERNAL_SERVER_ERROR),
            "Data source server error (HTTP 500)"
        );
    }
}
