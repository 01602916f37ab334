//! KoboToolbox submissions client.
//!
//! Reads the v2 `assets/{uid}/data/` endpoint, which pages its results and
//! links each page to the next through an absolute `next` URL.
//!
//! # API Reference
//!
//! See: <https://support.kobotoolbox.org/api.html>
//!
//! # Rate Limits
//!
//! The server answers bursts with HTTP 429. Requests are made one at a time
//! with a short pause between pages, and transient failures are retried once.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_BASE_URL, KoboConfig};
use crate::error::FetchError;
use crate::model::{ConsolidatedSubmissions, SubmissionPage};

/// Statuses worth one more try.
const TRANSIENT_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Retries after the first attempt of a page request.
const MAX_RETRIES: u32 = 1;

/// Longest error body quoted in a transport error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Tuning for a full paginated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Most pages followed before giving up on a runaway `next` chain.
    pub max_pages: u32,
    /// Pause between consecutive page requests.
    pub page_delay: Duration,
    /// Pause before retrying a transient failure.
    pub retry_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_pages: 1000,
            page_delay: Duration::from_millis(250),
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// Client for the KoboToolbox data API.
#[derive(Clone)]
pub struct KoboClient {
    client: reqwest::Client,
    base_url: String,
    options: FetchOptions,
}

/// Failure of a single request attempt.
enum AttemptError {
    /// Worth retrying after a backoff.
    Transient(FetchError),
    Fatal(FetchError),
}

impl KoboClient {
    /// Create a client for the public server.
    pub fn new(token: &str, options: FetchOptions) -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL, token, options)
    }

    /// Create a client for a self-hosted server (or a test fixture).
    pub fn with_base_url(
        base_url: &str,
        token: &str,
        options: FetchOptions,
    ) -> Result<Self, FetchError> {
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.trim()))
            .map_err(|e| FetchError::Client(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
        })
    }

    /// Create a client from process configuration.
    pub fn from_config(config: &KoboConfig) -> Result<Self, FetchError> {
        Self::with_base_url(&config.base_url, &config.token, config.fetch.clone())
    }

    /// URL of the first submissions page for an asset.
    pub fn asset_data_url(&self, asset_uid: &str) -> String {
        format!(
            "{}/api/v2/assets/{}/data/?format=json",
            self.base_url,
            urlencoding::encode(asset_uid.trim())
        )
    }

    /// Fetch every submission of an asset.
    pub async fn fetch_asset(&self, asset_uid: &str) -> Result<ConsolidatedSubmissions, FetchError> {
        self.fetch_all(&self.asset_data_url(asset_uid)).await
    }

    /// Follow `next` pointers from `initial_url` until the last page.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Transport`] when a page fails for good
    /// - [`FetchError::PaginationLimit`] when more than `max_pages` pages are
    ///   chained, which usually means the server is looping
    pub async fn fetch_all(&self, initial_url: &str) -> Result<ConsolidatedSubmissions, FetchError> {
        let mut url = initial_url.to_string();
        let mut results = Vec::new();
        let mut reported_count = None;
        let mut pages: u32 = 0;

        loop {
            let page = self.fetch_page(&url).await?;
            pages += 1;
            if pages == 1 {
                reported_count = page.count;
            }

            debug!(
                page = pages,
                records = page.results.len(),
                has_next = page.next.is_some(),
                "Fetched submissions page"
            );
            results.extend(page.results);

            let Some(next) = page.next else {
                break;
            };
            let next_url = resolve_next(&url, &next)?;

            if pages >= self.options.max_pages {
                return Err(FetchError::PaginationLimit {
                    max_pages: self.options.max_pages,
                    next_url,
                });
            }

            url = next_url;
            if !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }
        }

        info!(pages, records = results.len(), "Fetched all submission pages");
        Ok(ConsolidatedSubmissions::new(reported_count, results))
    }

    /// Fetch one page, retrying a transient failure once.
    async fn fetch_page(&self, url: &str) -> Result<SubmissionPage, FetchError> {
        let mut attempt = 0;
        loop {
            match self.try_fetch_page(url).await {
                Ok(page) => return Ok(page),
                Err(AttemptError::Transient(err)) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(
                        url,
                        error = %err,
                        backoff_ms = self.options.retry_backoff.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.options.retry_backoff).await;
                }
                Err(AttemptError::Transient(err)) | Err(AttemptError::Fatal(err)) => {
                    return Err(err);
                }
            }
        }
    }

    async fn try_fetch_page(&self, url: &str) -> Result<SubmissionPage, AttemptError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let err = FetchError::transport(url, e.to_string());
            if e.is_timeout() || e.is_connect() {
                AttemptError::Transient(err)
            } else {
                AttemptError::Fatal(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = FetchError::Transport {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {status}: {}", snippet(&body)),
            };
            return Err(if TRANSIENT_STATUSES.contains(&status) {
                AttemptError::Transient(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            AttemptError::Fatal(FetchError::transport(url, format!("invalid JSON body: {e}")))
        })?;

        parse_page(body).map_err(|message| AttemptError::Fatal(FetchError::transport(url, message)))
    }
}

/// Interpret a response body as a page.
///
/// A bare array is accepted as a single terminal page.
pub fn parse_page(body: Value) -> Result<SubmissionPage, String> {
    match body {
        Value::Array(results) => Ok(SubmissionPage {
            count: None,
            next: None,
            previous: None,
            results,
        }),
        Value::Object(mut page) => {
            let results = match page.remove("results") {
                Some(Value::Array(results)) => results,
                Some(_) => return Err("\"results\" is not an array".to_string()),
                None => return Err("page object has no \"results\"".to_string()),
            };
            let link = |value: Option<&Value>| {
                value
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Ok(SubmissionPage {
                count: page.get("count").and_then(Value::as_u64),
                next: link(page.get("next")),
                previous: link(page.get("previous")),
                results,
            })
        }
        _ => Err("expected a page object or an array of records".to_string()),
    }
}

/// Resolve a `next` pointer against the page it came from.
fn resolve_next(current: &str, next: &str) -> Result<String, FetchError> {
    Url::parse(current)
        .and_then(|base| base.join(next))
        .map(String::from)
        .map_err(|e| FetchError::transport(current, format!("invalid next URL {next:?}: {e}")))
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= BODY_SNIPPET_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> KoboClient {
        KoboClient::with_base_url(base_url, "token", FetchOptions::default()).unwrap()
    }

    #[test]
    fn test_asset_data_url() {
        let client = client("https://kobo.example.org/");
        assert_eq!(
            client.asset_data_url("aa3qCQ"),
            "https://kobo.example.org/api/v2/assets/aa3qCQ/data/?format=json"
        );
    }

    #[test]
    fn test_asset_uid_is_encoded() {
        let client = KoboClient::new("token", FetchOptions::default()).unwrap();
        assert_eq!(
            client.asset_data_url(" a/b "),
            "https://kf.kobotoolbox.org/api/v2/assets/a%2Fb/data/?format=json"
        );
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let result = KoboClient::new("bad\ntoken", FetchOptions::default());
        assert!(matches!(result, Err(FetchError::Client(_))));
    }

    #[test]
    fn test_parse_page_object() {
        let page = parse_page(json!({
            "count": 12,
            "next": "https://kobo.example.org/api/v2/assets/x/data/?start=10",
            "previous": null,
            "results": [{"_id": 1}, {"_id": 2}]
        }))
        .unwrap();

        assert_eq!(page.count, Some(12));
        assert!(page.next.is_some());
        assert_eq!(page.previous, None);
        assert_eq!(page.results.len(), 2);
    }

    #[test]
    fn test_parse_bare_list_is_terminal() {
        let page = parse_page(json!([{"_id": 1}])).unwrap();

        assert_eq!(page.count, None);
        assert_eq!(page.next, None);
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn test_parse_page_empty_next_is_terminal() {
        let page = parse_page(json!({"next": "", "results": []})).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_parse_page_rejects_other_shapes() {
        assert!(parse_page(json!({"detail": "Not found."})).is_err());
        assert!(parse_page(json!({"results": {}})).is_err());
        assert!(parse_page(json!("nope")).is_err());
    }

    #[test]
    fn test_resolve_next() {
        let current = "https://kobo.example.org/api/v2/assets/x/data/?format=json";
        assert_eq!(
            resolve_next(current, "https://other.example.org/p2").unwrap(),
            "https://other.example.org/p2"
        );
        assert_eq!(
            resolve_next(current, "?format=json&start=30").unwrap(),
            "https://kobo.example.org/api/v2/assets/x/data/?format=json&start=30"
        );
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(500);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), BODY_SNIPPET_CHARS + 3);
        assert_eq!(snippet("  short "), "short");
    }
}
