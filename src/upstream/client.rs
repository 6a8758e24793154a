use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::cache::ResponseCache;
use super::FailureKind;
use crate::config::HttpSettings;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
/// Enough of an error body to find the quota marker.
const MAX_ERROR_BODY_SIZE: usize = 64 * 1024;

const USER_AGENT: &str = concat!("showfeed/", env!("CARGO_PKG_VERSION"));

/// Errors from a single upstream round trip.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    ///
    /// Built through `From`, which drops the request URL: Data API URLs carry
    /// the key in their query string.
    #[error("Request failed: {0}")]
    Network(reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP 403 whose body reports an exhausted quota
    #[error("Quota exceeded (status {0})")]
    Quota(u16),
    /// Server kept answering 429 Too Many Requests
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Received fewer bytes than Content-Length announced
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body did not match the expected response schema
    #[error("Decode error: {0}")]
    Decode(String),
    /// A request URL could not be built from the configured base
    #[error("Invalid request URL")]
    InvalidUrl,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.without_url())
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Quota(_) | FetchError::RateLimited(_) => FailureKind::Quota,
            FetchError::Decode(_) => FailureKind::Parse,
            _ => FailureKind::Transient,
        }
    }

    pub fn is_quota(&self) -> bool {
        self.kind() == FailureKind::Quota
    }
}

/// Whether a request may be answered from the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve from cache while fresh, store successful responses.
    Revalidate,
    /// Always go upstream and leave the cache untouched.
    NoStore,
}

/// Shared HTTP client with timeout, retry, size limit and response cache.
///
/// Cheap to clone: the reqwest client and the cache are both shared.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    cache: Arc<ResponseCache>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    /// Build a fetcher with its own reqwest client.
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: reqwest::Client, settings: &HttpSettings) -> Self {
        Self {
            client,
            cache: Arc::new(ResponseCache::new(
                settings.cache_ttl,
                settings.cache_capacity,
            )),
            timeout: settings.request_timeout,
            max_retries: settings.max_retries,
            retry_backoff: settings.retry_backoff,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetch a body, honoring the cache policy.
    ///
    /// `resource` labels log lines; the URL's query string is never logged
    /// because it can carry an API key.
    pub async fn get_bytes(
        &self,
        url: &Url,
        policy: CachePolicy,
        resource: &'static str,
    ) -> Result<Arc<[u8]>, FetchError> {
        if policy == CachePolicy::Revalidate {
            if let Some(body) = self.cache.get(url.as_str()) {
                tracing::trace!(resource, path = url.path(), "Cache hit");
                return Ok(body);
            }
        }

        let body: Arc<[u8]> = Arc::from(self.fetch_with_retry(url, resource).await?);

        if policy == CachePolicy::Revalidate {
            self.cache.insert(url.to_string(), Arc::clone(&body));
        }
        Ok(body)
    }

    /// Fetch and decode a JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        policy: CachePolicy,
        resource: &'static str,
    ) -> Result<T, FetchError> {
        let body = self.get_bytes(url, policy, resource).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(retry))
    }

    async fn fetch_with_retry(&self, url: &Url, resource: &'static str) -> Result<Vec<u8>, FetchError> {
        let mut retry_count = 0;

        loop {
            let response = tokio::time::timeout(self.timeout, self.client.get(url.clone()).send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::from)?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= self.max_retries {
                    return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        FetchError::RateLimited(self.max_retries)
                    } else {
                        FetchError::HttpStatus(status.as_u16())
                    });
                }

                let delay = self.backoff(retry_count);
                tracing::warn!(
                    resource,
                    path = url.path(),
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Upstream unavailable, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status == reqwest::StatusCode::FORBIDDEN {
                let body = tokio::time::timeout(
                    self.timeout,
                    read_limited_bytes(response, MAX_ERROR_BODY_SIZE),
                )
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
                if mentions_quota(&body) {
                    return Err(FetchError::Quota(status.as_u16()));
                }
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            let read = tokio::time::timeout(self.timeout, read_limited_bytes(response, MAX_BODY_SIZE))
                .await
                .map_err(|_| FetchError::Timeout)?;

            match read {
                Ok(bytes) => return Ok(bytes),
                Err(FetchError::IncompleteResponse { expected, received })
                    if retry_count < self.max_retries =>
                {
                    let delay = self.backoff(retry_count);
                    tracing::debug!(
                        resource,
                        path = url.path(),
                        expected,
                        received,
                        attempt = retry_count + 1,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn mentions_quota(body: &[u8]) -> bool {
    String::from_utf8_lossy(body)
        .to_ascii_lowercase()
        .contains("quota")
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
