//! Upstream HTTP plumbing shared by the feed aggregator and video directory.
//!
//! - [`Fetcher`]: reqwest client with timeout, retry/backoff on 429 and 5xx,
//!   body size limit, quota detection and a read-through [`ResponseCache`]
//! - [`report_degraded`]: the structured event emitted whenever a component
//!   swallows an upstream failure and falls back to an empty or reduced result

mod cache;
mod client;

use std::fmt::Display;

pub use cache::ResponseCache;
pub use client::{CachePolicy, FetchError, Fetcher};

/// Failure taxonomy reported on every degrade path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A required optional setting (API key, channel) is absent.
    NotConfigured,
    /// Network, timeout, or unexpected HTTP status.
    Transient,
    /// Quota exhausted or rate limited.
    Quota,
    /// Response body did not match the expected format.
    Parse,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NotConfigured => "not_configured",
            FailureKind::Transient => "transient",
            FailureKind::Quota => "quota",
            FailureKind::Parse => "parse",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit the degrade event for a swallowed failure.
///
/// `subject` names what was being fetched (a feed location, a video id, a
/// channel id). Quota failures get their own message so they can be alerted
/// on separately; missing configuration logs at debug.
pub fn report_degraded(
    component: &'static str,
    operation: &'static str,
    kind: FailureKind,
    subject: &str,
    error: &dyn Display,
) {
    match kind {
        FailureKind::Quota => tracing::warn!(
            component,
            operation,
            kind = %kind,
            subject,
            error = %error,
            "Upstream quota exhausted, serving degraded result"
        ),
        FailureKind::NotConfigured => tracing::debug!(
            component,
            operation,
            kind = %kind,
            subject,
            reason = %error,
            "Feature not configured, serving empty result"
        ),
        FailureKind::Transient | FailureKind::Parse => tracing::warn!(
            component,
            operation,
            kind = %kind,
            subject,
            error = %error,
            "Upstream request failed, serving degraded result"
        ),
    }
}
