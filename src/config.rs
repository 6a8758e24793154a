//! Configuration for the feed aggregator and video directory.
//!
//! Values come from an optional TOML file overlaid with environment
//! variables (env wins). The merged [`Config`] is validated once at startup by
//! [`Config::into_settings`], which is where a missing feed list fails.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::util::validate_feed_url;

pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_OEMBED_BASE: &str = "https://www.youtube.com/oembed";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("No podcast feeds configured: set PODCAST_FEEDS (comma-separated) or podcast_feeds in the config file")]
    NoFeeds,

    #[error("Invalid {name} '{value}': {source}")]
    InvalidBaseUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

// ============================================================================
// Raw configuration (file + env)
// ============================================================================

/// Merged, not yet validated configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The API key is masked in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered feed locations. Order decides which duplicate wins.
    pub podcast_feeds: Vec<String>,

    /// Video platform API key. Absent disables listing, lookup and live checks.
    pub youtube_api_key: Option<String>,

    /// Channel whose uploads and live status are queried.
    pub youtube_channel_id: Option<String>,

    /// Read-through cache lifetime in seconds. 0 disables caching.
    pub cache_ttl_secs: u64,

    /// Maximum number of cached upstream responses.
    pub cache_capacity: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retries on 429/5xx before a fetch is reported as failed.
    pub feed_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds.
    pub retry_backoff_ms: u64,

    pub youtube_api_base: String,

    pub oembed_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            podcast_feeds: Vec::new(),
            youtube_api_key: None,
            youtube_channel_id: None,
            cache_ttl_secs: 600,
            cache_capacity: 256,
            request_timeout_secs: 30,
            feed_retries: 2,
            retry_backoff_ms: 500,
            youtube_api_base: DEFAULT_YOUTUBE_API_BASE.to_string(),
            oembed_base: DEFAULT_OEMBED_BASE.to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("podcast_feeds", &self.podcast_feeds)
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("youtube_channel_id", &self.youtube_channel_id)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_capacity", &self.cache_capacity)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("feed_retries", &self.feed_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("youtube_api_base", &self.youtube_api_base)
            .field("oembed_base", &self.oembed_base)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 10] = [
    "podcast_feeds",
    "youtube_api_key",
    "youtube_channel_id",
    "cache_ttl_secs",
    "cache_capacity",
    "request_timeout_secs",
    "feed_retries",
    "retry_backoff_ms",
    "youtube_api_base",
    "oembed_base",
];

/// Splits a comma-separated feed list, dropping blank entries.
pub fn split_feed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// First variable in `names` that is set to a non-blank value, trimmed.
fn first_non_blank<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.podcast_feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Overlay values from an environment lookup.
    ///
    /// `PODCAST_FEEDS` falls back to `NEXT_PUBLIC_PODCAST_RSS`, and
    /// `YOUTUBE_API_KEY` falls back to `GOOGLE_API_KEY`. Blank values are
    /// treated as unset.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(feeds) = first_non_blank(&lookup, &["PODCAST_FEEDS", "NEXT_PUBLIC_PODCAST_RSS"])
        {
            self.podcast_feeds = split_feed_list(&feeds);
        }
        if let Some(key) = first_non_blank(&lookup, &["YOUTUBE_API_KEY", "GOOGLE_API_KEY"]) {
            self.youtube_api_key = Some(key);
        }
        if let Some(channel) = first_non_blank(&lookup, &["YOUTUBE_CHANNEL_ID"]) {
            self.youtube_channel_id = Some(channel);
        }
        self
    }

    /// Validate and split into per-component settings.
    ///
    /// # Errors
    ///
    /// A feed location that is not an http(s) URL is logged and skipped, like
    /// a feed that fails to fetch.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoFeeds`] when no usable feed location remains
    /// - [`ConfigError::InvalidBaseUrl`] when an API base cannot be parsed
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let mut feeds = Vec::with_capacity(self.podcast_feeds.len());
        for raw in self.podcast_feeds.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            match validate_feed_url(raw) {
                Ok(url) => feeds.push(url),
                Err(e) => tracing::warn!(feed = raw, error = %e, "Skipping invalid feed location"),
            }
        }
        if feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }

        let api_base = parse_base("youtube_api_base", &self.youtube_api_base)?;
        let oembed_base = parse_base("oembed_base", &self.oembed_base)?;

        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Settings {
            feeds: FeedSources { urls: feeds },
            video: VideoSettings {
                api_key: non_blank(self.youtube_api_key).map(SecretString::from),
                channel_id: non_blank(self.youtube_channel_id),
                api_base,
                oembed_base,
            },
            http: HttpSettings {
                cache_ttl: Duration::from_secs(self.cache_ttl_secs),
                cache_capacity: self.cache_capacity.max(1),
                request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
                max_retries: self.feed_retries,
                retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            },
        })
    }
}

fn parse_base(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim_end_matches('/')).map_err(|source| ConfigError::InvalidBaseUrl {
        name,
        value: value.to_string(),
        source,
    })
}

// ============================================================================
// Validated settings
// ============================================================================

/// Validated configuration, built once and handed to each component.
#[derive(Debug)]
pub struct Settings {
    pub feeds: FeedSources,
    pub video: VideoSettings,
    pub http: HttpSettings,
}

/// Non-empty, ordered list of feed locations.
#[derive(Debug, Clone)]
pub struct FeedSources {
    urls: Vec<Url>,
}

impl FeedSources {
    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false for a validated list; kept for the `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Video platform settings. `SecretString` keeps the key out of `Debug`.
#[derive(Debug)]
pub struct VideoSettings {
    pub api_key: Option<SecretString>,
    pub channel_id: Option<String>,
    pub api_base: Url,
    pub oembed_base: Url,
}

/// Which video features the current configuration enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Paginated uploads listing (key + channel).
    pub listing: bool,
    /// Primary single-video lookup (key). The oEmbed fallback needs nothing.
    pub lookup: bool,
    /// Live status detection (key + channel).
    pub live: bool,
}

impl VideoSettings {
    pub fn capabilities(&self) -> Capabilities {
        let has_key = self.api_key.is_some();
        let has_channel = self.channel_id.is_some();
        Capabilities {
            listing: has_key && has_channel,
            lookup: has_key,
            live: has_key && has_channel,
        }
    }
}

/// Shared HTTP behaviour for every upstream call.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            cache_capacity: 256,
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
