use futures::stream::{self, StreamExt};
use std::cmp::Reverse;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use super::episode::Episode;
use super::parser::{parse_feed, ParseError};
use crate::config::FeedSources;
use crate::upstream::{report_degraded, CachePolicy, FailureKind, FetchError, Fetcher};

const COMPONENT: &str = "feed_aggregator";

/// Why a single feed contributed no episodes.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Fetch(e) => e.kind(),
            FeedError::Parse(_) => FailureKind::Parse,
        }
    }
}

/// Merges the configured podcast feeds into one episode list.
///
/// Holds only immutable configuration; every call re-runs the pipeline, with
/// the fetcher's cache deciding whether bytes actually go over the wire.
pub struct FeedAggregator {
    sources: FeedSources,
    fetcher: Fetcher,
}

impl FeedAggregator {
    pub fn new(sources: FeedSources, fetcher: Fetcher) -> Self {
        Self { sources, fetcher }
    }

    pub fn sources(&self) -> &[Url] {
        self.sources.urls()
    }

    /// All episodes across feeds: deduplicated, newest first.
    ///
    /// Every feed is fetched at once but merged in configuration order, so
    /// the first feed wins when two feeds carry the same episode. A feed that
    /// fails to fetch or parse is logged and skipped; this never fails.
    pub async fn list_episodes(&self) -> Vec<Episode> {
        let per_feed: Vec<Vec<Episode>> = stream::iter(self.sources.urls())
            .map(|url| self.load_feed(url))
            .buffered(self.sources.len().max(1))
            .collect()
            .await;

        let mut episodes = dedupe(per_feed.into_iter().flatten());
        sort_newest_first(&mut episodes);

        tracing::debug!(
            feeds = self.sources.len(),
            episodes = episodes.len(),
            "Aggregated episodes"
        );
        episodes
    }

    /// Runs the full pipeline and scans for `slug`.
    ///
    /// Callers resolving many slugs should hold on to [`list_episodes`]
    /// output instead of calling this in a loop.
    ///
    /// [`list_episodes`]: FeedAggregator::list_episodes
    pub async fn get_episode_by_slug(&self, slug: &str) -> Option<Episode> {
        self.list_episodes()
            .await
            .into_iter()
            .find(|ep| ep.slug == slug)
    }

    pub async fn get_episode_by_id(&self, id: &str) -> Option<Episode> {
        self.list_episodes().await.into_iter().find(|ep| ep.id == id)
    }

    async fn load_feed(&self, url: &Url) -> Vec<Episode> {
        match self.fetch_feed(url).await {
            Ok(episodes) => {
                tracing::debug!(feed = %url, episodes = episodes.len(), "Parsed feed");
                episodes
            }
            Err(e) => {
                report_degraded(COMPONENT, "list_episodes", e.kind(), url.as_str(), &e);
                Vec::new()
            }
        }
    }

    async fn fetch_feed(&self, url: &Url) -> Result<Vec<Episode>, FeedError> {
        let bytes = self
            .fetcher
            .get_bytes(url, CachePolicy::Revalidate, "feed")
            .await?;
        Ok(parse_feed(&bytes, url.as_str())?)
    }
}

/// Keeps the first episode per identity key, dropping episodes without one.
pub fn dedupe(episodes: impl IntoIterator<Item = Episode>) -> Vec<Episode> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for ep in episodes {
        let Some(key) = ep.identity_key() else {
            tracing::debug!(title = %ep.title, source = %ep.source, "Dropping episode without identity");
            continue;
        };
        if seen.insert(key.to_string()) {
            kept.push(ep);
        }
    }
    kept
}

/// Stable sort, newest first. Missing or unparseable dates sort last.
pub fn sort_newest_first(episodes: &mut [Episode]) {
    episodes.sort_by_cached_key(|ep| {
        Reverse(
            ep.published()
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(i64::MIN),
        )
    });
}
