//! Podcast feed aggregation.
//!
//! - [`parser`] - RSS/Atom to [`Episode`] mapping using the `feed-rs` crate
//! - [`slug`] - stable, URL-safe episode slugs
//! - [`aggregator`] - concurrent multi-feed fetch, dedupe and ordering
//! - [`filter`] - search, year filter and pager helpers for listings
//!
//! # Example
//!
//! ```ignore
//! let aggregator = FeedAggregator::new(settings.feeds, fetcher.clone());
//! let episodes = aggregator.list_episodes().await;
//! let episode = aggregator.get_episode_by_slug("ep-42-whats-up-1uuo7kk").await;
//! ```

mod aggregator;
mod episode;
mod filter;
mod parser;
mod slug;

pub use aggregator::{dedupe, sort_newest_first, FeedAggregator, FeedError};
pub use episode::{parse_published, Episode};
pub use filter::{adjacent, available_years, Adjacent, EpisodeQuery};
pub use parser::{parse_feed, ParseError};
pub use slug::{episode_slug, fingerprint, slugify, FINGERPRINT_LEN, MAX_SLUG_BASE_LEN};
