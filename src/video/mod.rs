//! Video directory backed by the YouTube Data API v3.
//!
//! Listing goes through the channel's uploads playlist. Single-video lookup
//! falls back to the quota-free oEmbed endpoint. Live status uses search and
//! always bypasses the response cache.

mod client;
mod schema;
mod types;

pub use client::{VideoDirectory, VideoError};
pub use types::{
    clamp_page_size, watch_url, LiveStatus, PageRequest, Video, VideoPage, VideoQuery,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, NOT_LIVE_MESSAGE,
};
