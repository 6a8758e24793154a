//! Read-side data layer for a podcast and video show site.
//!
//! - [`feed`]: merges podcast feeds into one deduplicated, newest-first
//!   episode list with stable slugs
//! - [`video`]: channel uploads, single-video lookup and live status
//! - [`landing`]: the combined landing page view
//!
//! Both components take their settings from [`config::Settings`], built once at
//! startup, and share one [`upstream::Fetcher`].

pub mod config;
pub mod feed;
pub mod landing;
pub mod upstream;
pub mod util;
pub mod video;
