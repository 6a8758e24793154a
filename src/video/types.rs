use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::schema::{OEmbedResponse, Snippet};
use crate::util::strip_html;

pub const DEFAULT_PAGE_SIZE: u32 = 24;
/// Upper bound the platform accepts for `maxResults`.
pub const MAX_PAGE_SIZE: u32 = 50;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub fn watch_url(id: &str) -> String {
    format!("{WATCH_URL}{id}")
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

/// One video as exposed to the page layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `None` for records built from the oEmbed fallback.
    pub published_at: Option<String>,
    pub thumbnail: Option<String>,
    pub url: String,
}

impl Video {
    pub(crate) fn from_snippet(id: String, snippet: Snippet) -> Self {
        let thumbnail = snippet.thumbnails.best().map(str::to_string);
        Self {
            url: watch_url(&id),
            id,
            title: snippet.title,
            description: snippet.description,
            published_at: non_empty(snippet.published_at),
            thumbnail,
        }
    }

    /// Reduced record: the channel name stands in for the description.
    pub(crate) fn from_oembed(id: String, oembed: OEmbedResponse) -> Self {
        Self {
            url: watch_url(&id),
            id,
            title: oembed.title,
            description: oembed.author_name,
            published_at: None,
            thumbnail: oembed.thumbnail_url.and_then(non_empty),
        }
    }
}

/// One page of the uploads listing.
///
/// A cursor is present only when that direction has another page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page_token: Option<String>,
}

impl VideoPage {
    pub(crate) fn new(
        videos: Vec<Video>,
        next_page_token: Option<String>,
        prev_page_token: Option<String>,
    ) -> Self {
        Self {
            videos,
            next_page_token: next_page_token.and_then(non_empty),
            prev_page_token: prev_page_token.and_then(non_empty),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Cursor from a previous [`VideoPage`]. Blank means the first page.
    pub page_token: Option<String>,
    /// Clamped to `1..=50`, default 24.
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_token: None,
            page_size: Some(page_size),
        }
    }
}

pub fn clamp_page_size(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Text search over title and plain-text description.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub text: Option<String>,
}

impl VideoQuery {
    pub fn matches(&self, video: &Video) -> bool {
        let Some(needle) = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        else {
            return true;
        };
        video.title.to_lowercase().contains(&needle)
            || strip_html(&video.description)
                .to_lowercase()
                .contains(&needle)
    }

    pub fn apply<'a>(&self, videos: &'a [Video]) -> Vec<&'a Video> {
        videos.iter().filter(|v| self.matches(v)).collect()
    }
}

pub const NOT_LIVE_MESSAGE: &str = "not live";

/// Live-status payload: the video itself, or `{"message": "not live"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    Live(Video),
    NotLive,
}

impl LiveStatus {
    pub fn video(&self) -> Option<&Video> {
        match self {
            LiveStatus::Live(v) => Some(v),
            LiveStatus::NotLive => None,
        }
    }
}

impl From<Option<Video>> for LiveStatus {
    fn from(video: Option<Video>) -> Self {
        video.map_or(LiveStatus::NotLive, LiveStatus::Live)
    }
}

impl Serialize for LiveStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LiveStatus::Live(video) => video.serialize(serializer),
            LiveStatus::NotLive => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", NOT_LIVE_MESSAGE)?;
                map.end()
            }
        }
    }
}
