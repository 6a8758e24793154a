//! Response shapes for the video platform resources we call.
//!
//! Only the fields we read are modelled. Everything is `#[serde(default)]` so
//! a field the platform omits decodes as empty instead of failing the page.
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: String,
}

/// Keyed by resolution name. `default` is the smallest.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

impl Thumbnails {
    /// Highest-resolution non-empty URL.
    pub fn best(&self) -> Option<&str> {
        [
            &self.maxres,
            &self.standard,
            &self.high,
            &self.medium,
            &self.default,
        ]
        .into_iter()
        .flatten()
        .map(|t| t.url.trim())
        .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub thumbnails: Thumbnails,
    /// `live`, `upcoming` or `none`; only present on search results.
    pub live_broadcast_content: String,
}

// channels?part=contentDetails

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChannelListResponse {
    pub items: Vec<Channel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Channel {
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelatedPlaylists {
    pub uploads: String,
}

impl ChannelListResponse {
    pub fn uploads_playlist_id(&self) -> Option<&str> {
        self.items
            .first()
            .map(|c| c.content_details.related_playlists.uploads.trim())
            .filter(|id| !id.is_empty())
    }
}

// playlistItems?part=snippet,contentDetails

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItem {
    pub snippet: Snippet,
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
    pub video_published_at: String,
}

// videos?part=snippet

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideoListResponse {
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideoResource {
    pub id: String,
    pub snippet: Snippet,
}

// search?part=snippet

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchListResponse {
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResultId {
    pub video_id: String,
}

// oEmbed uses snake_case keys.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OEmbedResponse {
    pub title: String,
    pub author_name: String,
    pub thumbnail_url: Option<String>,
}
