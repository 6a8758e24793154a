use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::schema::{
    ChannelListResponse, OEmbedResponse, PlaylistItem, PlaylistItemListResponse,
    SearchListResponse, SearchResult, VideoListResponse,
};
use super::types::{clamp_page_size, watch_url, PageRequest, Video, VideoPage};
use crate::config::{Capabilities, VideoSettings};
use crate::upstream::{report_degraded, CachePolicy, FailureKind, FetchError, Fetcher};

const COMPONENT: &str = "video_directory";

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Channel {0} has no uploads playlist")]
    NoUploadsPlaylist(String),
}

impl VideoError {
    pub fn kind(&self) -> FailureKind {
        match self {
            VideoError::NotConfigured(_) => FailureKind::NotConfigured,
            VideoError::Fetch(e) => e.kind(),
            VideoError::NoUploadsPlaylist(_) => FailureKind::Parse,
        }
    }
}

/// Client for the channel's video catalogue.
///
/// Every public operation degrades instead of failing: an empty page, `None`,
/// or the reduced oEmbed record. The reason is logged through
/// [`report_degraded`].
pub struct VideoDirectory {
    settings: VideoSettings,
    fetcher: Fetcher,
}

impl VideoDirectory {
    pub fn new(settings: VideoSettings, fetcher: Fetcher) -> Self {
        let caps = settings.capabilities();
        if !caps.lookup {
            tracing::warn!("No video API key configured; listing and live status are disabled");
        } else if !caps.listing {
            tracing::warn!("No channel id configured; listing and live status are disabled");
        }
        Self { settings, fetcher }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.settings.capabilities()
    }

    /// One page of channel uploads. Any failure yields an empty page.
    pub async fn list_videos(&self, request: &PageRequest) -> VideoPage {
        match self.try_list_videos(request).await {
            Ok(page) => page,
            Err(e) => {
                report_degraded(COMPONENT, "list_videos", e.kind(), self.channel_label(), &e);
                VideoPage::default()
            }
        }
    }

    /// Full metadata, or the oEmbed record when the primary lookup fails.
    ///
    /// `None` when the platform reports no such video, or when neither path
    /// resolves.
    pub async fn get_video_by_id(&self, id: &str) -> Option<Video> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }

        match self.lookup_video(id).await {
            Ok(found) => found,
            Err(e) => {
                report_degraded(COMPONENT, "get_video_by_id", e.kind(), id, &e);
                self.oembed(id).await
            }
        }
    }

    /// The current live broadcast, if any. Never served from cache.
    pub async fn get_live_video(&self) -> Option<Video> {
        match self.find_live().await {
            Ok(live) => live,
            Err(e) => {
                report_degraded(COMPONENT, "get_live_video", e.kind(), self.channel_label(), &e);
                None
            }
        }
    }

    async fn try_list_videos(&self, request: &PageRequest) -> Result<VideoPage, VideoError> {
        let channel = self.channel()?;
        let uploads = self.uploads_playlist_id(channel).await?;
        let max_results = clamp_page_size(request.page_size).to_string();

        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", uploads.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = request.page_token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("pageToken", token));
        }

        let response: PlaylistItemListResponse = self
            .api_get("playlistItems", &params, CachePolicy::Revalidate)
            .await?;

        let videos = response
            .items
            .into_iter()
            .filter_map(video_from_playlist_item)
            .collect();
        Ok(VideoPage::new(
            videos,
            response.next_page_token,
            response.prev_page_token,
        ))
    }

    async fn uploads_playlist_id(&self, channel: &str) -> Result<String, VideoError> {
        let response: ChannelListResponse = self
            .api_get(
                "channels",
                &[("part", "contentDetails"), ("id", channel)],
                CachePolicy::Revalidate,
            )
            .await?;
        response
            .uploads_playlist_id()
            .map(str::to_string)
            .ok_or_else(|| VideoError::NoUploadsPlaylist(channel.to_string()))
    }

    async fn lookup_video(&self, id: &str) -> Result<Option<Video>, VideoError> {
        let response: VideoListResponse = self
            .api_get(
                "videos",
                &[("part", "snippet"), ("id", id)],
                CachePolicy::Revalidate,
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| Video::from_snippet(id.to_string(), item.snippet)))
    }

    async fn find_live(&self) -> Result<Option<Video>, VideoError> {
        let channel = self.channel()?;

        let live: SearchListResponse = self
            .api_get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel),
                    ("eventType", "live"),
                    ("type", "video"),
                ],
                CachePolicy::NoStore,
            )
            .await?;
        if let Some(video) = live.items.into_iter().find_map(video_from_search_result) {
            return Ok(Some(video));
        }

        // Live search can lag behind a broadcast that has just started.
        let latest: SearchListResponse = self
            .api_get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", "1"),
                ],
                CachePolicy::NoStore,
            )
            .await?;
        Ok(latest
            .items
            .into_iter()
            .next()
            .filter(|item| item.snippet.live_broadcast_content == "live")
            .and_then(video_from_search_result))
    }

    async fn oembed(&self, id: &str) -> Option<Video> {
        let mut url = self.settings.oembed_base.clone();
        url.query_pairs_mut()
            .append_pair("url", &watch_url(id))
            .append_pair("format", "json");

        match self
            .fetcher
            .get_json::<OEmbedResponse>(&url, CachePolicy::Revalidate, "oembed")
            .await
        {
            Ok(oembed) => {
                tracing::debug!(video_id = id, "Serving reduced record from oEmbed");
                Some(Video::from_oembed(id.to_string(), oembed))
            }
            Err(e) => {
                report_degraded(COMPONENT, "get_video_by_id", e.kind(), id, &e);
                None
            }
        }
    }

    async fn api_get<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        params: &[(&str, &str)],
        policy: CachePolicy,
    ) -> Result<T, VideoError> {
        let url = self.api_url(resource, params)?;
        Ok(self.fetcher.get_json(&url, policy, resource).await?)
    }

    fn api_url(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, VideoError> {
        let key = self.key()?;
        let mut url = self.settings.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl)?
            .pop_if_empty()
            .push(resource);
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            query.append_pair("key", key.expose_secret());
        }
        Ok(url)
    }

    fn key(&self) -> Result<&SecretString, VideoError> {
        self.settings
            .api_key
            .as_ref()
            .ok_or(VideoError::NotConfigured("video API key"))
    }

    fn channel(&self) -> Result<&str, VideoError> {
        self.key()?;
        self.settings
            .channel_id
            .as_deref()
            .ok_or(VideoError::NotConfigured("channel id"))
    }

    fn channel_label(&self) -> &str {
        self.settings.channel_id.as_deref().unwrap_or("<unset>")
    }
}

fn video_from_playlist_item(item: PlaylistItem) -> Option<Video> {
    let id = item.content_details.video_id.trim().to_string();
    if id.is_empty() {
        tracing::debug!(title = %item.snippet.title, "Skipping playlist item without video id");
        return None;
    }
    let mut snippet = item.snippet;
    if snippet.published_at.trim().is_empty() {
        snippet.published_at = item.content_details.video_published_at;
    }
    Some(Video::from_snippet(id, snippet))
}

fn video_from_search_result(item: SearchResult) -> Option<Video> {
    let id = item.id.video_id.trim().to_string();
    if id.is_empty() {
        return None;
    }
    Some(Video::from_snippet(id, item.snippet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;
    use pretty_assertions::assert_eq;

    fn directory(api_key: Option<&str>, channel_id: Option<&str>) -> VideoDirectory {
        VideoDirectory::new(
            VideoSettings {
                api_key: api_key.map(|k| SecretString::from(k.to_string())),
                channel_id: channel_id.map(str::to_string),
                api_base: Url::parse("https://www.googleapis.com/youtube/v3").unwrap(),
                oembed_base: Url::parse("https://www.youtube.com/oembed").unwrap(),
            },
            Fetcher::with_client(reqwest::Client::new(), &HttpSettings::default()),
        )
    }

    #[test]
    fn test_api_url_appends_resource_and_key() {
        let dir = directory(Some("k-123"), Some("UC1"));
        let url = dir
            .api_url("channels", &[("part", "contentDetails"), ("id", "UC1")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/youtube/v3/channels?part=contentDetails&id=UC1&key=k-123"
        );
    }

    #[test]
    fn test_api_url_requires_key() {
        let err = directory(None, Some("UC1")).api_url("videos", &[]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotConfigured);
    }

    #[test]
    fn test_channel_requires_key_and_channel() {
        assert!(directory(Some("k"), None).channel().is_err());
        assert!(directory(None, Some("UC1")).channel().is_err());
        assert_eq!(directory(Some("k"), Some("UC1")).channel().unwrap(), "UC1");
    }

    #[tokio::test]
    async fn test_unconfigured_degrades_without_requests() {
        let dir = directory(None, None);
        assert_eq!(dir.list_videos(&PageRequest::default()).await, VideoPage::default());
        assert_eq!(dir.get_live_video().await, None);
    }

    #[tokio::test]
    async fn test_blank_id_is_not_found() {
        assert_eq!(directory(None, None).get_video_by_id("  ").await, None);
    }
}
