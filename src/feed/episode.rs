use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::util::excerpt;

/// One podcast episode as exposed to the page layer.
///
/// Rebuilt from upstream on every aggregation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Provider guid, item link, or `{source}-{title}-{date}` when both are absent.
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Rich text, may contain markup.
    pub description: String,
    pub audio_url: Option<String>,
    /// RFC 3339 timestamp, or empty when the feed gave none.
    pub published_at: String,
    pub image: Option<String>,
    pub link: Option<String>,
    /// Feed location the episode came from.
    pub source: String,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|v| !v.is_empty())
}

impl Episode {
    /// Deduplication key: audio URL, else link, else id.
    ///
    /// `None` means the episode has no identity and must not be emitted.
    pub fn identity_key(&self) -> Option<&str> {
        non_empty(&self.audio_url)
            .or_else(|| non_empty(&self.link))
            .or_else(|| Some(self.id.as_str()).filter(|id| !id.is_empty()))
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_at)
    }

    /// Calendar year of `published_at`, if it parses.
    pub fn year(&self) -> Option<i32> {
        self.published().map(|dt| dt.year())
    }

    /// Markup-free excerpt of the description.
    pub fn summary(&self, max: usize) -> String {
        excerpt(&self.description, max)
    }
}

/// Parses the timestamp formats podcast feeds emit in practice.
///
/// Accepts RFC 3339, RFC 2822, a bare `YYYY-MM-DD` date (midnight UTC), and a
/// zone-less `YYYY-MM-DDTHH:MM:SS` (read as UTC). Anything else is `None`.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn episode() -> Episode {
        Episode {
            id: "guid-1".into(),
            slug: "ep-1-abc".into(),
            title: "Ep 1".into(),
            description: "<p>Hello <em>there</em></p>".into(),
            audio_url: Some("https://cdn.example.com/1.mp3".into()),
            published_at: "2024-01-01T10:00:00+00:00".into(),
            image: None,
            link: Some("https://example.com/1".into()),
            source: "https://example.com/rss".into(),
        }
    }

    #[test]
    fn test_identity_prefers_audio_then_link_then_id() {
        let mut ep = episode();
        assert_eq!(ep.identity_key(), Some("https://cdn.example.com/1.mp3"));

        ep.audio_url = Some(String::new());
        assert_eq!(ep.identity_key(), Some("https://example.com/1"));

        ep.link = None;
        assert_eq!(ep.identity_key(), Some("guid-1"));

        ep.id.clear();
        assert_eq!(ep.identity_key(), None);
    }

    #[test]
    fn test_parse_published_formats() {
        assert!(parse_published("2024-01-01").is_some());
        assert!(parse_published("Mon, 01 Jan 2024 10:00:00 +0000").is_some());
        assert!(parse_published("2024-01-01T10:00:00Z").is_some());
        assert!(parse_published("2024-01-01T10:00:00").is_some());
        assert!(parse_published("").is_none());
        assert!(parse_published("last tuesday").is_none());
    }

    #[test]
    fn test_year_and_summary() {
        let ep = episode();
        assert_eq!(ep.year(), Some(2024));
        assert_eq!(ep.summary(160), "Hello there");
    }

    #[test]
    fn test_serializes_camel_case_with_nulls() {
        let json = serde_json::to_value(episode()).unwrap();
        assert_eq!(json["audioUrl"], "https://cdn.example.com/1.mp3");
        assert_eq!(json["publishedAt"], "2024-01-01T10:00:00+00:00");
        assert!(json["image"].is_null());
    }
}
