use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use thiserror::Error;

use super::episode::Episode;
use super::slug::episode_slug;

const UNTITLED: &str = "Untitled episode";

#[derive(Debug, Error)]
#[error("Feed parse error: {0}")]
pub struct ParseError(#[from] parser::ParseFeedError);

/// Parses RSS/Atom bytes from `source` into episodes, in document order.
///
/// feed-rs is told not to invent ids, so an entry without a guid falls back
/// to its link and then to a `{source}-{title}-{date}` composite that stays
/// the same across fetches.
pub fn parse_feed(bytes: &[u8], source: &str) -> Result<Vec<Episode>, ParseError> {
    let feed = parser::Builder::new()
        .id_generator(|_links, _title, _uri| String::new())
        .build()
        .parse(bytes)?;

    let feed_image = feed_image(&feed);

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| to_episode(entry, source, feed_image.as_deref()))
        .collect())
}

fn feed_image(feed: &Feed) -> Option<String> {
    feed.logo
        .as_ref()
        .or(feed.icon.as_ref())
        .map(|img| img.uri.trim().to_string())
        .filter(|uri| !uri.is_empty())
}

/// First enclosure-like media URL (RSS `<enclosure>` or `media:content`).
fn audio_url(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref())
        .map(|u| u.to_string())
}

/// Item-level artwork (`itunes:image` / `media:thumbnail`).
fn item_image(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.trim())
        .find(|uri| !uri.is_empty())
        .map(str::to_string)
}

fn to_episode(entry: Entry, source: &str, feed_image: Option<&str>) -> Episode {
    let audio_url = audio_url(&entry);
    let image = item_image(&entry).or_else(|| feed_image.map(str::to_string));
    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty());
    let published_at = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    let raw_title = entry.title.map(|t| t.content);
    let provider_id = Some(entry.id.trim().to_string()).filter(|id| !id.is_empty());
    let id = provider_id.or_else(|| link.clone()).unwrap_or_else(|| {
        format!(
            "{}-{}-{}",
            source,
            raw_title.as_deref().unwrap_or_default(),
            published_at
        )
    });

    let title = raw_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let unique_key = audio_url.as_deref().or(link.as_deref()).unwrap_or(&id);
    let slug = episode_slug(&title, unique_key);

    let description = entry
        .summary
        .map(|s| s.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    Episode {
        id,
        slug,
        title,
        description,
        audio_url,
        published_at,
        image,
        link,
        source: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "https://feeds.example.com/show.xml";

    const PODCAST_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
    <title>The Show</title>
    <image><url>https://img.example.com/show.jpg</url><title>The Show</title><link>https://example.com</link></image>
    <item>
        <guid>ep-2</guid>
        <title>Ep. 2: Sequel</title>
        <link>https://example.com/episodes/2</link>
        <description>&lt;p&gt;Second&lt;/p&gt;</description>
        <pubDate>Tue, 02 Jan 2024 10:00:00 +0000</pubDate>
        <enclosure url="https://cdn.example.com/ep2.mp3" length="1" type="audio/mpeg"/>
        <media:thumbnail url="https://img.example.com/ep2.jpg"/>
    </item>
    <item>
        <title>Trailer</title>
        <link>https://example.com/episodes/42</link>
    </item>
    <item>
        <title>Bare</title>
        <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
    </item>
</channel>
</rss>"#;

    #[test]
    fn test_maps_full_item() {
        let episodes = parse_feed(PODCAST_RSS.as_bytes(), SOURCE).unwrap();
        assert_eq!(episodes.len(), 3);

        let ep = &episodes[0];
        assert_eq!(ep.id, "ep-2");
        assert_eq!(ep.title, "Ep. 2: Sequel");
        assert_eq!(ep.audio_url.as_deref(), Some("https://cdn.example.com/ep2.mp3"));
        assert_eq!(ep.link.as_deref(), Some("https://example.com/episodes/2"));
        assert_eq!(ep.slug, "ep-2-sequel-b6jjvr");
        assert_eq!(ep.image.as_deref(), Some("https://img.example.com/ep2.jpg"));
        assert!(ep.description.contains("Second"));
        assert!(ep.published_at.starts_with("2024-01-02T10:00:00"));
        assert_eq!(ep.source, SOURCE);
    }

    #[test]
    fn test_missing_guid_falls_back_to_link() {
        let episodes = parse_feed(PODCAST_RSS.as_bytes(), SOURCE).unwrap();
        let ep = &episodes[1];
        assert_eq!(ep.id, "https://example.com/episodes/42");
        assert_eq!(ep.slug, "trailer-1uuo7kk");
        assert_eq!(ep.published_at, "");
        // No item artwork: feed-level image
        assert_eq!(ep.image.as_deref(), Some("https://img.example.com/show.jpg"));
    }

    #[test]
    fn test_missing_guid_and_link_uses_composite() {
        let episodes = parse_feed(PODCAST_RSS.as_bytes(), SOURCE).unwrap();
        let ep = &episodes[2];
        assert!(ep.id.starts_with("https://feeds.example.com/show.xml-Bare-2024-01-01"));
        assert!(ep.slug.starts_with("bare-"));
        assert_eq!(ep.audio_url, None);
        assert_eq!(ep.link, None);
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let a = parse_feed(PODCAST_RSS.as_bytes(), SOURCE).unwrap();
        let b = parse_feed(PODCAST_RSS.as_bytes(), SOURCE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_untitled_item() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><guid>x</guid><enclosure url="https://cdn.example.com/x.mp3" length="1" type="audio/mpeg"/></item>
</channel></rss>"#;
        let episodes = parse_feed(rss.as_bytes(), SOURCE).unwrap();
        assert_eq!(episodes[0].title, "Untitled episode");
        assert!(episodes[0].slug.starts_with("untitled-episode-"));
    }

    #[test]
    fn test_atom_feed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Show</title>
    <id>urn:show</id>
    <updated>2024-03-01T00:00:00Z</updated>
    <entry>
        <id>urn:ep:1</id>
        <title>Atom Ep</title>
        <link href="https://example.com/atom/1"/>
        <updated>2024-03-01T00:00:00Z</updated>
        <summary>Summary text</summary>
    </entry>
</feed>"#;
        let episodes = parse_feed(atom.as_bytes(), SOURCE).unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].id, "urn:ep:1");
        assert_eq!(episodes[0].description, "Summary text");
        assert!(episodes[0].published_at.starts_with("2024-03-01"));
    }

    #[test]
    fn test_malformed_feed_errors() {
        assert!(parse_feed(b"this is not a feed", SOURCE).is_err());
    }
}
