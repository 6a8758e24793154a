//! Listing helpers for the episodes page: search, year filter, pager.
use std::collections::BTreeSet;

use super::episode::Episode;
use crate::util::strip_html;

/// Search-box and year-dropdown state.
#[derive(Debug, Clone, Default)]
pub struct EpisodeQuery {
    /// Case-insensitive substring over title and plain-text description.
    pub text: Option<String>,
    /// Calendar year; episodes without a parseable date never match.
    pub year: Option<i32>,
}

impl EpisodeQuery {
    pub fn matches(&self, ep: &Episode) -> bool {
        let text_ok = match self.needle() {
            Some(needle) => {
                ep.title.to_lowercase().contains(&needle)
                    || strip_html(&ep.description).to_lowercase().contains(&needle)
            }
            None => true,
        };
        let year_ok = self.year.is_none_or(|year| ep.year() == Some(year));
        text_ok && year_ok
    }

    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// Episodes matching the query, order preserved.
    pub fn apply<'a>(&self, episodes: &'a [Episode]) -> Vec<&'a Episode> {
        episodes.iter().filter(|ep| self.matches(ep)).collect()
    }
}

/// Distinct publication years, newest first.
pub fn available_years(episodes: &[Episode]) -> Vec<i32> {
    let years: BTreeSet<i32> = episodes.iter().filter_map(Episode::year).collect();
    years.into_iter().rev().collect()
}

/// Neighbours of `slug` in list order, for previous/next links.
#[derive(Debug, Clone, Copy)]
pub struct Adjacent<'a> {
    pub previous: Option<&'a Episode>,
    pub next: Option<&'a Episode>,
}

/// `None` when `slug` is not in the list.
pub fn adjacent<'a>(episodes: &'a [Episode], slug: &str) -> Option<Adjacent<'a>> {
    let idx = episodes.iter().position(|ep| ep.slug == slug)?;
    Some(Adjacent {
        previous: idx.checked_sub(1).and_then(|i| episodes.get(i)),
        next: episodes.get(idx + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ep(slug: &str, title: &str, description: &str, published: &str) -> Episode {
        Episode {
            id: slug.to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            audio_url: None,
            published_at: published.to_string(),
            image: None,
            link: None,
            source: "https://example.com/rss".to_string(),
        }
    }

    fn sample() -> Vec<Episode> {
        vec![
            ep("a", "Building in Public", "<p>Startup <b>stories</b></p>", "2024-05-01"),
            ep("b", "Creator Economy", "Talking with <i>artists</i>", "2023-02-01"),
            ep("c", "Bonus", "Behind the scenes", ""),
        ]
    }

    #[test]
    fn test_text_matches_title_case_insensitive() {
        let q = EpisodeQuery {
            text: Some("  CREATOR ".into()),
            year: None,
        };
        let episodes = sample();
        let hits: Vec<&str> = q.apply(&episodes).iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(hits, vec!["b"]);
    }

    #[test]
    fn test_text_matches_stripped_description() {
        let q = EpisodeQuery {
            text: Some("startup stories".into()),
            year: None,
        };
        assert_eq!(q.apply(&sample()).len(), 1);

        // Markup is not searchable
        let q = EpisodeQuery {
            text: Some("<b>".into()),
            year: None,
        };
        assert!(q.apply(&sample()).is_empty());
    }

    #[test]
    fn test_year_filter_skips_undated() {
        let q = EpisodeQuery {
            text: None,
            year: Some(2024),
        };
        let episodes = sample();
        let hits: Vec<&str> = q.apply(&episodes).iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(hits, vec!["a"]);
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(EpisodeQuery::default().apply(&sample()).len(), 3);
    }

    #[test]
    fn test_available_years_newest_first() {
        let mut episodes = sample();
        episodes.push(ep("d", "Again", "", "2024-01-09"));
        assert_eq!(available_years(&episodes), vec![2024, 2023]);
    }

    #[test]
    fn test_adjacent() {
        let episodes = sample();
        let mid = adjacent(&episodes, "b").unwrap();
        assert_eq!(mid.previous.map(|e| e.slug.as_str()), Some("a"));
        assert_eq!(mid.next.map(|e| e.slug.as_str()), Some("c"));

        let first = adjacent(&episodes, "a").unwrap();
        assert!(first.previous.is_none());

        assert!(adjacent(&episodes, "missing").is_none());
    }
}
