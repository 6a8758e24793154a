//! URL slugs for episodes.
//!
//! A slug is the slugified title plus a short fingerprint of the episode's
//! most unique field, so two episodes titled "Trailer" still get distinct
//! slugs. The fingerprint is a 32-bit rolling hash: stable across runs and
//! processes, but not collision resistant against crafted input. Changing it
//! would change every published episode URL.

/// Maximum length of the title part of a slug.
pub const MAX_SLUG_BASE_LEN: usize = 80;

/// Maximum length of the fingerprint suffix.
pub const FINGERPRINT_LEN: usize = 8;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase, ASCII-alphanumeric, hyphen-separated form of `input`.
///
/// Quote characters are dropped so "What's" becomes "whats" rather than
/// "what-s". Any other run of non-alphanumerics becomes one hyphen. The result
/// has no leading or trailing hyphen and is at most 80 characters.
///
/// ```
/// use showfeed::feed::slugify;
///
/// assert_eq!(slugify("Ep. 42: What's Up?!"), "ep-42-whats-up");
/// assert_eq!(slugify("  --  "), "");
/// ```
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut slug = String::with_capacity(lowered.len().min(MAX_SLUG_BASE_LEN));
    let mut pending_hyphen = false;

    for c in lowered.chars().filter(|c| *c != '\'' && *c != '"') {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
            if slug.len() >= MAX_SLUG_BASE_LEN {
                break;
            }
        } else {
            pending_hyphen = true;
        }
    }

    // Only ASCII is ever pushed, so byte truncation is char-safe
    slug.truncate(MAX_SLUG_BASE_LEN);
    let trimmed_len = slug.trim_end_matches('-').len();
    slug.truncate(trimmed_len);
    slug
}

/// Rolling hash of `key` rendered in base 36.
///
/// `h = h * 31 + unit` over UTF-16 code units, wrapping at 32 bits. A `u32`
/// never needs more than 7 base-36 digits, so the output is 1 to 7
/// characters and never padded.
///
/// ```
/// use showfeed::feed::fingerprint;
///
/// assert_eq!(fingerprint("a"), "2p");
/// assert_eq!(fingerprint(""), "0");
/// ```
pub fn fingerprint(key: &str) -> String {
    let hash = key
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));

    let mut digits = Vec::with_capacity(FINGERPRINT_LEN);
    let mut n = hash;
    loop {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    digits.truncate(FINGERPRINT_LEN);

    digits.into_iter().map(char::from).collect()
}

/// Full episode slug: `slugify(title)-fingerprint(unique_key)`.
///
/// The hyphen is always present, so a title with no ASCII alphanumerics
/// (all CJK, all emoji) gives `-{fingerprint}`. Published URLs depend on it.
pub fn episode_slug(title: &str, unique_key: &str) -> String {
    format!("{}-{}", slugify(title), fingerprint(unique_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_example_title() {
        let slug = slugify("Ep. 42: What's Up?!");
        assert_eq!(slug, "ep-42-whats-up");
    }

    #[test]
    fn test_slugify_strips_double_quotes() {
        assert_eq!(slugify(r#"The "Big" One"#), "the-big-one");
    }

    #[test]
    fn test_slugify_non_ascii_becomes_separator() {
        assert_eq!(slugify("Café Société"), "caf-soci-t");
    }

    #[test]
    fn test_slugify_caps_length_and_retrims() {
        // 79 letters then a separator lands a hyphen at position 80
        let title = format!("{} {}", "a".repeat(79), "b".repeat(10));
        let slug = slugify(&title);
        assert_eq!(slug, "a".repeat(79));

        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_BASE_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_fingerprint_known_values() {
        // Values match the slugs already published by the site
        assert_eq!(fingerprint("https://cdn.example.com/ep1.mp3"), "b5zrae");
        assert_eq!(fingerprint("https://cdn.example.com/ep2.mp3"), "b6jjvr");
        assert_eq!(fingerprint("https://example.com/episodes/42"), "1uuo7kk");
    }

    #[test]
    fn test_fingerprint_uses_utf16_units() {
        assert_eq!(fingerprint("héllo"), "1pdoem");
        // Surrogate pair hashes as two units
        assert_eq!(fingerprint("😀"), "11zz7");
    }

    #[test]
    fn test_episode_slug_same_title_different_audio() {
        let a = episode_slug("Trailer", "https://cdn.example.com/ep1.mp3");
        let b = episode_slug("Trailer", "https://cdn.example.com/ep2.mp3");
        assert_eq!(a, "trailer-b5zrae");
        assert_eq!(b, "trailer-b6jjvr");
    }

    #[test]
    fn test_episode_slug_without_ascii_title_keeps_hyphen() {
        assert_eq!(episode_slug("???", "a"), "-2p");
        assert_eq!(episode_slug("播客", "a"), "-2p");
        assert_eq!(episode_slug("", "https://cdn.example.com/ep1.mp3"), "-b5zrae");
    }

    proptest! {
        #[test]
        fn prop_slugify_charset_and_shape(title in ".{0,200}") {
            let slug = slugify(&title);
            prop_assert!(slug.len() <= MAX_SLUG_BASE_LEN);
            prop_assert!(slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn prop_fingerprint_is_stable_and_short(key in ".{0,120}") {
            let first = fingerprint(&key);
            prop_assert_eq!(&first, &fingerprint(&key));
            prop_assert!(!first.is_empty() && first.len() <= FINGERPRINT_LEN);
        }
    }
}
