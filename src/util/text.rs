use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended by [`excerpt`].
const EXCERPT_ELLIPSIS: char = '…';
/// Ellipsis appended by [`truncate_to_width`] (3 terminal columns).
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Calculates the display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within a maximum display width.
///
/// Appends "..." when text is cut. Widths of 3 or less return as many
/// characters as fit without an ellipsis. Borrowed when no cut is needed.
///
/// ```
/// use showfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..cut], suffix))
}

/// Removes terminal control characters from feed-supplied text.
///
/// Tabs and newlines survive; everything else below 0x20, DEL, and C1
/// controls (which covers the ESC that starts ANSI sequences) is dropped.
pub fn sanitize_for_terminal(s: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_control() && c != '\t' && c != '\n';
    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_unsafe(c)).collect())
}

/// Strips markup from rich-text descriptions.
///
/// Every `<...>` tag becomes a single space, whitespace runs collapse to one
/// space, and the result is trimmed. An unterminated `<` swallows the rest of
/// the input only if a closing `>` follows; otherwise it is kept as text.
///
/// ```
/// use showfeed::util::strip_html;
///
/// assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(strip_html("  a \n\n b "), "a b");
/// ```
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                text.push_str(&rest[..open]);
                text.push(' ');
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    text.push_str(rest);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text excerpt of at most `max` characters (plus a trailing `…`).
///
/// ```
/// use showfeed::util::excerpt;
///
/// assert_eq!(excerpt("<p>short</p>", 160), "short");
/// assert_eq!(excerpt("one two three", 8), "one two…");
/// ```
pub fn excerpt(text: &str, max: usize) -> String {
    let plain = strip_html(text);
    if plain.chars().count() <= max {
        return plain;
    }

    let cut: String = plain.chars().take(max).collect();
    let mut out = cut.trim_end().to_string();
    out.push(EXCERPT_ELLIPSIS);
    out
}
