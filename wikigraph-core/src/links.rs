//! Inline link extraction from Markdown text.
//!
//! Only `[display text](destination)` syntax is recognized. This is not a
//! Markdown parser: code spans, reference-style links and autolinks are not
//! understood. The [`LinkExtractor`] trait keeps the graph builder independent
//! of how destinations are found.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inline link: non-empty display text without an unescaped `[` or `]`,
/// followed by a parenthesized destination that ends at the first `)` on
/// the same line.
static INLINE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[((?:\\.|[^\[\]\\])+)\]\(([^)\n]*)\)").expect("inline link pattern is valid")
});

/// Source of raw link destinations for one document.
pub trait LinkExtractor: Send + Sync {
    /// Yield candidate destinations in document order.
    ///
    /// The iterator borrows `text`, performs a single pass, and can be
    /// recreated at any time. Malformed syntax simply yields nothing.
    fn destinations<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

/// Regex-backed extractor for inline Markdown links.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownLinkExtractor;

impl LinkExtractor for MarkdownLinkExtractor {
    fn destinations<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(
            INLINE_LINK
                .captures_iter(text)
                .filter_map(|caps| caps.get(2))
                .filter_map(|m| clean_destination(m.as_str())),
        )
    }
}

/// Normalize a raw destination, dropping external and empty ones.
fn clean_destination(raw: &str) -> Option<&str> {
    let raw = raw.trim();

    let dest = match raw.strip_prefix('<') {
        Some(rest) => rest[..rest.find('>')?].trim(),
        // `[a](B.md "Title")` keeps only `B.md`
        None => raw.split_whitespace().next()?,
    };

    if dest.is_empty() || is_external(dest) {
        return None;
    }
    Some(dest)
}

fn is_external(dest: &str) -> bool {
    let has_scheme = |scheme: &str| {
        dest.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    };
    has_scheme("http://") || has_scheme("https://")
}
