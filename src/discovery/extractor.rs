use linkify::{LinkFinder, LinkKind};
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::Regex;

use std::borrow::Cow;

use crate::core::error::Result;
use crate::core::types::Match;

// Reuse LinkFinder instance for better performance
static LINK_FINDER: Lazy<LinkFinder> = Lazy::new(|| {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);
    finder.url_must_have_scheme(true);
    finder
});

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Compiled ignore pattern shared read-only by every producer.
///
/// A candidate is ignored only when the pattern matches the candidate's
/// whole text, so `https://example\.com` ignores `https://example.com`
/// but not `https://example.com/docs`.
#[derive(Debug, Clone, Default)]
pub struct IgnorePattern {
    regex: Option<Regex>,
}

impl IgnorePattern {
    /// Compile `pattern`; an empty pattern ignores nothing.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::none());
        }

        // Validate on its own first so errors point at the user's pattern
        Regex::new(pattern)?;
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;

        Ok(Self { regex: Some(regex) })
    }

    pub fn none() -> Self {
        Self { regex: None }
    }

    pub fn is_ignored(&self, candidate: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(candidate))
    }

    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}

/// Find every http(s) URL in `text`, in line then column order.
///
/// Lines are numbered from 1 and columns are 0-based byte offsets into
/// the line. Candidates fully matched by `ignore` are dropped.
pub fn extract(source: &str, text: &str, ignore: &IgnorePattern) -> Vec<Match> {
    extract_bytes(source, text.as_bytes(), ignore)
}

/// Like [`extract`], for content that may not be valid UTF-8.
///
/// Each line is decoded on its own with invalid sequences replaced, and
/// columns are mapped back to byte offsets into the raw line, so slicing
/// the original bytes at a match's column yields its URL.
pub fn extract_bytes(source: &str, raw: &[u8], ignore: &IgnorePattern) -> Vec<Match> {
    let mut matches = Vec::new();

    for (index, line) in raw.split(|&b| b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        // Every accepted candidate contains a scheme separator
        if memmem::find(line, b"://").is_none() {
            continue;
        }

        let decoded = DecodedLine::new(line);
        let mut spans = Vec::new();
        find_links(&decoded.text, 0, &mut spans);

        for (start, end) in spans {
            let candidate = &decoded.text[start..end];
            if !has_allowed_scheme(candidate) || ignore.is_ignored(candidate) {
                continue;
            }

            // Source is non-empty and line is >= 1 by construction, so
            // the only rejection left is an empty url which linkify never yields
            if let Ok(m) = Match::new(source, index + 1, decoded.raw_offset(start), candidate) {
                matches.push(m);
            }
        }
    }

    matches
}

/// Push the `(start, end)` byte spans of every link in `text`, shifted by
/// `base`, in ascending order.
///
/// linkify can skip a URL that runs straight into the next one, e.g.
/// `https://a.com,https://b.com` only yields the second. Any gap before or
/// between the links it returns that still holds an http(s) scheme is
/// searched again on its own.
fn find_links(text: &str, base: usize, spans: &mut Vec<(usize, usize)>) {
    let mut cursor = 0;
    for link in LINK_FINDER.links(text) {
        rescan_gap(text, cursor, link.start(), base, spans);
        spans.push((base + link.start(), base + link.end()));
        cursor = link.end();
    }
    rescan_gap(text, cursor, text.len(), base, spans);
}

fn rescan_gap(text: &str, from: usize, to: usize, base: usize, spans: &mut Vec<(usize, usize)>) {
    let Some(offset) = scheme_start(&text[from..to]) else {
        return;
    };

    let start = from + offset;
    // Rescanning the whole text again would never terminate
    if start == 0 && to == text.len() {
        return;
    }

    find_links(&text[start..to], base + start, spans);
}

/// Offset of the first `http://` or `https://` in `gap`, scheme included.
fn scheme_start(gap: &str) -> Option<usize> {
    memmem::find_iter(gap.as_bytes(), b"://").find_map(|separator| {
        let prefix = &gap[..separator];
        let scheme_len = prefix
            .bytes()
            .rev()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        let start = separator - scheme_len;
        has_allowed_scheme(&gap[start..]).then_some(start)
    })
}

fn has_allowed_scheme(candidate: &str) -> bool {
    candidate
        .split_once("://")
        .is_some_and(|(scheme, _)| {
            ALLOWED_SCHEMES
                .iter()
                .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
        })
}

/// One line decoded for link finding, with the way back to raw offsets.
struct DecodedLine<'a> {
    text: Cow<'a, str>,
    /// `(decoded, raw)` start offsets of each valid run; empty when the
    /// line was valid UTF-8 and both offsets agree
    anchors: Vec<(usize, usize)>,
}

impl<'a> DecodedLine<'a> {
    fn new(line: &'a [u8]) -> Self {
        if let Ok(text) = std::str::from_utf8(line) {
            return Self {
                text: Cow::Borrowed(text),
                anchors: Vec::new(),
            };
        }

        let mut text = String::with_capacity(line.len() + 8);
        let mut anchors = Vec::new();
        let mut raw = 0;
        for chunk in line.utf8_chunks() {
            anchors.push((text.len(), raw));
            text.push_str(chunk.valid());
            raw += chunk.valid().len();
            if !chunk.invalid().is_empty() {
                text.push(char::REPLACEMENT_CHARACTER);
                raw += chunk.invalid().len();
            }
        }

        Self {
            text: Cow::Owned(text),
            anchors,
        }
    }

    /// Map a decoded offset inside a valid run back to the raw line.
    fn raw_offset(&self, decoded: usize) -> usize {
        let idx = self.anchors.partition_point(|&(start, _)| start <= decoded);
        self.anchors[..idx]
            .last()
            .map_or(decoded, |&(start, raw)| raw + (decoded - start))
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    fn m(source: &str, line: usize, column: usize, url: &str) -> Match {
        Match::new(source, line, column, url).unwrap()
    }

    fn parse(source: &str, raw: &str, ignore: &str) -> Vec<Match> {
        extract(source, raw, &IgnorePattern::new(ignore).unwrap())
    }

    #[test]
    fn test_extract__no_matches() {
        assert_eq!(parse("empty", "", ""), Vec::<Match>::new());
        assert_eq!(parse("file1", "text", ""), Vec::<Match>::new());
        assert_eq!(
            parse("file2", "contact me@example.com or example.com", ""),
            Vec::<Match>::new()
        );
        assert_eq!(
            parse("file3", "https://example.com", "https://example\\.com"),
            Vec::<Match>::new()
        );
        assert_eq!(
            parse("file4", "text\nhttps://example.com", "https://example.com"),
            Vec::<Match>::new()
        );
        assert_eq!(
            parse(
                "file5",
                "https://example.com\nhttps://example.com",
                "https://example.com"
            ),
            Vec::<Match>::new()
        );
        assert_eq!(
            parse("file6", "https://example.com", ".*example.*"),
            Vec::<Match>::new()
        );
    }

    #[test]
    fn test_extract__single_match() {
        assert_eq!(
            parse("file1", "https://example.com", ""),
            vec![m("file1", 1, 0, "https://example.com")]
        );
        assert_eq!(
            parse("file2", "text\nhttps://example.com", ""),
            vec![m("file2", 2, 0, "https://example.com")]
        );
        assert_eq!(
            parse("file3", "  https://example.com", ""),
            vec![m("file3", 1, 2, "https://example.com")]
        );
        assert_eq!(
            parse(
                "file4",
                "https://example.com\nhttps://google.com",
                "https://google.com"
            ),
            vec![m("file4", 1, 0, "https://example.com")]
        );
        assert_eq!(
            parse(
                "file5",
                "https://example.com  https://google.com",
                "https://google.com"
            ),
            vec![m("file5", 1, 0, "https://example.com")]
        );
        assert_eq!(
            parse(
                "file6",
                "https://google.com  https://example.com",
                "https://google.com"
            ),
            vec![m("file6", 1, 20, "https://example.com")]
        );
    }

    #[test]
    fn test_extract__nested_url_is_one_match() {
        assert_eq!(
            parse("file7", "https://example.com?a=https://example.com", ""),
            vec![m(
                "file7",
                1,
                0,
                "https://example.com?a=https://example.com"
            )]
        );
    }

    #[test]
    fn test_extract__multiple_matches() {
        assert_eq!(
            parse("file1", "https://example.com  https://example.com", ""),
            vec![
                m("file1", 1, 0, "https://example.com"),
                m("file1", 1, 21, "https://example.com"),
            ]
        );
        assert_eq!(
            parse(
                "file2",
                "https://example.com  https://example.com  https://google.com",
                ""
            ),
            vec![
                m("file2", 1, 0, "https://example.com"),
                m("file2", 1, 21, "https://example.com"),
                m("file2", 1, 42, "https://google.com"),
            ]
        );
        assert_eq!(
            parse(
                "file3",
                "https://example.com\nhttps://example.com\nhttps://google.com",
                ""
            ),
            vec![
                m("file3", 1, 0, "https://example.com"),
                m("file3", 2, 0, "https://example.com"),
                m("file3", 3, 0, "https://google.com"),
            ]
        );
        assert_eq!(
            parse(
                "file4",
                "text text https://example.com text\ntext https://example.com?a=1 text",
                ""
            ),
            vec![
                m("file4", 1, 10, "https://example.com"),
                m("file4", 2, 5, "https://example.com?a=1"),
            ]
        );
    }

    #[test]
    fn test_extract__same_line_with_query() {
        let line = "see https://example.com and https://example.com?a=1";

        let result = parse("stdin", line, "");

        assert_eq!(
            result,
            vec![
                m("stdin", 1, 4, "https://example.com"),
                m("stdin", 1, 28, "https://example.com?a=1"),
            ]
        );
        for found in &result {
            let start = found.column();
            assert_eq!(&line[start..start + found.url().len()], found.url());
        }
    }

    #[test]
    fn test_extract__ignore_requires_full_match() {
        // Pattern only covers a prefix of the candidate, so it is kept
        assert_eq!(
            parse("file", "https://example.com?a=1", "https://example.com"),
            vec![m("file", 1, 0, "https://example.com?a=1")]
        );
        assert_eq!(
            parse("file", "https://example.com/docs", "example"),
            vec![m("file", 1, 0, "https://example.com/docs")]
        );
    }

    #[test]
    fn test_extract__other_schemes_are_skipped() {
        assert_eq!(
            parse("file", "ftp://example.com and mailto:me@example.com", ""),
            Vec::<Match>::new()
        );
    }

    #[test]
    fn test_has_allowed_scheme() {
        assert!(has_allowed_scheme("https://example.com"));
        assert!(has_allowed_scheme("HTTP://example.com"));
        assert!(!has_allowed_scheme("ftp://example.com"));
        assert!(!has_allowed_scheme("example.com"));
    }

    #[test]
    fn test_extract__markdown_and_punctuation() {
        assert_eq!(
            parse("README.md", "arbitrary [something](http://foo.bar) arbitrary", ""),
            vec![m("README.md", 1, 22, "http://foo.bar")]
        );
        assert_eq!(
            parse("README.md", "See https://example.com/docs.", ""),
            vec![m("README.md", 1, 4, "https://example.com/docs")]
        );
    }

    #[test]
    fn test_extract__urls_joined_by_punctuation() {
        for separator in [",", ";"] {
            let line = format!("https://a.com{separator}https://b.com");

            assert_eq!(
                parse("file", &line, ""),
                vec![
                    m("file", 1, 0, "https://a.com"),
                    m("file", 1, 14, "https://b.com"),
                ],
                "{line}"
            );
        }
    }

    #[test]
    fn test_extract__joined_urls_after_text() {
        assert_eq!(
            parse("file", "links: https://a.com,https://b.com,https://c.com", ""),
            vec![
                m("file", 1, 7, "https://a.com"),
                m("file", 1, 21, "https://b.com"),
                m("file", 1, 35, "https://c.com"),
            ]
        );
    }

    #[test]
    fn test_extract__scheme_without_host_is_not_a_link() {
        assert_eq!(
            parse("file", "http:// then https://example.com", ""),
            vec![m("file", 1, 13, "https://example.com")]
        );
    }

    #[test]
    fn test_extract_bytes__columns_index_raw_line() {
        let raw = b"caf\xe9 https://example.com\n\xff\xfe x https://example.org/\xe9";

        let found = extract_bytes("latin1.txt", raw, &IgnorePattern::none());

        assert_eq!(found[0], m("latin1.txt", 1, 5, "https://example.com"));
        assert_eq!(found[1].line(), 2);
        assert_eq!(found[1].column(), 5);
        let lines: Vec<&[u8]> = raw.split(|&b| b == b'\n').collect();
        let first = &lines[0][5..5 + found[0].url().len()];
        assert_eq!(first, found[0].url().as_bytes());
    }

    #[test]
    fn test_extract_bytes__valid_utf8_matches_extract() {
        let text = "é https://example.com\nsee https://example.org";

        assert_eq!(
            extract_bytes("f", text.as_bytes(), &IgnorePattern::none()),
            parse("f", text, "")
        );
    }

    #[test]
    fn test_extract__crlf_lines() {
        assert_eq!(
            parse("win.txt", "first\r\n  https://example.com\r\n", ""),
            vec![m("win.txt", 2, 2, "https://example.com")]
        );
    }

    #[test]
    fn test_extract__column_is_byte_offset() {
        // "é" is two bytes in UTF-8
        assert_eq!(
            parse("utf8.txt", "é https://example.com", ""),
            vec![m("utf8.txt", 1, 3, "https://example.com")]
        );
    }

    #[test]
    fn test_ignore_pattern__invalid() {
        assert!(IgnorePattern::new("[invalid").is_err());
    }

    #[test]
    fn test_ignore_pattern__empty_ignores_nothing() {
        let pattern = IgnorePattern::new("").unwrap();

        assert!(pattern.is_empty());
        assert!(!pattern.is_ignored("https://example.com"));
    }

    #[test]
    fn test_ignore_pattern__alternation_is_anchored_as_a_whole() {
        let pattern = IgnorePattern::new("https://a\\.com|https://b\\.com").unwrap();

        assert!(pattern.is_ignored("https://a.com"));
        assert!(pattern.is_ignored("https://b.com"));
        assert!(!pattern.is_ignored("https://a.com/x"));
        assert!(!pattern.is_ignored("https://x.b.com"));
    }
}
