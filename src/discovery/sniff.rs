//! Content sniffing
//!
//! Pure byte-slice heuristics used by the classifier. Nothing in here
//! touches the filesystem, so every function can be tested directly.
//!
//! The MIME detection follows the WHATWG sniffing algorithm closely
//! enough to tell text apart from the common binary formats: leading
//! markup, byte order marks, a table of well-known signatures and
//! finally a scan for control bytes that never occur in text.

use std::fmt;

use crate::core::constants::classify::SNIFF_LEN;

/// Byte sequences that mark content as not worth scanning, regardless
/// of what the MIME sniffer would say.
pub const MAGIC_HEADERS: [&[u8]; 10] = [
    // PGP messages and signatures are text, but only base64 blobs
    b"-----BEGIN PGP MESSAGE-----",
    b"-----BEGIN PGP SIGNATURE-----",
    // ELF
    &[0x7f, 0x45, 0x4c, 0x46],
    // PostScript
    &[0x25, 0x21, 0x50, 0x53],
    // PDF
    &[0x25, 0x50, 0x44, 0x46],
    // Java class file
    &[0xca, 0xfe, 0xba, 0xbe],
    // PNG
    &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a],
    // ZIP, JAR, ODF, OOXML
    &[0x50, 0x4b, 0x03, 0x04],
    &[0x50, 0x4b, 0x05, 0x06],
    &[0x50, 0x4b, 0x07, 0x08],
];

/// A sniffed content type such as `text/plain; charset=utf-8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentType {
    pub essence: &'static str,
    pub charset: Option<&'static str>,
}

impl ContentType {
    const fn new(essence: &'static str, charset: Option<&'static str>) -> Self {
        Self { essence, charset }
    }

    const fn utf8_text(essence: &'static str) -> Self {
        Self::new(essence, Some("utf-8"))
    }

    const fn binary(essence: &'static str) -> Self {
        Self::new(essence, None)
    }

    /// The part before the slash, e.g. `text` or `image`.
    pub fn top_level(&self) -> &'static str {
        self.essence.split('/').next().unwrap_or(self.essence)
    }

    pub fn is_utf8_text(&self) -> bool {
        self.top_level() == "text" && self.charset == Some("utf-8")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.charset {
            Some(charset) => write!(f, "{}; charset={}", self.essence, charset),
            None => f.write_str(self.essence),
        }
    }
}

const OCTET_STREAM: ContentType = ContentType::binary("application/octet-stream");
const PLAIN_TEXT: ContentType = ContentType::utf8_text("text/plain");

/// Tags that identify HTML when they open the document. Compared
/// case-insensitively and must be followed by a space or `>`.
const HTML_TAGS: [&[u8]; 17] = [
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Exact prefix signatures.
const PREFIX_SIGNATURES: [(&[u8], ContentType); 24] = [
    (b"%PDF-", ContentType::binary("application/pdf")),
    (b"%!PS-Adobe-", ContentType::binary("application/postscript")),
    // Byte order marks
    (&[0xfe, 0xff], ContentType::new("text/plain", Some("utf-16be"))),
    (&[0xff, 0xfe], ContentType::new("text/plain", Some("utf-16le"))),
    (&[0xef, 0xbb, 0xbf], PLAIN_TEXT),
    // Images
    (&[0x00, 0x00, 0x01, 0x00], ContentType::binary("image/x-icon")),
    (&[0x00, 0x00, 0x02, 0x00], ContentType::binary("image/x-icon")),
    (b"BM", ContentType::binary("image/bmp")),
    (b"GIF87a", ContentType::binary("image/gif")),
    (b"GIF89a", ContentType::binary("image/gif")),
    (
        &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a],
        ContentType::binary("image/png"),
    ),
    (&[0xff, 0xd8, 0xff], ContentType::binary("image/jpeg")),
    // Audio and video
    (b"ID3", ContentType::binary("audio/mpeg")),
    (b"OggS\x00", ContentType::binary("application/ogg")),
    (b"MThd\x00\x00\x00\x06", ContentType::binary("audio/midi")),
    (&[0x1a, 0x45, 0xdf, 0xa3], ContentType::binary("video/webm")),
    // Fonts
    (b"wOFF", ContentType::binary("font/woff")),
    (b"wOF2", ContentType::binary("font/woff2")),
    // Archives
    (&[0x1f, 0x8b, 0x08], ContentType::binary("application/x-gzip")),
    (b"PK\x03\x04", ContentType::binary("application/zip")),
    (
        b"Rar!\x1a\x07\x00",
        ContentType::binary("application/x-rar-compressed"),
    ),
    (
        b"Rar!\x1a\x07\x01\x00",
        ContentType::binary("application/x-rar-compressed"),
    ),
    (b"\x00asm", ContentType::binary("application/wasm")),
    (b"BZh", ContentType::binary("application/x-bzip2")),
];

/// RIFF containers carry their real type at offset 8.
const RIFF_SIGNATURES: [(&[u8], ContentType); 3] = [
    (b"WEBPVP", ContentType::binary("image/webp")),
    (b"WAVE", ContentType::binary("audio/wave")),
    (b"AVI ", ContentType::binary("video/avi")),
];

/// True if the content starts with one of the [`MAGIC_HEADERS`].
pub fn has_magic_header(content: &[u8]) -> bool {
    MAGIC_HEADERS
        .iter()
        .any(|magic| content.starts_with(magic))
}

/// Infer a content type from at most the first [`SNIFF_LEN`] bytes.
pub fn detect_content_type(content: &[u8]) -> ContentType {
    let data = &content[..content.len().min(SNIFF_LEN)];

    let first_non_ws = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    let trimmed = &data[first_non_ws..];

    if HTML_TAGS.iter().any(|tag| is_html_tag(trimmed, tag)) {
        return ContentType::utf8_text("text/html");
    }
    if trimmed.starts_with(b"<?xml") {
        return ContentType::utf8_text("text/xml");
    }

    if let Some((_, content_type)) = PREFIX_SIGNATURES
        .iter()
        .find(|(signature, _)| data.starts_with(signature))
    {
        return *content_type;
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") {
        let kind = &data[8..];
        if let Some((_, content_type)) = RIFF_SIGNATURES
            .iter()
            .find(|(signature, _)| kind.starts_with(signature))
        {
            return *content_type;
        }
    }

    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return ContentType::binary("video/mp4");
    }

    if data.iter().any(|b| is_binary_byte(*b)) {
        OCTET_STREAM
    } else {
        PLAIN_TEXT
    }
}

/// The full text heuristic: no magic header, and the sniffed type is
/// `text/*` with a UTF-8 charset. Anything else, including UTF-16 text,
/// is rejected.
pub fn is_text(content: &[u8]) -> bool {
    !has_magic_header(content) && detect_content_type(content).is_utf8_text()
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

fn is_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }
    let matches_tag = data
        .iter()
        .zip(tag)
        .all(|(b, t)| b.to_ascii_uppercase() == *t);

    matches_tag && matches!(data[tag.len()], b' ' | b'>')
}
