//! Content type detection from the bytes themselves.
//!
//! File names and declared types are never consulted: a `.txt` holding a PNG
//! is an image.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_GIF: &str = "image/gif";
pub const MIME_BMP: &str = "image/bmp";
pub const MIME_TIFF: &str = "image/tiff";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_PBM: &str = "image/x-portable-bitmap";
pub const MIME_PGM: &str = "image/x-portable-graymap";
pub const MIME_PPM: &str = "image/x-portable-pixmap";
pub const MIME_ZIP: &str = "application/zip";
pub const MIME_GZIP: &str = "application/gzip";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XML: &str = "text/xml";
pub const MIME_EMPTY: &str = "application/x-empty";
/// Returned when nothing else matches.
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// Bytes inspected by the text-markup heuristics.
const SNIFF_WINDOW: usize = 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", MIME_PNG),
    (b"\xFF\xD8\xFF", MIME_JPEG),
    (b"GIF87a", MIME_GIF),
    (b"GIF89a", MIME_GIF),
    (b"II*\x00", MIME_TIFF),
    (b"MM\x00*", MIME_TIFF),
    (b"PK\x03\x04", MIME_ZIP),
    (b"\x1F\x8B", MIME_GZIP),
];

static HTML_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(<!--.*?-->\s*)*<(!doctype\s+html|html|head|body|title)[\s>]").unwrap()
});
static XML_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<\?xml[\s?]").unwrap());

/// Broad extraction class of a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeClass {
    Pdf,
    Image,
    Text,
    Unsupported,
}

impl MimeClass {
    /// Classify a MIME label.
    pub fn of(mime: &str) -> Self {
        if mime == MIME_PDF {
            Self::Pdf
        } else if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("text/") {
            Self::Text
        } else {
            Self::Unsupported
        }
    }
}

/// Sniff the MIME type of a buffer. Never fails: unclassifiable input is
/// [`MIME_UNKNOWN`], empty input is [`MIME_EMPTY`].
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return MIME_EMPTY;
    }
    if let Some(mime) = sniff_magic(bytes) {
        return mime;
    }
    if looks_like_text(bytes) {
        return sniff_markup(bytes);
    }
    MIME_UNKNOWN
}

fn sniff_magic(bytes: &[u8]) -> Option<&'static str> {
    for &(signature, mime) in SIGNATURES {
        if bytes.starts_with(signature) {
            return Some(mime);
        }
    }
    if is_pdf(bytes) {
        return Some(MIME_PDF);
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(MIME_WEBP);
    }
    // BITMAPFILEHEADER: "BM", file size, two reserved zero words.
    if bytes.len() >= 14 && bytes.starts_with(b"BM") && bytes[6..10] == [0, 0, 0, 0] {
        return Some(MIME_BMP);
    }
    sniff_netpbm(bytes)
}

fn is_pdf(bytes: &[u8]) -> bool {
    let mut slice = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    while let Some((first, rest)) = slice.split_first() {
        if first.is_ascii_whitespace() {
            slice = rest;
        } else {
            break;
        }
    }
    slice.starts_with(b"%PDF-")
}

/// `P1`..`P6`, then whitespace or `#` comment lines, then `width height`.
fn sniff_netpbm(bytes: &[u8]) -> Option<&'static str> {
    let mime = match bytes {
        [b'P', b'1' | b'4', sep, ..] if sep.is_ascii_whitespace() => MIME_PBM,
        [b'P', b'2' | b'5', sep, ..] if sep.is_ascii_whitespace() => MIME_PGM,
        [b'P', b'3' | b'6', sep, ..] if sep.is_ascii_whitespace() => MIME_PPM,
        _ => return None,
    };
    let rest = netpbm_number(&bytes[2..])?;
    netpbm_number(rest)?;
    Some(mime)
}

/// Skip separators and comments, then consume one decimal number that is
/// terminated by whitespace.
fn netpbm_number(mut bytes: &[u8]) -> Option<&[u8]> {
    loop {
        match bytes.split_first() {
            Some((b, rest)) if b.is_ascii_whitespace() => bytes = rest,
            Some((b'#', rest)) => {
                let eol = rest.iter().position(|&b| b == b'\n' || b == b'\r')?;
                bytes = &rest[eol..];
            }
            _ => break,
        }
    }
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    match bytes.get(digits) {
        Some(end) if digits > 0 && end.is_ascii_whitespace() => Some(&bytes[digits..]),
        _ => None,
    }
}

/// Text means: no NUL, no control characters beyond ordinary whitespace and
/// ESC, and either valid UTF-8 or 8-bit Latin-1 without C1 controls.
fn looks_like_text(bytes: &[u8]) -> bool {
    let allowed_control = |b: u8| matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B);
    if bytes
        .iter()
        .any(|&b| (b < 0x20 && !allowed_control(b)) || b == 0x7F)
    {
        return false;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => !s.chars().any(|c| ('\u{80}'..'\u{A0}').contains(&c)),
        Err(_) => !bytes.iter().any(|&b| (0x80..0xA0).contains(&b)),
    }
}

fn sniff_markup(bytes: &[u8]) -> &'static str {
    let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    let head = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    if XML_RE.is_match(head) {
        MIME_XML
    } else if HTML_RE.is_match(head) {
        MIME_HTML
    } else {
        MIME_TEXT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf() {
        assert_eq!(detect_mime(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj"), MIME_PDF);
        assert_eq!(detect_mime(b"\xEF\xBB\xBF \n%PDF-1.4\n"), MIME_PDF);
        assert_eq!(MimeClass::of(detect_mime(b"%PDF-1.4")), MimeClass::Pdf);
    }

    #[test]
    fn test_images() {
        assert_eq!(detect_mime(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), MIME_PNG);
        assert_eq!(detect_mime(b"\xFF\xD8\xFF\xE0\0\x10JFIF\0"), MIME_JPEG);
        assert_eq!(detect_mime(b"GIF89a\x01\0\x01\0"), MIME_GIF);
        assert_eq!(detect_mime(b"II*\0\x08\0\0\0"), MIME_TIFF);
        assert_eq!(detect_mime(b"RIFF\x24\0\0\0WEBPVP8 "), MIME_WEBP);
        assert_eq!(detect_mime(b"BM\x46\0\0\0\0\0\0\0\x36\0\0\0"), MIME_BMP);
        assert_eq!(detect_mime(b"P6\n2 2\n255\n\xff\0\0"), MIME_PPM);
        assert_eq!(detect_mime(b"P1\n# scanner\n3 1\n0 1 0\n"), MIME_PBM);
        assert_eq!(detect_mime(b"P5 4 4 255\n\x10\x20"), MIME_PGM);
        for mime in [MIME_PNG, MIME_JPEG, MIME_GIF, MIME_TIFF, MIME_WEBP, MIME_BMP, MIME_PPM] {
            assert_eq!(MimeClass::of(mime), MimeClass::Image);
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_mime(b"the quick brown fox\n"), MIME_TEXT);
        assert_eq!(detect_mime("Zürich café – naïve\n".as_bytes()), MIME_TEXT);
        // Latin-1 encoded "café"
        assert_eq!(detect_mime(b"caf\xE9 au lait"), MIME_TEXT);
        assert_eq!(MimeClass::of(MIME_TEXT), MimeClass::Text);
    }

    #[test]
    fn test_text_that_resembles_headers_is_text() {
        assert_eq!(detect_mime(b"BMW service invoice\n"), MIME_TEXT);
        assert_eq!(detect_mime(b"Please find the %PDF-1.4 report attached"), MIME_TEXT);
        assert_eq!(detect_mime(b"PK is a nice abbreviation"), MIME_TEXT);
        assert_eq!(detect_mime(b"P1 tasks: call the bank\n"), MIME_TEXT);
        assert_eq!(detect_mime(b"P2 meeting notes\n"), MIME_TEXT);
        assert_eq!(detect_mime(b"P3\tbacklog\n"), MIME_TEXT);
        assert_eq!(detect_mime(b"P4 12 apples\n"), MIME_TEXT);
    }

    #[test]
    fn test_markup() {
        assert_eq!(detect_mime(b"<!DOCTYPE html>\n<html><body>hi</body></html>"), MIME_HTML);
        assert_eq!(detect_mime(b"  <html lang=\"en\">"), MIME_HTML);
        assert_eq!(detect_mime(b"<?xml version=\"1.0\"?>\n<root/>"), MIME_XML);
        assert_eq!(MimeClass::of(MIME_HTML), MimeClass::Text);
    }

    #[test]
    fn test_containers_are_unsupported() {
        assert_eq!(detect_mime(b"PK\x03\x04\x14\0\0\0"), MIME_ZIP);
        assert_eq!(detect_mime(b"\x1F\x8B\x08\0"), MIME_GZIP);
        assert_eq!(MimeClass::of(MIME_ZIP), MimeClass::Unsupported);
    }

    #[test]
    fn test_binary_is_unknown() {
        assert_eq!(detect_mime(&[0x00, 0x01, 0x02, 0x03, 0xFE]), MIME_UNKNOWN);
        assert_eq!(detect_mime(b"text with a \0 nul"), MIME_UNKNOWN);
        assert_eq!(detect_mime(b"\x7FELF\x02\x01\x01"), MIME_UNKNOWN);
        assert_eq!(MimeClass::of(MIME_UNKNOWN), MimeClass::Unsupported);
    }

    #[test]
    fn test_empty() {
        assert_eq!(detect_mime(b""), MIME_EMPTY);
        assert_eq!(MimeClass::of(MIME_EMPTY), MimeClass::Unsupported);
    }
}
