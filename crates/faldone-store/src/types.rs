//! Data types for documents, index matches and search results.

use serde::{Serialize, Serializer};

/// Marker inserted by the index before a matched term in a snippet.
pub const MATCH_START: &str = "\u{2}";
/// Marker inserted by the index after a matched term in a snippet.
pub const MATCH_END: &str = "\u{3}";
/// Ellipsis used where a snippet window cuts the column text.
pub const ELLIPSIS: &str = "\u{2026}";

/// A document row from the database.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub labels: String,
    pub mime: String,
    pub text_data: String,
    #[serde(skip)]
    pub raw_data: Vec<u8>,
}

impl Document {
    /// Labels as individual tags.
    pub fn label_list(&self) -> Vec<&str> {
        split_labels(&self.labels).collect()
    }
}

/// The listing view of a document: everything but the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub title: String,
    pub mime: String,
    pub labels: String,
}

/// Fields for a document about to be inserted.
#[derive(Debug, Clone, Copy)]
pub struct NewDocument<'a> {
    pub title: &'a str,
    pub labels: &'a str,
    pub mime: &'a str,
    pub text: &'a str,
    pub raw: &'a [u8],
}

/// Split a comma-separated label string into trimmed, non-empty tags.
pub fn split_labels(labels: &str) -> impl Iterator<Item = &str> {
    labels.split(',').map(str::trim).filter(|l| !l.is_empty())
}

/// Highlighted excerpt produced by the index, with match boundaries marked
/// by [`MATCH_START`] / [`MATCH_END`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snippet(pub String);

/// A run of snippet text, either inside or outside a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetSegment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

impl Snippet {
    /// Raw snippet text including markers.
    pub fn as_marked(&self) -> &str {
        &self.0
    }

    /// Snippet text with the match markers removed.
    pub fn plain(&self) -> String {
        self.0.replace(MATCH_START, "").replace(MATCH_END, "")
    }

    /// Split into alternating plain and matched runs, in order.
    ///
    /// An unterminated match runs to the end of the snippet.
    pub fn segments(&self) -> Vec<SnippetSegment<'_>> {
        let mut out = Vec::new();
        let mut rest = self.0.as_str();
        while !rest.is_empty() {
            let Some(start) = rest.find(MATCH_START) else {
                out.push(SnippetSegment { text: rest, matched: false });
                break;
            };
            if start > 0 {
                out.push(SnippetSegment { text: &rest[..start], matched: false });
            }
            let after = &rest[start + MATCH_START.len()..];
            let (matched, next) = match after.find(MATCH_END) {
                Some(end) => (&after[..end], &after[end + MATCH_END.len()..]),
                None => (after, ""),
            };
            if !matched.is_empty() {
                out.push(SnippetSegment { text: matched, matched: true });
            }
            rest = next;
        }
        out
    }
}

impl Serialize for Snippet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.plain())
    }
}

/// One candidate produced by the index, before ranking.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: i64,
    pub title: String,
    pub snippet: Snippet,
    /// Packed `matchinfo(..., 'pcx')` statistics for this candidate.
    pub match_info: Vec<u8>,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub snippet: Snippet,
    pub score: f64,
}

/// Document count for one MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MimeCount {
    pub mime: String,
    pub documents: i64,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub index_entries: i64,
    pub by_mime: Vec<MimeCount>,
    pub db_path: String,
    pub db_size_mb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_labels() {
        let labels: Vec<&str> = split_labels(" taxes, 2023 ,,bank").collect();
        assert_eq!(labels, vec!["taxes", "2023", "bank"]);
        assert_eq!(split_labels("").count(), 0);
    }

    #[test]
    fn test_snippet_segments() {
        let snippet = Snippet(format!(
            "{ELLIPSIS}the quick {MATCH_START}brown{MATCH_END} {MATCH_START}fox{MATCH_END}{ELLIPSIS}"
        ));
        let segments = snippet.segments();
        let matched: Vec<&str> = segments.iter().filter(|s| s.matched).map(|s| s.text).collect();
        assert_eq!(matched, vec!["brown", "fox"]);
        assert_eq!(segments[0].text, "\u{2026}the quick ");
        assert_eq!(segments.last().unwrap().text, "\u{2026}");
        assert_eq!(snippet.plain(), "\u{2026}the quick brown fox\u{2026}");
    }

    #[test]
    fn test_snippet_unterminated_match() {
        let snippet = Snippet(format!("a {MATCH_START}b"));
        let segments = snippet.segments();
        assert_eq!(segments.len(), 2);
        assert!(segments[1].matched);
        assert_eq!(segments[1].text, "b");
    }
}
