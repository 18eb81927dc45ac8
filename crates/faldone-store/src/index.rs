//! Full-text matching and ranked search over the FTS4 index.

use std::cmp::Ordering;

use rusqlite::params;
use tracing::{debug, warn};

use crate::rank;
use crate::sqlite::DocumentStore;
use crate::types::*;
use faldone_core::{Error, Result};

/// Maximum number of ranked results returned by [`DocumentStore::search`].
pub const SEARCH_LIMIT: usize = 10;

/// Width of the snippet window, in tokens.
pub const SNIPPET_TOKENS: i64 = 20;

/// `snippet()` column argument meaning "whichever column matches best".
const ANY_COLUMN: i64 = -1;

const MATCH_SQL: &str = "SELECT docid, title, \
                         snippet(documents_idx, ?2, ?3, ?4, ?5, ?6), \
                         matchinfo(documents_idx, 'pcx') \
                         FROM documents_idx \
                         WHERE documents_idx MATCH ?1";

impl DocumentStore {
    /// Stream every document matching `query` through `visit`, unranked.
    ///
    /// `query` uses FTS4 MATCH syntax: bare terms are ANDed, `"..."` groups
    /// a phrase. The store lock is held while visiting, so `visit` must not
    /// call back into the store. A blank query matches nothing.
    pub fn for_each_match<F>(&self, query: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(IndexMatch) -> Result<()>,
    {
        if query.trim().is_empty() {
            return Ok(());
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(MATCH_SQL)
            .map_err(|e| Error::Database(e.to_string()))?;
        let mut rows = stmt
            .query(params![
                query,
                MATCH_START,
                MATCH_END,
                ELLIPSIS,
                ANY_COLUMN,
                SNIPPET_TOKENS
            ])
            .map_err(map_match_error)?;

        while let Some(row) = rows.next().map_err(map_match_error)? {
            let hit = IndexMatch {
                id: row.get(0).map_err(|e| Error::Database(e.to_string()))?,
                title: row
                    .get::<_, Option<String>>(1)
                    .map_err(|e| Error::Database(e.to_string()))?
                    .unwrap_or_default(),
                snippet: Snippet(
                    row.get::<_, Option<String>>(2)
                        .map_err(|e| Error::Database(e.to_string()))?
                        .unwrap_or_default(),
                ),
                match_info: row
                    .get::<_, Option<Vec<u8>>>(3)
                    .map_err(|e| Error::Database(e.to_string()))?
                    .unwrap_or_default(),
            };
            visit(hit)?;
        }
        Ok(())
    }

    /// Search the index and return the top [`SEARCH_LIMIT`] results by score.
    ///
    /// Candidates whose statistics buffer cannot be decoded score zero
    /// instead of failing the query. Equal scores keep index order.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut matches = Vec::new();
        self.for_each_match(query, |hit| {
            matches.push(hit);
            Ok(())
        })?;

        let candidates = matches.len();
        let ranked = rank_matches(matches);
        debug!(
            "Search {:?}: {} candidates, returning {}",
            query,
            candidates,
            ranked.len()
        );
        Ok(ranked)
    }
}

/// Score every match, stable-sort by score descending and keep the top
/// [`SEARCH_LIMIT`]. A match with an undecodable buffer scores zero.
pub fn rank_matches(matches: impl IntoIterator<Item = IndexMatch>) -> Vec<SearchResult> {
    let mut ranked: Vec<SearchResult> = matches
        .into_iter()
        .map(|hit| {
            let score = match rank::score(&hit.match_info) {
                Ok(score) => score,
                Err(e) => {
                    warn!("Scoring document {} as zero: {}", hit.id, e);
                    0.0
                }
            };
            SearchResult {
                id: hit.id,
                title: hit.title,
                snippet: hit.snippet,
                score,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(SEARCH_LIMIT);
    ranked
}

/// Distinguish a rejected MATCH expression from other database failures.
fn map_match_error(e: rusqlite::Error) -> Error {
    let msg = e.to_string();
    if msg.contains("MATCH") || msg.contains("fts") {
        Error::InvalidQuery(msg)
    } else {
        Error::Database(msg)
    }
}
