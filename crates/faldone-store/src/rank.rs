//! Relevance ranking over FTS4 `matchinfo` statistics.
//!
//! The index hands each candidate a packed buffer of unsigned 32-bit words in
//! the `pcx` layout, in host byte order. Every supported target is
//! little-endian, so this is the little-endian word format SQLite documents:
//!
//! ```text
//! [P, C, (hits_in_doc, hits_in_corpus, docs_containing) x P x C]
//! ```
//!
//! where the triple for phrase `p` and column `c` starts at word
//! `2 + (p * C + c) * 3`. The score is the sum over every phrase/column pair
//! with a hit of `hits_in_doc / hits_in_corpus`. This is a collection-frequency
//! heuristic, not BM25: it must stay arithmetically identical so existing
//! archives keep their ranking order.

use faldone_core::{Error, Result};

const WORD: usize = 4;
const HEADER_WORDS: usize = 2;
const TRIPLE_WORDS: usize = 3;

/// Counts for one phrase in one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseColumnStats {
    /// Occurrences of the phrase in this document's column.
    pub hits_in_doc: u32,
    /// Occurrences of the phrase in this column across all documents.
    pub hits_in_corpus: u32,
    /// Documents whose column contains the phrase. Decoded, never scored.
    pub docs_containing: u32,
}

/// Decoded view of a match statistics buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStats {
    words: Vec<u32>,
    phrases: usize,
    columns: usize,
}

impl MatchStats {
    /// Decode and length-check a packed buffer.
    ///
    /// Words are read in the byte order the index wrote them, which is the
    /// host's; on every supported target that is little-endian.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() % WORD != 0 {
            return Err(Error::MalformedMatchBuffer(format!(
                "length {} is not a multiple of {}",
                buf.len(),
                WORD
            )));
        }
        let words: Vec<u32> = buf
            .chunks_exact(WORD)
            .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        if words.len() < HEADER_WORDS {
            return Err(Error::MalformedMatchBuffer(format!(
                "{} words, header needs {}",
                words.len(),
                HEADER_WORDS
            )));
        }

        let phrases = words[0] as usize;
        let columns = words[1] as usize;
        let needed = phrases
            .checked_mul(columns)
            .and_then(|n| n.checked_mul(TRIPLE_WORDS))
            .and_then(|n| n.checked_add(HEADER_WORDS))
            .ok_or_else(|| {
                Error::MalformedMatchBuffer(format!("{phrases} phrases x {columns} columns overflows"))
            })?;
        if words.len() < needed {
            return Err(Error::MalformedMatchBuffer(format!(
                "truncated: {} words for {} phrases x {} columns, need {}",
                words.len(),
                phrases,
                columns,
                needed
            )));
        }

        Ok(Self {
            words,
            phrases,
            columns,
        })
    }

    pub fn phrases(&self) -> usize {
        self.phrases
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Statistics for phrase `p` in column `c`.
    pub fn get(&self, p: usize, c: usize) -> Option<PhraseColumnStats> {
        if p >= self.phrases || c >= self.columns {
            return None;
        }
        let at = HEADER_WORDS + (p * self.columns + c) * TRIPLE_WORDS;
        Some(PhraseColumnStats {
            hits_in_doc: self.words[at],
            hits_in_corpus: self.words[at + 1],
            docs_containing: self.words[at + 2],
        })
    }

    /// Relevance score: sum of `hits_in_doc / hits_in_corpus` over every
    /// phrase/column pair with at least one hit in this document.
    ///
    /// A pair claiming document hits but zero corpus hits cannot come from a
    /// consistent index and is reported as malformed.
    pub fn score(&self) -> Result<f64> {
        let mut score = 0.0f64;
        for p in 0..self.phrases {
            for c in 0..self.columns {
                let Some(stats) = self.get(p, c) else {
                    continue;
                };
                if stats.hits_in_doc == 0 {
                    continue;
                }
                if stats.hits_in_corpus == 0 {
                    return Err(Error::MalformedMatchBuffer(format!(
                        "phrase {p} column {c}: {} hits in document but none in corpus",
                        stats.hits_in_doc
                    )));
                }
                score += f64::from(stats.hits_in_doc) / f64::from(stats.hits_in_corpus);
            }
        }
        Ok(score)
    }
}

/// Decode a packed buffer and score it.
pub fn score(buf: &[u8]) -> Result<f64> {
    MatchStats::decode(buf)?.score()
}
