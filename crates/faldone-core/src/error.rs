//! Error types for Faldone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("'{0}' is not a valid faldone file")]
    InvalidStoreFile(String),

    #[error("Extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    #[error("OCR tool not found, cannot put image")]
    NoOcrEngine,

    #[error("Unsupported mime type \"{0}\"")]
    UnsupportedMimeType(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Document {0} does not exist")]
    NotFound(i64),

    #[error("Malformed match statistics: {0}")]
    MalformedMatchBuffer(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
