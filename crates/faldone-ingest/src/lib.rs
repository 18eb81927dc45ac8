//! Faldone Ingest — content sniffing, text extraction and document ingestion.

pub mod detect;
pub mod extract;
pub mod ingest;
pub mod tools;

pub use detect::{detect_mime, MimeClass};
pub use extract::{Extraction, ExtractionMethod, Extractors, OcrEngine, PdfTextExtractor};
pub use ingest::{IngestOptions, Ingested, Ingester};
