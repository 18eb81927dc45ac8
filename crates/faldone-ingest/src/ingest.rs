//! Document ingestion pipeline: bytes → MIME type → text → store.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::detect::detect_mime;
use crate::extract::{ExtractionMethod, Extractors};
use faldone_core::Result;
use faldone_store::{DocumentStore, NewDocument};

/// Caller-supplied document attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions<'a> {
    /// Title; defaults to the source file name.
    pub title: Option<&'a str>,
    /// Comma-separated labels, stored as given.
    pub labels: &'a str,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct Ingested {
    pub id: i64,
    pub title: String,
    pub mime: &'static str,
    pub method: ExtractionMethod,
}

/// Handles document ingestion: detection, extraction, and storage.
pub struct Ingester<'a> {
    store: &'a DocumentStore,
    extractors: &'a Extractors,
}

impl<'a> Ingester<'a> {
    pub fn new(store: &'a DocumentStore, extractors: &'a Extractors) -> Self {
        Self { store, extractors }
    }

    /// Ingest a file from disk.
    pub fn ingest_file(&self, path: &Path, opts: IngestOptions<'_>) -> Result<Ingested> {
        let raw = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let title = opts.title.unwrap_or(&file_name);
        self.ingest_bytes(&raw, Some(path), title, opts.labels)
    }

    /// Ingest everything readable from `reader` (e.g. stdin). `name` is the
    /// default title.
    pub fn ingest_reader<R: Read>(
        &self,
        mut reader: R,
        name: &str,
        opts: IngestOptions<'_>,
    ) -> Result<Ingested> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        self.ingest_bytes(&raw, None, opts.title.unwrap_or(name), opts.labels)
    }

    /// Ingest a buffer.
    ///
    /// Nothing is written unless detection and extraction both succeed; the
    /// document row and its index entry are then committed together.
    pub fn ingest_bytes(
        &self,
        raw: &[u8],
        source: Option<&Path>,
        title: &str,
        labels: &str,
    ) -> Result<Ingested> {
        let mime = detect_mime(raw);
        debug!("Detected {} for '{}' ({} bytes)", mime, title, raw.len());

        let extraction = self.extractors.extract(raw, mime, source)?;

        let id = self.store.insert(&NewDocument {
            title,
            labels,
            mime,
            text: &extraction.text,
            raw,
        })?;
        info!(
            "{} has been added to faldone as document {} ({}, {})",
            title, id, mime, extraction.method
        );

        Ok(Ingested {
            id,
            title: title.to_string(),
            mime,
            method: extraction.method,
        })
    }
}
