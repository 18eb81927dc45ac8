//! Command handlers, one per [`Command`] variant.

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::{open, render, Command};
use faldone_ingest::{Extractors, IngestOptions, Ingester};
use faldone_store::{split_labels, DocumentStore};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

/// Dispatch a parsed command.
pub fn run(command: Command, store: &DocumentStore, output: Output) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Put {
            document,
            title,
            labels,
        } => put(store, &document, title.as_deref(), &labels, output, &mut out),
        Command::Search { query } => search(store, &query.join(" "), output, &mut out),
        Command::List { labels } => list(store, &labels, output, &mut out),
        Command::Stats => stats(store, output, &mut out),
        Command::Open { id } => {
            let doc = store.get(id)?;
            let path = open::open_document(&doc)?;
            writeln!(out, "Opened document {} from {}", id, path.display())?;
            Ok(())
        }
        Command::Delete { id } => {
            store.delete(id)?;
            writeln!(out, "Document {} has been removed from faldone", id)?;
            Ok(())
        }
    }
}

fn put(
    store: &DocumentStore,
    document: &Path,
    title: Option<&str>,
    labels: &str,
    output: Output,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let extractors = Extractors::discover();
    let ingester = Ingester::new(store, &extractors);
    let opts = IngestOptions { title, labels };

    let ingested = if document == Path::new("-") {
        ingester.ingest_reader(io::stdin().lock(), "<stdin>", opts)?
    } else {
        ingester.ingest_file(document, opts)?
    };

    match output {
        Output::Json => print_json(out, &ingested),
        Output::Human => {
            writeln!(
                out,
                "{} has been added to faldone (id {}, {})",
                ingested.title, ingested.id, ingested.method
            )?;
            Ok(())
        }
    }
}

fn search(store: &DocumentStore, query: &str, output: Output, out: &mut impl Write) -> anyhow::Result<()> {
    let results = store.search(query)?;
    match output {
        Output::Json => print_json(out, &results),
        Output::Human => {
            for result in &results {
                render::search_result(out, result)?;
            }
            Ok(())
        }
    }
}

fn list(store: &DocumentStore, labels: &str, output: Output, out: &mut impl Write) -> anyhow::Result<()> {
    let wanted: Vec<&str> = split_labels(labels).collect();
    let docs = store.list_labelled(&wanted)?;
    match output {
        Output::Json => print_json(out, &docs),
        Output::Human => {
            for doc in &docs {
                render::summary(out, doc)?;
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct StatsReport<'a> {
    #[serde(flatten)]
    store: faldone_store::StoreStats,
    pdf_extractor: Option<&'a str>,
    ocr_engines: Vec<&'a str>,
}

fn stats(store: &DocumentStore, output: Output, out: &mut impl Write) -> anyhow::Result<()> {
    let extractors = Extractors::discover();
    let report = StatsReport {
        store: store.stats()?,
        pdf_extractor: extractors.pdf_extractor_name(),
        ocr_engines: extractors.ocr_engine_names(),
    };
    match output {
        Output::Json => print_json(out, &report),
        Output::Human => {
            writeln!(out, "Documents: {}", report.store.total_documents)?;
            for count in &report.store.by_mime {
                writeln!(out, "  {}: {}", count.mime, count.documents)?;
            }
            writeln!(out, "Index entries: {}", report.store.index_entries)?;
            writeln!(
                out,
                "Store: {} ({:.2} MB)",
                report.store.db_path, report.store.db_size_mb
            )?;
            writeln!(
                out,
                "PDF text: {}",
                report.pdf_extractor.unwrap_or("unavailable")
            )?;
            let ocr = if report.ocr_engines.is_empty() {
                "none".to_string()
            } else {
                report.ocr_engines.join(", ")
            };
            writeln!(out, "OCR: {}", ocr)?;
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faldone_store::NewDocument;
    use tempfile::TempDir;

    fn store_with_docs() -> (DocumentStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("cli.faldone")).unwrap();
        for (title, labels, text) in [
            ("Fox story", "tales", "the quick brown fox"),
            ("Tax return", "tax,2023", "income and deductions"),
        ] {
            store
                .insert(&NewDocument {
                    title,
                    labels,
                    mime: "text/plain",
                    text,
                    raw: text.as_bytes(),
                })
                .unwrap();
        }
        (store, dir)
    }

    #[test]
    fn test_search_json() {
        let (store, _dir) = store_with_docs();
        let mut buf = Vec::new();
        search(&store, "fox", Output::Json, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let results = value.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], 1);
        assert_eq!(results[0]["title"], "Fox story");
        assert_eq!(results[0]["snippet"], "the quick brown fox");
        assert!(results[0]["score"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_list_json_filters_labels() {
        let (store, _dir) = store_with_docs();
        let mut buf = Vec::new();
        list(&store, "tax", Output::Json, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let docs = value.as_array().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["title"], "Tax return");
        assert_eq!(docs[0]["mime"], "text/plain");
    }

    #[test]
    fn test_stats_human() {
        let (store, _dir) = store_with_docs();
        let mut buf = Vec::new();
        stats(&store, Output::Human, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Documents: 2\n"));
        assert!(text.contains("  text/plain: 2\n"));
        assert!(text.contains("Index entries: 2\n"));
    }

    #[test]
    fn test_put_file_human() {
        let (store, dir) = store_with_docs();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "remember the milk").unwrap();

        let mut buf = Vec::new();
        put(&store, &path, None, "errands", Output::Human, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "memo.txt has been added to faldone (id 3, passthrough)\n");
        assert_eq!(store.get(3).unwrap().labels, "errands");
    }
}
