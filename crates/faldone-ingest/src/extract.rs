//! Extraction dispatch: MIME class → strategy → text.
//!
//! PDF text extraction and OCR are external capabilities behind the
//! [`PdfTextExtractor`] and [`OcrEngine`] traits. Text inputs pass through.

use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::detect::MimeClass;
use crate::tools::{Cuneiform, Pdftotext, Tesseract};
use faldone_core::{Error, Result};

/// Turns a PDF file into text.
pub trait PdfTextExtractor: Send + Sync {
    fn name(&self) -> &str;
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Turns an image file into text.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;
    fn image_to_text(&self, path: &Path) -> Result<String>;
}

/// Which strategy produced a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ExtractionMethod {
    Passthrough,
    PdfText { tool: String },
    Ocr { engine: String },
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passthrough => write!(f, "passthrough"),
            Self::PdfText { tool } => write!(f, "pdf text via {}", tool),
            Self::Ocr { engine } => write!(f, "ocr via {}", engine),
        }
    }
}

/// Extracted text plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
}

/// Registry of available extraction capabilities.
///
/// OCR engines are tried in registration order: the first one is always used.
#[derive(Default)]
pub struct Extractors {
    pdf: Option<Box<dyn PdfTextExtractor>>,
    ocr: Vec<Box<dyn OcrEngine>>,
}

impl Extractors {
    /// A registry with no external capabilities: only text passes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Register the tools found on `PATH`.
    pub fn discover() -> Self {
        let mut extractors = Self::none();
        if let Some(pdf) = Pdftotext::locate() {
            extractors = extractors.with_pdf(pdf);
        }
        if let Some(tesseract) = Tesseract::locate() {
            extractors = extractors.with_ocr(tesseract);
        }
        if let Some(cuneiform) = Cuneiform::locate() {
            extractors = extractors.with_ocr(cuneiform);
        }
        debug!(
            "Discovered extractors: pdf={:?}, ocr={:?}",
            extractors.pdf_extractor_name(),
            extractors.ocr_engine_names()
        );
        extractors
    }

    pub fn with_pdf(mut self, extractor: impl PdfTextExtractor + 'static) -> Self {
        self.pdf = Some(Box::new(extractor));
        self
    }

    pub fn with_ocr(mut self, engine: impl OcrEngine + 'static) -> Self {
        self.ocr.push(Box::new(engine));
        self
    }

    pub fn pdf_extractor_name(&self) -> Option<&str> {
        self.pdf.as_deref().map(|p| p.name())
    }

    pub fn ocr_engine_names(&self) -> Vec<&str> {
        self.ocr.iter().map(|e| e.name()).collect()
    }

    /// Extract text from `bytes` of type `mime`.
    ///
    /// `source` is the file the bytes came from, if any; external tools read
    /// it directly, otherwise the bytes are spilled to a temporary file.
    pub fn extract(&self, bytes: &[u8], mime: &str, source: Option<&Path>) -> Result<Extraction> {
        match MimeClass::of(mime) {
            MimeClass::Text => Ok(Extraction {
                text: decode_text(bytes),
                method: ExtractionMethod::Passthrough,
            }),
            MimeClass::Pdf => {
                let tool = self.pdf.as_deref().ok_or_else(|| {
                    Error::ExtractorUnavailable("no PDF text extractor (install pdftotext)".into())
                })?;
                info!("Using `{}` for PDF text", tool.name());
                let text = with_source_file(bytes, source, |path| tool.extract_text(path))?;
                Ok(Extraction {
                    text,
                    method: ExtractionMethod::PdfText {
                        tool: tool.name().to_string(),
                    },
                })
            }
            MimeClass::Image => {
                let engine = self.ocr.first().ok_or(Error::NoOcrEngine)?;
                info!("Using `{}` for OCR", engine.name());
                let text = with_source_file(bytes, source, |path| engine.image_to_text(path))?;
                Ok(Extraction {
                    text,
                    method: ExtractionMethod::Ocr {
                        engine: engine.name().to_string(),
                    },
                })
            }
            MimeClass::Unsupported => Err(Error::UnsupportedMimeType(mime.to_string())),
        }
    }
}

/// Bytes as text: UTF-8 when valid, otherwise Latin-1 so no byte is lost.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn with_source_file<T>(
    bytes: &[u8],
    source: Option<&Path>,
    f: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    if let Some(path) = source.filter(|p| p.is_file()) {
        return f(path);
    }
    let mut tmp = tempfile::Builder::new().prefix("faldone-").tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    debug!("Spilled {} bytes to {}", bytes.len(), tmp.path().display());
    f(tmp.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{MIME_PDF, MIME_PNG, MIME_TEXT, MIME_UNKNOWN};

    struct FixedPdf;

    impl PdfTextExtractor for FixedPdf {
        fn name(&self) -> &str {
            "fixed-pdf"
        }

        fn extract_text(&self, path: &Path) -> Result<String> {
            let bytes = std::fs::read(path)?;
            Ok(format!("pdf of {} bytes", bytes.len()))
        }
    }

    struct NamedOcr(&'static str);

    impl OcrEngine for NamedOcr {
        fn name(&self) -> &str {
            self.0
        }

        fn image_to_text(&self, _path: &Path) -> Result<String> {
            Ok(format!("seen by {}", self.0))
        }
    }

    struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn name(&self) -> &str {
            "broken"
        }

        fn image_to_text(&self, _path: &Path) -> Result<String> {
            Err(Error::ExtractionFailed("broken exited with 1".into()))
        }
    }

    #[test]
    fn test_text_passthrough() {
        let out = Extractors::none()
            .extract(b"the quick brown fox", MIME_TEXT, None)
            .unwrap();
        assert_eq!(out.text, "the quick brown fox");
        assert_eq!(out.method, ExtractionMethod::Passthrough);
    }

    #[test]
    fn test_latin1_passthrough() {
        assert_eq!(decode_text(b"caf\xE9"), "café");
        assert_eq!(decode_text("café".as_bytes()), "café");
    }

    #[test]
    fn test_pdf_without_extractor() {
        let err = Extractors::none().extract(b"%PDF-1.4", MIME_PDF, None).unwrap_err();
        assert!(matches!(err, Error::ExtractorUnavailable(_)));
    }

    #[test]
    fn test_pdf_spills_to_temp_file() {
        let extractors = Extractors::none().with_pdf(FixedPdf);
        let out = extractors.extract(b"%PDF-1.4 body", MIME_PDF, None).unwrap();
        assert_eq!(out.text, "pdf of 13 bytes");
        assert_eq!(
            out.method,
            ExtractionMethod::PdfText {
                tool: "fixed-pdf".into()
            }
        );
    }

    #[test]
    fn test_pdf_reads_source_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 longer body on disk").unwrap();

        let extractors = Extractors::none().with_pdf(FixedPdf);
        let out = extractors
            .extract(b"%PDF-1.4", MIME_PDF, Some(&path))
            .unwrap();
        assert_eq!(out.text, "pdf of 28 bytes");
    }

    #[test]
    fn test_image_without_ocr() {
        let err = Extractors::none().extract(b"\x89PNG", MIME_PNG, None).unwrap_err();
        assert!(matches!(err, Error::NoOcrEngine));
    }

    #[test]
    fn test_first_ocr_engine_wins() {
        let extractors = Extractors::none()
            .with_ocr(NamedOcr("first"))
            .with_ocr(NamedOcr("second"));
        assert_eq!(extractors.ocr_engine_names(), vec!["first", "second"]);

        for _ in 0..3 {
            let out = extractors.extract(b"\x89PNG", MIME_PNG, None).unwrap();
            assert_eq!(out.text, "seen by first");
            assert_eq!(
                out.method,
                ExtractionMethod::Ocr {
                    engine: "first".into()
                }
            );
        }
    }

    #[test]
    fn test_engine_failure_is_reported() {
        let extractors = Extractors::none().with_ocr(BrokenOcr).with_ocr(NamedOcr("spare"));
        let err = extractors.extract(b"\x89PNG", MIME_PNG, None).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_unsupported() {
        let err = Extractors::none()
            .extract(&[0, 1, 2], MIME_UNKNOWN, None)
            .unwrap_err();
        match err {
            Error::UnsupportedMimeType(mime) => assert_eq!(mime, MIME_UNKNOWN),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ExtractionMethod::Passthrough.to_string(), "passthrough");
        assert_eq!(
            ExtractionMethod::Ocr {
                engine: "tesseract".into()
            }
            .to_string(),
            "ocr via tesseract"
        );
    }
}
