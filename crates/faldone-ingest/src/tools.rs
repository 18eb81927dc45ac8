//! External extraction tools run as child processes.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::extract::{OcrEngine, PdfTextExtractor};
use faldone_core::{Error, Result};

/// Run `program` with `args`, returning stdout on success.
fn run_tool(name: &str, program: &Path, args: &[&OsStr]) -> Result<Vec<u8>> {
    debug!("Running {} {:?}", program.display(), args);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::ExtractorUnavailable(format!("{} ({}): {}", name, program.display(), e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ExtractionFailed(format!(
            "{} exited with {}: {}",
            name,
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

fn locate(program: &str) -> Option<PathBuf> {
    match which::which(program) {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("{} not found: {}", program, e);
            None
        }
    }
}

/// Poppler's `pdftotext`, writing text to stdout.
#[derive(Debug, Clone)]
pub struct Pdftotext {
    program: PathBuf,
}

impl Pdftotext {
    pub const PROGRAM: &'static str = "pdftotext";

    pub fn locate() -> Option<Self> {
        locate(Self::PROGRAM).map(Self::with_program)
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PdfTextExtractor for Pdftotext {
    fn name(&self) -> &str {
        Self::PROGRAM
    }

    fn extract_text(&self, path: &Path) -> Result<String> {
        let stdout = run_tool(
            Self::PROGRAM,
            &self.program,
            &[path.as_os_str(), OsStr::new("-")],
        )?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Tesseract OCR, writing text to stdout.
#[derive(Debug, Clone)]
pub struct Tesseract {
    program: PathBuf,
}

impl Tesseract {
    pub const PROGRAM: &'static str = "tesseract";

    pub fn locate() -> Option<Self> {
        locate(Self::PROGRAM).map(Self::with_program)
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl OcrEngine for Tesseract {
    fn name(&self) -> &str {
        Self::PROGRAM
    }

    fn image_to_text(&self, path: &Path) -> Result<String> {
        let stdout = run_tool(
            Self::PROGRAM,
            &self.program,
            &[path.as_os_str(), OsStr::new("stdout")],
        )?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Cuneiform OCR. It only writes to a file, so output goes through a temp file.
#[derive(Debug, Clone)]
pub struct Cuneiform {
    program: PathBuf,
}

impl Cuneiform {
    pub const PROGRAM: &'static str = "cuneiform";

    pub fn locate() -> Option<Self> {
        locate(Self::PROGRAM).map(Self::with_program)
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl OcrEngine for Cuneiform {
    fn name(&self) -> &str {
        Self::PROGRAM
    }

    fn image_to_text(&self, path: &Path) -> Result<String> {
        let out = tempfile::Builder::new()
            .prefix("faldone-ocr-")
            .suffix(".txt")
            .tempfile()?;
        run_tool(
            Self::PROGRAM,
            &self.program,
            &[
                OsStr::new("-f"),
                OsStr::new("text"),
                OsStr::new("-o"),
                out.path().as_os_str(),
                path.as_os_str(),
            ],
        )?;
        let bytes = std::fs::read(out.path())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
