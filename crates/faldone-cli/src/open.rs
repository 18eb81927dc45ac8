//! Open a stored document with the desktop's preferred application.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context};
use tracing::debug;

use faldone_store::Document;

/// File extension for a MIME type, without the dot.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "text/plain" => Some("txt"),
        "image/jpeg" => Some("jpg"),
        "image/tiff" => Some("tiff"),
        _ => mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied()),
    }
}

/// Write the raw bytes to a kept temp file and hand it to the opener.
pub fn open_document(doc: &Document) -> anyhow::Result<PathBuf> {
    let suffix = extension_for(&doc.mime)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix("faldone-")
        .suffix(&suffix)
        .tempfile()
        .context("creating temp file")?;
    file.write_all(&doc.raw_data)?;
    let (_, path) = file.keep().context("keeping temp file")?;

    let mut cmd = opener();
    cmd.arg(&path);
    debug!("Running {:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("launching viewer for {}", path.display()))?;
    if !status.success() {
        bail!("viewer exited with {} for {}", status, path.display());
    }
    Ok(path)
}

#[cfg(target_os = "macos")]
fn opener() -> Command {
    Command::new("open")
}

#[cfg(target_os = "windows")]
fn opener() -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener() -> Command {
    Command::new("xdg-open")
}
