//! Input phase: read a UTF-8 text file and store its normalized form.

use crate::text::{Document, normalize};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the normalized text inside the output directory.
pub const INPUT_TEXT_FILE: &str = "input_text.txt";

/// Normalize `text_path` and write it to `<output_dir>/input_text.txt`.
///
/// Returns the written path.
pub fn process_text(text_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let doc = read_document(text_path)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let output_path = output_dir.join(INPUT_TEXT_FILE);
    fs::write(&output_path, doc.as_str())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    log::info!(
        "Saved {} characters to {}",
        doc.char_count(),
        output_path.display()
    );
    Ok(output_path)
}

/// Read a text file and normalize it. A missing file is an error.
pub fn read_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        anyhow::bail!("Text file not found: {}", path.display());
    }

    log::info!("Processing text file: {}", path.display());
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} as UTF-8 text", path.display()))?;
    Ok(normalize(&raw))
}
