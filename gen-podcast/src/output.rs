//! Persistence of chunk files: `chunk_{i}.txt` plus `chunk_{i}_meta.json`.

use crate::split::Chunk;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Sidecar metadata written next to each chunk text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// 1-based position in the document
    pub id: usize,
    pub title: String,
    pub char_count: usize,
    pub estimated_minutes: f64,
}

impl ChunkMeta {
    pub fn for_chunk(id: usize, chunk: &Chunk, chars_per_minute: usize) -> Self {
        Self {
            id,
            title: chunk
                .title
                .clone()
                .unwrap_or_else(|| format!("Chunk {}", id)),
            char_count: chunk.char_count(),
            estimated_minutes: chunk.estimated_minutes(chars_per_minute),
        }
    }
}

/// Write chunks into `dir`, replacing any chunk files from a previous run.
///
/// Returns the chunk text paths in order.
pub fn write_chunks(dir: &Path, chunks: &[Chunk], chars_per_minute: usize) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chunk directory {}", dir.display()))?;
    remove_stale_chunks(dir)?;

    let mut paths = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let id = index + 1;

        let text_path = dir.join(format!("chunk_{}.txt", id));
        fs::write(&text_path, &chunk.text)
            .with_context(|| format!("Failed to write {}", text_path.display()))?;

        let meta = ChunkMeta::for_chunk(id, chunk, chars_per_minute);
        let meta_path = dir.join(format!("chunk_{}_meta.json", id));
        let file = File::create(&meta_path).context("Failed to create chunk metadata file")?;
        serde_json::to_writer_pretty(BufWriter::new(file), &meta)
            .context("Failed to write chunk metadata JSON")?;

        log::info!(
            "Chunk {}: {} ({} chars, ~{:.1} min)",
            id,
            meta.title,
            meta.char_count,
            meta.estimated_minutes
        );
        paths.push(text_path);
    }

    Ok(paths)
}

/// Chunk text files in `dir`, ordered by their number.
pub fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = chunk_number(&path) {
            numbered.push((number, path));
        }
    }

    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// Number of a `chunk_{n}.txt` path; `None` for metadata and other files.
fn chunk_number(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("chunk_")?
        .strip_suffix(".txt")?
        .parse()
        .ok()
}

fn remove_stale_chunks(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_chunk_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("chunk_") && (n.ends_with(".txt") || n.ends_with(".json")))
            .unwrap_or(false);

        if is_chunk_file && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale {}", path.display()))?;
        }
    }
    Ok(())
}
