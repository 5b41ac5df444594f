//! Line-delimited JSON helpers shared by all three stages.
//!
//! The crawler appends one record at a time (mirroring the original
//! Python crawler's "open, append, close" pattern, which keeps the file
//! durable across a crash without holding a long-lived handle). The
//! indexer rewrites its output wholesale each run and benefits from a
//! single buffered handle instead, so it gets [`Appender`].

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Appends a single record, opening and closing the file each call.
pub fn append_line<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Appends a batch of records under a single file open/close.
pub fn append_lines<T: Serialize>(path: &Path, values: &[T]) -> anyhow::Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for value in values {
        let line = serde_json::to_string(value)?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Reads every well-formed line of `path` as `T`, skipping blank lines and
/// lines that fail to parse (input line corruption is logged and
/// processing continues, it never aborts the read).
pub fn read_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(value) => out.push(value),
            Err(error) => {
                tracing::warn!(%error, "skipping corrupt ndjson line");
            }
        }
    }
    Ok(out)
}

/// A buffered writer for a freshly (re)built ndjson file, used by the
/// indexer so a full corpus rewrite doesn't reopen the file per chunk.
pub struct Appender {
    file: std::fs::File,
}

impl Appender {
    /// Truncates `path` (or creates it) and returns a writer positioned at
    /// the start. The indexer rebuilds `index.ndjson` from scratch each
    /// run so uniqueness of `url` across the file holds.
    pub fn create_new(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    pub fn write_lines<T: Serialize>(&mut self, values: &[T]) -> anyhow::Result<()> {
        for value in values {
            let line = serde_json::to_string(value)?;
            writeln!(self.file, "{line}")?;
        }
        Ok(())
    }
}
