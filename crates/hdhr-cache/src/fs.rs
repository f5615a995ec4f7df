//! Atomic file replacement and safe file names.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Maps an upstream identifier to a single path component.
///
/// Separators, `:` and NUL become `_`; empty, `.` and `..` become `_`.
#[must_use]
pub fn path_component(raw: &str) -> String {
    let name: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    match name.as_str() {
        "" | "." | ".." => String::from("_"),
        _ => name,
    }
}

/// Writes `contents` to `path` atomically.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over `path`. Readers see either the old file or the new one.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the
/// temporary file cannot be written, or the rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to sync temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to rename temp file to {}", path.display()))?;

    Ok(())
}
