//! IO utilities for output files

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Ensures the parent directory exists for a file path.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Writes `data` to `path` through a sibling temp file and a rename.
///
/// Readers see either the previous file or the complete new one.
#[instrument(skip(data), fields(bytes = data.len()))]
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "output persisted");
    Ok(())
}

/// Returns true if path has one of the allowed extensions.
pub fn has_allowed_extension(path: &Path, allowed: &[&str]) -> bool {
    match path.extension() {
        Some(ext) => allowed.iter().any(|e| ext.eq_ignore_ascii_case(*e)),
        None => false,
    }
}
