use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{ForgeError, Result};

/// Write text to disk atomically.
///
/// Writes to a temporary file in the target's directory, then renames it over
/// the target, so an interrupted run never leaves a partial file behind.
pub fn write_atomic(target_path: &Path, content: &str) -> Result<()> {
    let parent = match target_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(|e| ForgeError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| ForgeError::io(parent, e))?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|e| ForgeError::io(temp.path(), e))?;

    temp.persist(target_path)
        .map_err(|e| ForgeError::io(target_path, e.error))?;

    info!("Wrote {:?}", target_path);
    Ok(())
}
