use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use walkdir::WalkDir;

/// First file directly inside `dir`, in file-name order, whose extension is in
/// `extensions` (case-insensitive). A missing directory yields `None`.
pub fn find_artifact(dir: &Path, extensions: &[String]) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .find(|path| has_extension(path, extensions))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Published name: `<prefix><identifier>_<timestamp>.<ext>`.
pub fn artifact_file_name(prefix: &str, identifier: &str, timestamp: &str, ext: &str) -> String {
    format!("{}{}_{}.{}", prefix, identifier, timestamp, ext)
}

/// Copy a build artifact into `output_dir` under its published name.
pub fn publish_artifact(
    artifact: &Path,
    output_dir: &Path,
    prefix: &str,
    identifier: &str,
    timestamp: &str,
) -> Result<PathBuf> {
    let ext = artifact
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_ascii_lowercase();
    let target = output_dir.join(artifact_file_name(prefix, identifier, timestamp, &ext));

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    std::fs::copy(artifact, &target)
        .with_context(|| format!("Failed to copy {:?} to {:?}", artifact, target))?;

    info!("Published {:?}", target);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_artifact_first_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("firmware.elf"), b"elf").unwrap();
        std::fs::write(dir.path().join("z.hex"), b"z").unwrap();
        std::fs::write(dir.path().join("firmware.hex"), b"hex").unwrap();

        let found = find_artifact(dir.path(), &exts(&["hex"])).unwrap();
        assert_eq!(found.file_name().unwrap(), "firmware.hex");
    }

    #[test]
    fn test_find_artifact_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a.hex")).unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("main.hex"), b"x").unwrap();

        assert!(find_artifact(dir.path(), &exts(&["hex"])).is_none());
    }

    #[test]
    fn test_find_artifact_extension_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("firmware.BIN"), b"bin").unwrap();

        assert!(find_artifact(dir.path(), &exts(&["hex"])).is_none());
        let found = find_artifact(dir.path(), &exts(&["hex", "bin"])).unwrap();
        assert_eq!(found.file_name().unwrap(), "firmware.BIN");
    }

    #[test]
    fn test_find_artifact_missing_dir() {
        assert!(find_artifact(Path::new("/nonexistent/.pio/build/x"), &exts(&["hex"])).is_none());
    }

    #[test]
    fn test_publish_artifact_name() {
        let build = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let artifact = build.path().join("firmware.hex");
        std::fs::write(&artifact, b":00000001FF").unwrap();

        let published =
            publish_artifact(&artifact, out.path(), "grblhal_", "test_a", "20260101").unwrap();
        assert_eq!(published, out.path().join("grblhal_test_a_20260101.hex"));
        assert_eq!(std::fs::read(&published).unwrap(), b":00000001FF");
    }
}
