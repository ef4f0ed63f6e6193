use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use tracing::info;
use walkdir::WalkDir;

use crate::render::write_atomic;

/// Listing of published firmware images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// Web path relative to the site root.
    pub path: String,
    pub size: u64,
    /// File modification time.
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Binary,
    Hex,
}

impl ArtifactKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("bin") {
            Some(Self::Binary)
        } else if ext.eq_ignore_ascii_case("hex") {
            Some(Self::Hex)
        } else {
            None
        }
    }
}

/// Serialize with 4-space indentation and a trailing newline.
pub(crate) fn to_json_4space<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    let mut s = String::from_utf8(buf)?;
    if !s.ends_with('\n') {
        s.push('\n');
    }
    Ok(s)
}

impl Manifest {
    pub fn to_json_4space(&self) -> Result<String> {
        to_json_4space(self)
    }
}

/// List `.bin`/`.hex` files directly inside `dir`, sorted by name.
///
/// Each entry's path is `<web_prefix>/<name>`; an empty prefix leaves the bare
/// file name.
pub fn build_manifest(dir: &Path, web_prefix: &str) -> Result<Manifest> {
    if !dir.is_dir() {
        anyhow::bail!("Artifact directory {:?} does not exist", dir);
    }

    let prefix = web_prefix.trim_end_matches('/');
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read {:?}", dir))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = ArtifactKind::from_path(entry.path()) else {
            continue;
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {:?}", entry.path()))?;
        let modified = metadata
            .modified()
            .with_context(|| format!("No modification time for {:?}", entry.path()))?;

        files.push(ManifestEntry {
            path: if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            },
            name,
            size: metadata.len(),
            date: DateTime::<Utc>::from(modified),
            kind,
        });
    }

    Ok(Manifest {
        generated_at: Utc::now(),
        files,
    })
}

/// Build the manifest for `dir` and write it atomically to `out`.
pub fn write_manifest(dir: &Path, web_prefix: &str, out: &Path) -> Result<Manifest> {
    let manifest = build_manifest(dir, web_prefix)?;
    let json = manifest.to_json_4space()?;
    write_atomic(out, &json)?;
    info!("Manifest generated with {} entries.", manifest.files.len());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_firmware_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_20260101.hex"), b"hexdata").unwrap();
        std::fs::write(dir.path().join("a_20260101.bin"), b"bin").unwrap();
        std::fs::write(dir.path().join("index.html"), b"<html>").unwrap();
        std::fs::create_dir(dir.path().join("old.hex")).unwrap();

        let manifest = build_manifest(dir.path(), "firmware").unwrap();
        let names: Vec<_> = manifest.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_20260101.bin", "b_20260101.hex"]);

        let hex = &manifest.files[1];
        assert_eq!(hex.path, "firmware/b_20260101.hex");
        assert_eq!(hex.size, 7);
        assert_eq!(hex.kind, ArtifactKind::Hex);
        assert_eq!(manifest.files[0].kind, ArtifactKind::Binary);
    }

    #[test]
    fn test_manifest_empty_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.hex"), b"x").unwrap();
        let manifest = build_manifest(dir.path(), "").unwrap();
        assert_eq!(manifest.files[0].path, "x.hex");
    }

    #[test]
    fn test_manifest_missing_dir() {
        assert!(build_manifest(Path::new("/nonexistent/firmware"), "firmware").is_err());
    }

    #[test]
    fn test_manifest_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.bin"), b"x").unwrap();
        let json = build_manifest(dir.path(), "firmware/")
            .unwrap()
            .to_json_4space()
            .unwrap();

        assert!(json.starts_with("{\n    \"generated_at\": "));
        assert!(json.contains("\"type\": \"binary\""));
        assert!(json.contains("\"path\": \"firmware/x.bin\""));
        assert!(json.ends_with("}\n"));
    }
}
