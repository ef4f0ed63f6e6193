//! Artifact publishing: the JSON manifest, the build report and the HTML
//! download page.

mod html;
mod manifest;
mod report;

pub use html::{escape_html, render_download_page};
pub use manifest::{build_manifest, write_manifest, ArtifactKind, Manifest, ManifestEntry};
pub use report::write_build_report;
