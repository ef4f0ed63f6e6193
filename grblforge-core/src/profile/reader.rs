use std::path::Path;

use tracing::debug;

use super::types::MachineProfile;
use crate::error::{ForgeError, Result};

/// Read a machine profile from a JSON file on disk.
pub fn read_profile(path: &Path) -> Result<MachineProfile> {
    if !path.is_file() {
        return Err(ForgeError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
    let profile = MachineProfile::from_json(&path.display().to_string(), &content)?;

    debug!(
        "Read profile {:?} with {} variants from {:?}",
        profile.display_name(),
        profile.variant_count(),
        path
    );

    Ok(profile)
}
