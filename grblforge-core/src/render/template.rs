//! The versioned PlatformIO template asset.
//!
//! - `default_template()` - the template compiled into the binary
//! - `load_template(path)` - a template from a file path
//!
//! Slots are written `{{name}}`. Anything else, including PlatformIO's own
//! `${section.key}` interpolations, is copied through untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ForgeError, Result};
use crate::profile::SymbolMap;

/// Default template embedded in the binary, from `config/platformio_template.toml`.
const DEFAULT_TEMPLATE: &str = include_str!("../../config/platformio_template.toml");

/// Slots the `header` text may use.
pub const HEADER_SLOTS: &[&str] = &["default_envs", "build_date"];

/// Slots the `environment` text may use.
pub const ENVIRONMENT_SLOTS: &[&str] = &[
    "display_name",
    "env_name",
    "board",
    "upload_protocol",
    "ldscript",
    "prog_version",
    "include_flags",
    "define_flags",
    "lib_deps",
];

/// INI boilerplate, baseline defines and board table.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildTemplate {
    pub version: u32,
    /// Board symbol used when a machine names none.
    pub default_board: String,
    /// Rendered once at the top of the document.
    pub header: String,
    /// Rendered once per environment.
    pub environment: String,
    #[serde(default)]
    pub include_flags: Vec<String>,
    #[serde(default)]
    pub lib_deps: Vec<String>,
    /// System defines, lowest precedence.
    #[serde(default)]
    pub baseline: SymbolMap,
    #[serde(default)]
    pub boards: BTreeMap<String, BoardSpec>,
}

/// Platform constants for one controller board.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoardSpec {
    /// Driver environment name, e.g. `slb_ext`.
    pub env_name: String,
    pub board: String,
    pub ldscript: String,
    #[serde(default = "default_upload_protocol")]
    pub upload_protocol: String,
    /// Board defines, layered just above the baseline.
    #[serde(default)]
    pub defines: SymbolMap,
}

fn default_upload_protocol() -> String {
    "dfu".to_string()
}

impl BuildTemplate {
    pub fn board(&self, symbol: &str) -> Option<&BoardSpec> {
        self.boards.get(symbol)
    }

    /// Reject slot names the renderer does not know.
    fn check_slots(&self) -> Result<()> {
        for (part, text, allowed) in [
            ("header", &self.header, HEADER_SLOTS),
            ("environment", &self.environment, ENVIRONMENT_SLOTS),
        ] {
            for slot in slot_names(text)? {
                if !allowed.contains(&slot) {
                    return Err(ForgeError::Template(format!(
                        "unknown slot {{{{{}}}}} in {} text",
                        slot, part
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Load a template from a TOML file.
pub fn load_template(path: &Path) -> Result<BuildTemplate> {
    if !path.is_file() {
        return Err(ForgeError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
    parse_template(&content)
        .map_err(|e| ForgeError::Template(format!("{}: {}", path.display(), e)))
}

/// Parse and validate a template from TOML text.
pub fn parse_template(content: &str) -> Result<BuildTemplate> {
    let template: BuildTemplate =
        toml::from_str(content).map_err(|e| ForgeError::Template(e.to_string()))?;
    template.check_slots()?;
    Ok(template)
}

/// Get the template embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (a build-time bug).
pub fn default_template() -> BuildTemplate {
    parse_template(DEFAULT_TEMPLATE).expect("embedded platformio_template.toml must be valid")
}

/// Slot names in order of appearance.
fn slot_names(text: &str) -> Result<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| ForgeError::Template("unterminated {{ slot".to_string()))?;
        names.push(after[..end].trim());
        rest = &after[end + 2..];
    }
    Ok(names)
}

/// Substitute every `{{slot}}` in `text`. A slot with no value is an error.
pub fn fill_slots(text: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| ForgeError::Template("unterminated {{ slot".to_string()))?;
        let name = after[..end].trim();
        let value = values
            .iter()
            .find(|(slot, _)| *slot == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| ForgeError::Template(format!("no value for slot {{{{{}}}}}", name)))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
