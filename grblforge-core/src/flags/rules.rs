//! TOML rule loading for the define merger.
//!
//! - `default_rules()` - the rule table compiled into the binary
//! - `load_rules(path)` - a rule table from a file path

use std::path::Path;

use crate::error::{ForgeError, Result};

use super::types::RuleTable;

/// Default rules embedded in the binary, from `config/symbol_rules.toml`.
const DEFAULT_RULES: &str = include_str!("../../config/symbol_rules.toml");

/// Load a rule table from a TOML file.
pub fn load_rules(path: &Path) -> Result<RuleTable> {
    if !path.is_file() {
        return Err(ForgeError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
    parse_rules(&content).map_err(|e| ForgeError::Rules(format!("{}: {}", path.display(), e)))
}

/// Parse a rule table from TOML text.
pub fn parse_rules(content: &str) -> std::result::Result<RuleTable, toml::de::Error> {
    toml::from_str(content)
}

/// Get the rule table embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (a build-time bug).
pub fn default_rules() -> RuleTable {
    parse_rules(DEFAULT_RULES).expect("embedded symbol_rules.toml must be valid TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_rules_loads() {
        let rules = default_rules();
        assert_eq!(rules.version, 1);
        assert!(rules.sort_keys);
    }

    #[test]
    fn test_default_rules_enable_both_special_rules() {
        let rules = default_rules();
        assert!(rules.renames.enabled);
        assert_eq!(rules.rename("SIENCI_ATCI"), "ATCI_ENABLE");
        assert!(rules.letter_codepoints.enabled);
        assert_eq!(rules.letter_codepoints.suffix, "_LETTER");
        assert_eq!(rules.letter_codepoint("AXIS_A_LETTER", &json!("'A'")), Some(json!(65)));
    }

    #[test]
    fn test_missing_sections_default_to_disabled() {
        let rules = parse_rules("version = 2").unwrap();
        assert_eq!(rules.version, 2);
        assert!(rules.sort_keys);
        assert!(!rules.renames.enabled);
        assert!(!rules.letter_codepoints.enabled);
    }

    #[test]
    fn test_load_rules_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "version = 3\nsort_keys = false\n[renames]\nenabled = true\n[renames.symbols]\nOLD = \"NEW\"\n",
        )
        .unwrap();

        let rules = load_rules(&path).unwrap();
        assert_eq!(rules.version, 3);
        assert!(!rules.sort_keys);
        assert_eq!(rules.rename("OLD"), "NEW");
    }

    #[test]
    fn test_load_rules_missing_file() {
        let err = load_rules(Path::new("/nonexistent/rules.toml")).unwrap_err();
        assert!(matches!(err, ForgeError::MissingFile { .. }));
    }

    #[test]
    fn test_load_rules_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "sort_keys = true").unwrap();
        let err = load_rules(&path).unwrap_err();
        assert!(matches!(err, ForgeError::Rules(_)), "missing version should fail: {:?}", err);
    }
}
