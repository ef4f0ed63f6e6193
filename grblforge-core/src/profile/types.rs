use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ForgeError, Result};

/// Symbol name to JSON value, in document order.
pub type SymbolMap = Map<String, Value>;

/// A grblHAL machine profile: global machine defaults plus its buildable variants.
///
/// Only the sections the merger consumes are typed; anything else in the
/// document is ignored.
#[derive(Debug, Clone)]
pub struct MachineProfile {
    /// Where the document came from (URL or path), used in messages.
    pub origin: String,
    pub machine: MachineDefaults,
    pub variants: Vec<Variant>,
}

/// The `machine` section of a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MachineDefaults {
    pub name: Option<String>,
    /// Board symbol, e.g. `BOARD_LONGBOARD32_EXT`.
    pub default_board: Option<String>,
    pub default_symbols: SymbolMap,
    pub setting_defaults: SymbolMap,
    pub setting_defaults_trinamic: SymbolMap,
}

/// One named build configuration within a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub default_symbols: SymbolMap,
    #[serde(default)]
    pub setting_defaults: SymbolMap,
    #[serde(default, deserialize_with = "deserialize_defines")]
    pub defines: SymbolMap,
}

#[derive(Deserialize)]
struct RawProfile {
    #[serde(default)]
    machine: MachineDefaults,
    variants: Option<Vec<Variant>>,
}

impl MachineProfile {
    /// Parse a profile document.
    ///
    /// A missing or empty `variants` list is fatal: there is nothing to build.
    pub fn from_json(origin: &str, json: &str) -> Result<Self> {
        let raw: RawProfile = serde_json::from_str(json).map_err(|source| ForgeError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let variants = match raw.variants {
            Some(v) if !v.is_empty() => v,
            _ => {
                return Err(ForgeError::NoVariants {
                    origin: origin.to_string(),
                })
            }
        };

        Ok(Self {
            origin: origin.to_string(),
            machine: raw.machine,
            variants,
        })
    }

    /// Human-readable machine label: the machine's own name if it has one,
    /// otherwise the file stem of the origin (`altmill.json` -> `altmill`).
    pub fn display_name(&self) -> String {
        if let Some(name) = self.machine.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let last = self.origin.rsplit(['/', '\\']).next().unwrap_or(&self.origin);
        last.strip_suffix(".json").unwrap_or(last).to_string()
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}

/// Variant `defines` may be given as an object or as a list of
/// `NAME` / `NAME=VALUE` strings. Both end up as a symbol map.
fn deserialize_defines<'de, D>(deserializer: D) -> std::result::Result<SymbolMap, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(SymbolMap::new()),
        Value::Object(map) => Ok(map),
        Value::Array(items) => {
            let mut map = SymbolMap::new();
            for item in items {
                let text = item
                    .as_str()
                    .ok_or_else(|| D::Error::custom("defines list entries must be strings"))?;
                match text.split_once('=') {
                    Some((name, value)) => {
                        map.insert(name.trim().to_string(), Value::String(value.trim().to_string()))
                    }
                    None => map.insert(text.trim().to_string(), Value::Bool(true)),
                };
            }
            Ok(map)
        }
        other => Err(D::Error::custom(format!(
            "defines must be an object or a list, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_machine_and_variants() {
        let json = r#"{
            "machine": {
                "name": "AltMill",
                "default_board": "BOARD_LONGBOARD32_EXT",
                "default_symbols": {"N_AXIS": 3},
                "setting_defaults": {"DEFAULT_X_MAX_TRAVEL": 1260.0}
            },
            "variants": [
                {"name": "AltMill 4x4", "setting_defaults": {"N_AXIS": 4}}
            ]
        }"#;
        let profile = MachineProfile::from_json("altmill.json", json).unwrap();
        assert_eq!(profile.display_name(), "AltMill");
        assert_eq!(profile.variant_count(), 1);
        assert_eq!(profile.machine.default_symbols.get("N_AXIS"), Some(&json!(3)));
        assert_eq!(profile.variants[0].setting_defaults.get("N_AXIS"), Some(&json!(4)));
        assert!(profile.variants[0].defines.is_empty());
    }

    #[test]
    fn test_missing_variants_is_fatal() {
        let err = MachineProfile::from_json("x.json", r#"{"machine": {}}"#).unwrap_err();
        assert!(matches!(err, ForgeError::NoVariants { .. }), "got {:?}", err);
    }

    #[test]
    fn test_empty_variants_is_fatal() {
        let err = MachineProfile::from_json("x.json", r#"{"variants": []}"#).unwrap_err();
        assert!(err.to_string().contains("No variants found"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = MachineProfile::from_json("x.json", r#"{"variants": [ "#).unwrap_err();
        assert!(matches!(err, ForgeError::Parse { .. }));
    }

    #[test]
    fn test_variant_without_name_is_parse_error() {
        let err = MachineProfile::from_json("x.json", r#"{"variants": [{"defines": {}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ForgeError::Parse { .. }));
    }

    #[test]
    fn test_defines_as_list() {
        let json = r#"{"variants": [{"name": "A", "defines": ["ATC_ENABLE", "TOOLS=6"]}]}"#;
        let profile = MachineProfile::from_json("x.json", json).unwrap();
        let defines = &profile.variants[0].defines;
        assert_eq!(defines.get("ATC_ENABLE"), Some(&json!(true)));
        assert_eq!(defines.get("TOOLS"), Some(&json!("6")));
    }

    #[test]
    fn test_display_name_falls_back_to_origin() {
        let json = r#"{"variants": [{"name": "A"}]}"#;
        let profile = MachineProfile::from_json(
            "https://example.com/profiles/longmill.json",
            json,
        )
        .unwrap();
        assert_eq!(profile.display_name(), "longmill");
    }
}
