use serde_json::Map;
use tracing::{debug, warn};

use super::types::{Define, DefineSet, DefineValue, RuleTable};
use crate::profile::SymbolMap;

/// One precedence layer: a label for log messages and its symbols.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    pub label: &'a str,
    pub symbols: &'a SymbolMap,
}

impl<'a> Layer<'a> {
    pub fn new(label: &'a str, symbols: &'a SymbolMap) -> Self {
        Self { label, symbols }
    }
}

/// Merge mappings given lowest precedence first.
///
/// Each key takes its value from the highest layer that defines it. Keys keep
/// the position where they first appeared. No deep merging.
pub fn merge_maps<'a, I>(layers: I) -> SymbolMap
where
    I: IntoIterator<Item = &'a SymbolMap>,
{
    let mut merged = Map::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Merge precedence layers into the final define set.
///
/// Renames are applied per layer before merging, so a renamed symbol competes
/// with the target name under normal precedence. The letter rule, `false`
/// removal and ordering are applied to the merged result.
pub fn merge_layers(layers: &[Layer<'_>], rules: &RuleTable) -> DefineSet {
    let renamed: Vec<SymbolMap> = layers.iter().map(|l| rename_layer(l, rules)).collect();
    let merged = merge_maps(&renamed);

    let mut defines = Vec::with_capacity(merged.len());
    for (name, value) in merged {
        let value = rules.letter_codepoint(&name, &value).unwrap_or(value);

        if value.is_array() || value.is_object() {
            warn!("Skipping {}: value {} is not a scalar", name, value);
            continue;
        }

        if let Some(value) = DefineValue::from_json(&value) {
            defines.push(Define { name, value });
        }
    }

    if rules.sort_keys {
        defines.sort_by(|a, b| a.name.cmp(&b.name));
    }

    DefineSet::from_defines(defines)
}

fn rename_layer(layer: &Layer<'_>, rules: &RuleTable) -> SymbolMap {
    let mut renamed = Map::new();
    for (key, value) in layer.symbols {
        let name = rules.rename(key);
        if name != key.as_str() {
            debug!("Renamed {} -> {} in {} layer", key, name, layer.label);
        }
        renamed.insert(name.to_string(), value.clone());
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn map(value: Value) -> SymbolMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("fixture must be an object"),
        }
    }

    fn flags(layers: &[Layer<'_>], rules: &RuleTable) -> Vec<String> {
        merge_layers(layers, rules).to_flags()
    }

    #[test]
    fn test_highest_layer_wins() {
        let base = map(json!({"A": 1, "B": 1, "C": 1}));
        let mid = map(json!({"B": 2, "C": 2}));
        let top = map(json!({"C": 3}));

        let set = merge_layers(
            &[
                Layer::new("base", &base),
                Layer::new("mid", &mid),
                Layer::new("top", &top),
            ],
            &RuleTable::passthrough(),
        );
        assert_eq!(set.get("A"), Some(&DefineValue::Literal("1".into())));
        assert_eq!(set.get("B"), Some(&DefineValue::Literal("2".into())));
        assert_eq!(set.get("C"), Some(&DefineValue::Literal("3".into())));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_merge_keeps_first_position() {
        let mut rules = RuleTable::passthrough();
        rules.sort_keys = false;
        let base = map(json!({"B": 1, "A": 1}));
        let top = map(json!({"A": 2, "Z": 2}));
        let out = flags(&[Layer::new("base", &base), Layer::new("top", &top)], &rules);
        assert_eq!(out, vec!["-D B=1", "-D A=2", "-D Z=2"]);
    }

    #[test]
    fn test_merge_maps_overrides_key_for_key() {
        let base = map(json!({"A": 1, "B": {"x": 1}}));
        let top = map(json!({"B": {"y": 2}}));
        let merged = merge_maps([&base, &top]);
        assert_eq!(merged.get("A"), Some(&json!(1)));
        // No deep merge.
        assert_eq!(merged.get("B"), Some(&json!({"y": 2})));
    }

    #[test]
    fn test_false_is_omitted_and_true_is_bare() {
        let symbols = map(json!({"SAFETY_DOOR": false, "WEB_BUILD": true, "N_AXIS": 4}));
        let out = flags(&[Layer::new("test", &symbols)], &RuleTable::passthrough());
        assert_eq!(out, vec!["-D N_AXIS=4", "-D WEB_BUILD"]);
        assert!(out.iter().all(|f| !f.contains("SAFETY_DOOR")));
    }

    #[test]
    fn test_higher_false_removes_lower_true() {
        let base = map(json!({"PROBE_ENABLE": 1}));
        let top = map(json!({"PROBE_ENABLE": false}));
        let set = merge_layers(
            &[Layer::new("base", &base), Layer::new("top", &top)],
            &RuleTable::passthrough(),
        );
        assert!(!set.contains("PROBE_ENABLE"));
    }

    #[test]
    fn test_rename_competes_under_precedence() {
        let mut rules = RuleTable::passthrough();
        rules.renames.enabled = true;
        rules
            .renames
            .symbols
            .insert("SIENCI_ATCI".into(), "ATCI_ENABLE".into());

        let machine = map(json!({"ATCI_ENABLE": 0}));
        let variant = map(json!({"SIENCI_ATCI": 1}));
        let set = merge_layers(
            &[Layer::new("machine", &machine), Layer::new("variant", &variant)],
            &rules,
        );
        assert_eq!(set.get("ATCI_ENABLE"), Some(&DefineValue::Literal("1".into())));
        assert!(!set.contains("SIENCI_ATCI"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_rename_disabled_keeps_source_name() {
        let variant = map(json!({"SIENCI_ATCI": 1}));
        let set = merge_layers(&[Layer::new("variant", &variant)], &RuleTable::passthrough());
        assert!(set.contains("SIENCI_ATCI"));
        assert!(!set.contains("ATCI_ENABLE"));
    }

    #[test]
    fn test_letter_rule_is_independent_of_rename() {
        let mut rules = RuleTable::passthrough();
        rules.letter_codepoints.enabled = true;

        let symbols = map(json!({"AXIS_A_LETTER": "'A'", "SIENCI_ATCI": 1}));
        let set = merge_layers(&[Layer::new("variant", &symbols)], &rules);
        assert_eq!(set.get("AXIS_A_LETTER"), Some(&DefineValue::Literal("65".into())));
        assert!(set.contains("SIENCI_ATCI"));
    }

    #[test]
    fn test_non_scalars_are_skipped() {
        let symbols = map(json!({"LIST": [1, 2], "OBJ": {"a": 1}, "OK": 1}));
        let set = merge_layers(&[Layer::new("variant", &symbols)], &RuleTable::passthrough());
        assert_eq!(set.to_flags(), vec!["-D OK=1"]);
    }

    #[test]
    fn test_merge_order_when_unsorted() {
        let mut rules = RuleTable::passthrough();
        rules.sort_keys = false;
        let base = map(json!({"Z": true, "A": true}));
        let top = map(json!({"M": 1}));
        let out = flags(&[Layer::new("base", &base), Layer::new("top", &top)], &rules);
        assert_eq!(out, vec!["-D Z", "-D A", "-D M=1"]);
    }

    #[test]
    fn test_strings_are_verbatim() {
        let symbols = map(json!({"NAME": "\"Alt Mill\""}));
        let out = flags(&[Layer::new("variant", &symbols)], &RuleTable::passthrough());
        assert_eq!(out, vec!["-D NAME=\"Alt Mill\""]);
    }
}
