//! Type definitions for the define merger.
//!
//! `RuleTable` is loaded from TOML; `Define` / `DefineSet` are the merge output.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// RULE TABLE (loaded from TOML)
// =============================================================================

/// Versioned symbol rules applied while merging.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTable {
    pub version: u32,
    /// Render defines sorted by name instead of merge order.
    #[serde(default = "default_true")]
    pub sort_keys: bool,
    #[serde(default)]
    pub renames: RenameRule,
    #[serde(default)]
    pub letter_codepoints: LetterRule,
}

/// Rename source symbols before they are merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenameRule {
    #[serde(default)]
    pub enabled: bool,
    /// Source name -> output name.
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
}

/// Convert single-character values of `*_LETTER` symbols to code points.
#[derive(Debug, Clone, Deserialize)]
pub struct LetterRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_letter_suffix")]
    pub suffix: String,
}

impl Default for LetterRule {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: default_letter_suffix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_letter_suffix() -> String {
    "_LETTER".to_string()
}

impl RuleTable {
    /// A table with every rule switched off.
    pub fn passthrough() -> Self {
        Self {
            version: 0,
            sort_keys: true,
            renames: RenameRule::default(),
            letter_codepoints: LetterRule::default(),
        }
    }

    /// Output name for a source symbol.
    pub fn rename<'a>(&'a self, key: &'a str) -> &'a str {
        if !self.renames.enabled {
            return key;
        }
        self.renames.symbols.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Code point replacement for a `*_LETTER` value, if the rule applies.
    ///
    /// Single quotes are removed and whitespace trimmed first, so `"'X'"`
    /// and `"X"` both become `88`.
    pub fn letter_codepoint(&self, key: &str, value: &Value) -> Option<Value> {
        if !self.letter_codepoints.enabled || !key.ends_with(&self.letter_codepoints.suffix) {
            return None;
        }
        let unquoted = value.as_str()?.replace('\'', "");
        let mut chars = unquoted.trim().chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Some(Value::from(letter as u32))
    }
}

// =============================================================================
// MERGE OUTPUT
// =============================================================================

/// Value of a merged define. Absent (boolean `false`) defines never reach here.
#[derive(Debug, Clone, PartialEq)]
pub enum DefineValue {
    /// Bare `-D NAME`.
    Flag,
    /// `-D NAME=literal`, interpolated verbatim.
    Literal(String),
}

impl DefineValue {
    /// Convert a scalar JSON value. Returns `None` for `false` and for
    /// non-scalars (arrays, objects).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) | Value::Null => Some(Self::Flag),
            Value::Bool(false) => None,
            Value::Number(n) => Some(Self::Literal(n.to_string())),
            Value::String(s) => Some(Self::Literal(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// One compiler define.
#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub name: String,
    pub value: DefineValue,
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            DefineValue::Flag => write!(f, "-D {}", self.name),
            DefineValue::Literal(v) => write!(f, "-D {}={}", self.name, v),
        }
    }
}

/// Ordered, de-duplicated set of defines produced by a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineSet {
    defines: Vec<Define>,
}

impl DefineSet {
    pub(crate) fn from_defines(defines: Vec<Define>) -> Self {
        Self { defines }
    }

    pub fn get(&self, name: &str) -> Option<&DefineValue> {
        self.defines.iter().find(|d| d.name == name).map(|d| &d.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Define> {
        self.defines.iter()
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// `-D ...` strings in set order.
    pub fn to_flags(&self) -> Vec<String> {
        self.defines.iter().map(Define::to_string).collect()
    }
}
