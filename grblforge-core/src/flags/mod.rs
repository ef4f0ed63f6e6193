//! Compiler define merging.
//!
//! Profile layers are merged lowest precedence first:
//!
//! 1. template baseline
//! 2. board defines
//! 3. machine `default_symbols`
//! 4. machine `setting_defaults`
//! 5. machine `setting_defaults_trinamic`
//! 6. variant `default_symbols`
//! 7. variant `setting_defaults`
//! 8. variant `defines`
//!
//! The versioned [`RuleTable`] carries the symbol renames and the
//! `*_LETTER` code point conversion, each independently switchable.

mod merge;
mod rules;
mod types;

pub use merge::{merge_layers, merge_maps, Layer};
pub use rules::{default_rules, load_rules, parse_rules};
pub use types::*;
