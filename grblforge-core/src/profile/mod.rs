pub mod loader;
pub mod reader;
pub mod types;

pub use loader::{ProfileLoader, ProfileSource};
pub use reader::read_profile;
pub use types::{MachineDefaults, MachineProfile, SymbolMap, Variant};
