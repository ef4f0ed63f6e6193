//! grblHAL firmware configuration: fetch machine profiles, merge them into
//! compiler defines, render `platformio.ini`, drive the build and publish the
//! resulting images.

pub mod build;
pub mod config;
pub mod error;
pub mod flags;
pub mod generate;
pub mod profile;
pub mod publish;
pub mod render;
pub mod sanitize;

pub use config::ForgeConfig;
pub use error::{ForgeError, Result};
pub use generate::{generate_document, plan_all, plan_machine, MachineBuild};
pub use sanitize::sanitize_identifier;
