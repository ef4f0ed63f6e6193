//! Optional firmware builds.
//!
//! For each planned environment the driver writes a single-environment
//! `platformio.ini`, runs the [`Builder`], and copies the first recognized
//! artifact into the output directory. Build failures are recorded per variant
//! and never stop the run.

mod artifact;
mod builder;
mod driver;

pub use artifact::{artifact_file_name, find_artifact, publish_artifact};
pub use builder::{expand_args, BuildOutput, Builder, CommandBuilder, ENV_PLACEHOLDER};
pub use driver::{BuildDriver, BuildEntry, BuildReport, BuildSettings, BuildStatus, MachineReport};
