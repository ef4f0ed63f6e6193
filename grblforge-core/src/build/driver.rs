use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use super::artifact::{find_artifact, publish_artifact};
use super::builder::Builder;
use crate::generate::MachineBuild;
use crate::render::{render_document, write_atomic, BuildTemplate};

/// Where and how the driver builds.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Firmware source tree; the builder runs here.
    pub firmware_dir: PathBuf,
    /// Config file name written into `firmware_dir`.
    pub config_name: String,
    /// Published artifacts land here.
    pub output_dir: PathBuf,
    /// Recognized artifact extensions, without the dot.
    pub artifact_extensions: Vec<String>,
    pub artifact_prefix: String,
    /// Already-formatted timestamp embedded in artifact names.
    pub timestamp: String,
    /// Run the builder's clean step before each build.
    pub clean: bool,
}

impl BuildSettings {
    /// `<firmware>/.pio/build/<identifier>`
    pub fn build_dir(&self, identifier: &str) -> PathBuf {
        self.firmware_dir.join(".pio").join("build").join(identifier)
    }
}

/// Result of building one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildStatus {
    Built { artifact: PathBuf },
    ArtifactMissing,
    Failed { exit_code: Option<i32>, stderr: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildEntry {
    pub variant: String,
    pub identifier: String,
    #[serde(flatten)]
    pub status: BuildStatus,
}

impl BuildEntry {
    pub fn failed(&self) -> bool {
        matches!(self.status, BuildStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineReport {
    pub label: String,
    pub board_symbol: String,
    pub driver: String,
    pub entries: Vec<BuildEntry>,
}

/// Per-variant outcomes of a build run, grouped by machine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub machines: Vec<MachineReport>,
}

impl BuildReport {
    pub fn entries(&self) -> impl Iterator<Item = &BuildEntry> {
        self.machines.iter().flat_map(|m| m.entries.iter())
    }

    pub fn total(&self) -> usize {
        self.entries().count()
    }

    pub fn failed(&self) -> usize {
        self.entries().filter(|e| e.failed()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn artifacts_missing(&self) -> usize {
        self.entries()
            .filter(|e| e.status == BuildStatus::ArtifactMissing)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Builds each planned environment in turn through a [`Builder`].
pub struct BuildDriver<B: Builder> {
    builder: B,
    settings: BuildSettings,
}

impl<B: Builder> BuildDriver<B> {
    pub fn new(builder: B, settings: BuildSettings) -> Self {
        Self { builder, settings }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Build every environment sequentially.
    ///
    /// A failed build is recorded and the run moves on. Only failing to write
    /// the config file or to create the output directory aborts the run.
    pub fn run(
        &self,
        builds: &[MachineBuild],
        template: &BuildTemplate,
        build_date: &str,
    ) -> Result<BuildReport> {
        std::fs::create_dir_all(&self.settings.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {:?}",
                self.settings.output_dir
            )
        })?;

        let mut report = BuildReport::default();
        for machine in builds {
            info!("--- Processing {} ---", machine.label);
            let mut entries = Vec::with_capacity(machine.environments.len());

            for env in &machine.environments {
                info!("  Building variant: {}", env.display_name);
                let config = render_document(std::slice::from_ref(env), template, build_date)?;
                let config_path = self.settings.firmware_dir.join(&self.settings.config_name);
                write_atomic(&config_path, &config)
                    .with_context(|| format!("Failed to write config for {}", env.identifier))?;

                let status = self.build_one(&env.identifier);
                entries.push(BuildEntry {
                    variant: env.display_name.clone(),
                    identifier: env.identifier.clone(),
                    status,
                });
            }

            report.machines.push(MachineReport {
                label: machine.label.clone(),
                board_symbol: machine.board_symbol.clone(),
                driver: machine.driver.clone(),
                entries,
            });
        }

        info!(
            "Builds complete: {} total, {} succeeded, {} failed",
            report.total(),
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn build_one(&self, identifier: &str) -> BuildStatus {
        let work_dir = self.settings.firmware_dir.as_path();

        if self.settings.clean {
            if let Err(e) = self.builder.clean(identifier, work_dir) {
                warn!("Clean failed for {}: {:#}", identifier, e);
            }
        }

        let output = match self.builder.build(identifier, work_dir) {
            Ok(output) => output,
            Err(e) => {
                error!("  [FAILED] {}: {:#}", identifier, e);
                return BuildStatus::Failed {
                    exit_code: None,
                    stderr: format!("{:#}", e),
                };
            }
        };

        if !output.success {
            error!(
                "  [FAILED] {} exited with {:?}\n{}",
                identifier, output.exit_code, output.stderr
            );
            return BuildStatus::Failed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            };
        }

        info!("  [SUCCESS] {}", identifier);
        self.collect_artifact(identifier, &self.settings.build_dir(identifier))
    }

    fn collect_artifact(&self, identifier: &str, build_dir: &Path) -> BuildStatus {
        let Some(artifact) = find_artifact(build_dir, &self.settings.artifact_extensions) else {
            warn!("No artifact found in {:?} for {}", build_dir, identifier);
            return BuildStatus::ArtifactMissing;
        };

        match publish_artifact(
            &artifact,
            &self.settings.output_dir,
            &self.settings.artifact_prefix,
            identifier,
            &self.settings.timestamp,
        ) {
            Ok(path) => BuildStatus::Built { artifact: path },
            Err(e) => {
                warn!("Could not publish artifact for {}: {:#}", identifier, e);
                BuildStatus::ArtifactMissing
            }
        }
    }
}
