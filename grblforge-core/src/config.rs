//! `grblforge.toml` loading.
//!
//! Lookup order: an explicit path, then `./grblforge.toml`, then
//! `<config dir>/grblforge/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use tracing::{debug, info};

use crate::build::{BuildSettings, CommandBuilder, ENV_PLACEHOLDER};
use crate::error::{ForgeError, Result};
use crate::flags::{self, RuleTable};
use crate::profile::ProfileSource;
use crate::render::{self, BuildTemplate};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "grblforge.toml";

/// Sienci Labs machine profiles built when nothing else is configured.
pub const DEFAULT_PROFILE_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/Sienci-Labs/grblhal-profiles/main/profiles/altmill.json",
    "https://raw.githubusercontent.com/Sienci-Labs/grblhal-profiles/main/profiles/longmill.json",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Profile URLs or local paths, in build order.
    pub profiles: Vec<String>,
    /// Generated `platformio.ini` path for `generate`.
    pub output: PathBuf,
    /// External template; the embedded one when unset.
    pub template: Option<PathBuf>,
    /// External rule table; the embedded one when unset.
    pub rules: Option<PathBuf>,
    pub fetch: FetchConfig,
    pub build: BuildConfig,
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Seconds; 0 disables the timeout.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Firmware source tree the builder runs in.
    pub firmware_dir: PathBuf,
    /// Config file written into `firmware_dir` for each build.
    pub config_name: String,
    pub output_dir: PathBuf,
    pub program: String,
    /// `{env}` is replaced by the environment identifier.
    pub build_args: Vec<String>,
    /// Empty disables the clean step.
    pub clean_args: Vec<String>,
    pub artifact_extensions: Vec<String>,
    pub artifact_prefix: String,
    /// chrono format for the artifact timestamp.
    pub timestamp_format: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub dir: PathBuf,
    pub out: PathBuf,
    /// Prefix of each entry's web path.
    pub web_prefix: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            profiles: DEFAULT_PROFILE_URLS.iter().map(|s| s.to_string()).collect(),
            output: PathBuf::from("platformio.ini"),
            template: None,
            rules: None,
            fetch: FetchConfig::default(),
            build: BuildConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("grblforge/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        let pio = CommandBuilder::default();
        Self {
            firmware_dir: PathBuf::from("."),
            config_name: "platformio.ini".to_string(),
            output_dir: PathBuf::from("public/firmware"),
            program: pio.program,
            build_args: pio.build_args,
            clean_args: pio.clean_args.unwrap_or_default(),
            artifact_extensions: vec!["hex".to_string()],
            artifact_prefix: String::new(),
            timestamp_format: "%Y%m%d".to_string(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public/firmware"),
            out: PathBuf::from("public/firmware_manifest.json"),
            web_prefix: "firmware".to_string(),
        }
    }
}

impl ForgeConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ForgeError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Find and load the config. An explicit path must exist; the implicit
    /// locations are skipped when absent.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for candidate in Self::candidates() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            debug!("No config at {:?}", candidate);
        }
        debug!("Using built-in config defaults");
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("grblforge").join("config.toml"));
        }
        paths
    }

    fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(ForgeError::Config("no profile sources configured".into()));
        }
        if self.build.artifact_extensions.is_empty() {
            return Err(ForgeError::Config(
                "build.artifact_extensions must not be empty".into(),
            ));
        }
        if StrftimeItems::new(&self.build.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ForgeError::Config(format!(
                "invalid build.timestamp_format {:?}",
                self.build.timestamp_format
            )));
        }
        if !self.build.build_args.iter().any(|a| a.contains(ENV_PLACEHOLDER)) {
            return Err(ForgeError::Config(format!(
                "build.build_args must contain {}",
                ENV_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn sources(&self) -> Vec<ProfileSource> {
        self.profiles.iter().map(|s| ProfileSource::parse(s)).collect()
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch.timeout_secs > 0).then(|| Duration::from_secs(self.fetch.timeout_secs))
    }

    /// The configured rule table, or the embedded default.
    pub fn load_rules(&self) -> Result<RuleTable> {
        match &self.rules {
            Some(path) => flags::load_rules(path),
            None => Ok(flags::default_rules()),
        }
    }

    /// The configured template, or the embedded default.
    pub fn load_template(&self) -> Result<BuildTemplate> {
        match &self.template {
            Some(path) => render::load_template(path),
            None => Ok(render::default_template()),
        }
    }

    pub fn command_builder(&self) -> CommandBuilder {
        CommandBuilder {
            program: self.build.program.clone(),
            build_args: self.build.build_args.clone(),
            clean_args: (!self.build.clean_args.is_empty()).then(|| self.build.clean_args.clone()),
        }
    }

    /// Driver settings with the artifact timestamp already formatted.
    pub fn build_settings(&self, timestamp: String, clean: bool) -> BuildSettings {
        BuildSettings {
            firmware_dir: self.build.firmware_dir.clone(),
            config_name: self.build.config_name.clone(),
            output_dir: self.build.output_dir.clone(),
            artifact_extensions: self.build.artifact_extensions.clone(),
            artifact_prefix: self.build.artifact_prefix.clone(),
            timestamp,
            clean,
        }
    }
}
