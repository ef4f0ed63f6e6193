use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use grblforge_core::build::BuildDriver;
use grblforge_core::flags::RuleTable;
use grblforge_core::profile::{MachineProfile, ProfileLoader};
use grblforge_core::publish::{render_download_page, write_build_report, write_manifest};
use grblforge_core::render::{write_atomic, BuildTemplate};
use grblforge_core::{generate_document, plan_all, ForgeConfig};

/// Header date stamp, `grblhal_driver_version` in the rendered config.
const BUILD_DATE_FORMAT: &str = "%Y%m%d";

/// Command-line settings layered over the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub profiles: Vec<String>,
    pub no_rename: bool,
    pub no_letter_codepoints: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Number of variants whose build failed.
    BuildFailures(usize),
}

impl Outcome {
    pub fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            Outcome::Success
        } else {
            Outcome::BuildFailures(failed)
        }
    }

    /// Process exit status: 0 only when every variant built.
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::BuildFailures(_) => 1,
        }
    }
}

/// Config, rules and template with the overrides applied.
struct Setup {
    config: ForgeConfig,
    rules: RuleTable,
    template: BuildTemplate,
}

fn setup(overrides: &Overrides) -> Result<Setup> {
    let mut config = ForgeConfig::discover(overrides.config.as_deref())?;
    if !overrides.profiles.is_empty() {
        config.profiles = overrides.profiles.clone();
    }
    if overrides.template.is_some() {
        config.template = overrides.template.clone();
    }
    if overrides.rules.is_some() {
        config.rules = overrides.rules.clone();
    }

    let mut rules = config.load_rules()?;
    if overrides.no_rename {
        rules.renames.enabled = false;
    }
    if overrides.no_letter_codepoints {
        rules.letter_codepoints.enabled = false;
    }
    info!(
        "Rules v{}: renames {}, letter code points {}",
        rules.version,
        on_off(rules.renames.enabled),
        on_off(rules.letter_codepoints.enabled)
    );

    let template = config.load_template()?;
    Ok(Setup {
        config,
        rules,
        template,
    })
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

async fn load_profiles(config: &ForgeConfig) -> Result<Vec<MachineProfile>> {
    let loader = ProfileLoader::new(&config.fetch.user_agent, config.fetch_timeout())?;
    let profiles = loader.load_all(&config.sources()).await?;
    Ok(profiles)
}

fn build_date() -> String {
    Local::now().format(BUILD_DATE_FORMAT).to_string()
}

/// Fetch, merge and render every profile into one `platformio.ini`.
pub async fn generate(overrides: &Overrides, output: Option<PathBuf>) -> Result<Outcome> {
    let setup = setup(overrides)?;
    let profiles = load_profiles(&setup.config).await?;
    let builds = plan_all(&profiles, &setup.template, &setup.rules)?;

    let document = generate_document(&builds, &setup.template, &build_date())?;
    let output = output.unwrap_or_else(|| setup.config.output.clone());
    write_atomic(&output, &document)?;

    let count: usize = builds.iter().map(|b| b.environments.len()).sum();
    info!(
        "Successfully generated {:?} with {} environments.",
        output, count
    );
    Ok(Outcome::Success)
}

/// Build every variant, publish artifacts and write the download page.
pub async fn build(overrides: &Overrides, skip_clean: bool) -> Result<Outcome> {
    let setup = setup(overrides)?;
    let profiles = load_profiles(&setup.config).await?;
    let builds = plan_all(&profiles, &setup.template, &setup.rules)?;

    let date = build_date();
    let timestamp = Local::now()
        .format(&setup.config.build.timestamp_format)
        .to_string();
    let settings = setup.config.build_settings(timestamp, !skip_clean);
    let driver = BuildDriver::new(setup.config.command_builder(), settings);

    let report = driver.run(&builds, &setup.template, &date)?;

    let output_dir = &driver.settings().output_dir;
    write_atomic(&output_dir.join("index.html"), &render_download_page(&report, &date))
        .context("Failed to write download page")?;
    write_build_report(&report, &output_dir.join("build_report.json"))
        .context("Failed to write build report")?;

    if report.artifacts_missing() > 0 {
        warn!(
            "{} successful build(s) produced no artifact",
            report.artifacts_missing()
        );
    }

    info!("--- All Builds Complete ---");
    Ok(Outcome::from_failures(report.failed()))
}

/// Write the artifact manifest for the published firmware directory.
pub fn manifest(
    overrides: &Overrides,
    dir: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<Outcome> {
    let config = ForgeConfig::discover(overrides.config.as_deref())?;
    let dir = dir.unwrap_or_else(|| config.manifest.dir.clone());
    let out = out.unwrap_or_else(|| config.manifest.out.clone());

    write_manifest(&dir, &config.manifest.web_prefix, &out)
        .with_context(|| format!("Failed to write manifest for {:?}", dir))?;
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failures_exit_non_zero() {
        assert_eq!(Outcome::from_failures(0), Outcome::Success);
        assert_eq!(Outcome::from_failures(1), Outcome::BuildFailures(1));
        assert_eq!(Outcome::Success.exit_status(), 0);
        assert_eq!(Outcome::from_failures(1).exit_status(), 1);
        assert_eq!(Outcome::BuildFailures(3).exit_status(), 1);
    }
}
