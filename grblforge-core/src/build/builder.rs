use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

/// Placeholder replaced by the environment identifier in command arguments.
pub const ENV_PLACEHOLDER: &str = "{env}";

/// Outcome of one external build invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

/// Runs the external firmware build for one environment.
///
/// An `Err` means the build could not be started at all; a finished build
/// that failed is an `Ok` with `success == false`.
pub trait Builder {
    /// Remove previous build output. Default is a no-op.
    fn clean(&self, _env: &str, _work_dir: &Path) -> Result<()> {
        Ok(())
    }

    fn build(&self, env: &str, work_dir: &Path) -> Result<BuildOutput>;
}

/// [`Builder`] that spawns an external command, `pio` by default.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    pub program: String,
    pub build_args: Vec<String>,
    /// `None` disables the clean step.
    pub clean_args: Option<Vec<String>>,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            program: "pio".to_string(),
            build_args: vec!["run".into(), "-e".into(), ENV_PLACEHOLDER.into()],
            clean_args: Some(vec![
                "run".into(),
                "-t".into(),
                "clean".into(),
                "-e".into(),
                ENV_PLACEHOLDER.into(),
            ]),
        }
    }
}

impl CommandBuilder {
    fn command(&self, args: &[String], env: &str, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(expand_args(args, env)).current_dir(work_dir);
        cmd
    }
}

impl Builder for CommandBuilder {
    fn clean(&self, env: &str, work_dir: &Path) -> Result<()> {
        let Some(args) = &self.clean_args else {
            return Ok(());
        };
        debug!("Cleaning {} in {:?}", env, work_dir);
        let output = self
            .command(args, env, work_dir)
            .output()
            .with_context(|| format!("Failed to run {} clean for {}", self.program, env))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} clean for {} exited with {}",
                self.program,
                env,
                output.status
            );
        }
        Ok(())
    }

    fn build(&self, env: &str, work_dir: &Path) -> Result<BuildOutput> {
        debug!("Running {} {:?} in {:?}", self.program, self.build_args, work_dir);
        let output = self
            .command(&self.build_args, env, work_dir)
            .output()
            .with_context(|| format!("Failed to start {} for {}", self.program, env))?;

        Ok(BuildOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Substitute the environment identifier into each argument.
pub fn expand_args(args: &[String], env: &str) -> Vec<String> {
    args.iter()
        .map(|arg| arg.replace(ENV_PLACEHOLDER, env))
        .collect()
}
