mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::{Outcome, Overrides};

#[derive(Parser)]
#[command(name = "grblforge")]
#[command(about = "Render PlatformIO configs and firmware builds from grblHAL machine profiles")]
#[command(version)]
struct Cli {
    /// Config file (default: ./grblforge.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PlatformIO template asset overriding the embedded one
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Symbol rule table overriding the embedded one
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Profile URL or local path; repeat for several. Replaces configured sources.
    #[arg(long = "profile", value_name = "SOURCE", global = true)]
    profiles: Vec<String>,

    /// Disable symbol renames (e.g. SIENCI_ATCI -> ATCI_ENABLE)
    #[arg(long, global = true)]
    no_rename: bool,

    /// Disable *_LETTER code point conversion
    #[arg(long, global = true)]
    no_letter_codepoints: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch profiles and write platformio.ini (default)
    Generate {
        /// Output path for the generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build every variant and publish the artifacts
    Build {
        /// Skip the clean step before each build
        #[arg(long)]
        skip_clean: bool,
    },
    /// Write the artifact manifest
    Manifest {
        /// Directory holding the firmware images
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Manifest file to write
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let overrides = Overrides {
        config: cli.config,
        template: cli.template,
        rules: cli.rules,
        profiles: cli.profiles,
        no_rename: cli.no_rename,
        no_letter_codepoints: cli.no_letter_codepoints,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Command::Generate { output: None });
    let result = runtime.block_on(async {
        match command {
            Command::Generate { output } => commands::generate(&overrides, output).await,
            Command::Build { skip_clean } => commands::build(&overrides, skip_clean).await,
            Command::Manifest { dir, out } => commands::manifest(&overrides, dir, out),
        }
    });

    ExitCode::from(exit_status(&result))
}

fn exit_status(result: &anyhow::Result<Outcome>) -> u8 {
    match result {
        Ok(outcome) => {
            if let Outcome::BuildFailures(n) = outcome {
                error!("Error: {} build(s) failed.", n);
            }
            outcome.exit_status()
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}
