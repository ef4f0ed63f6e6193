use std::path::PathBuf;

use thiserror::Error;

/// Fatal setup errors. Any of these aborts the run before output is written.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Failed to fetch profile {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error fetching profile {url}: {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse profile {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Required file missing: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("No variants found in profile {origin}")]
    NoVariants { origin: String },

    #[error("Unknown board {board:?} for machine {machine:?}")]
    UnknownBoard { machine: String, board: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Rules error: {0}")]
    Rules(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ForgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForgeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for fatal-error-classified operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
