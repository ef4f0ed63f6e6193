use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use url::Url;

use super::reader::read_profile;
use super::types::MachineProfile;
use crate::error::{ForgeError, Result};

/// Where a profile document lives.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileSource {
    Remote(Url),
    Local(PathBuf),
}

impl ProfileSource {
    /// Classify a source string. Anything that parses as an `http`/`https`
    /// URL is remote; everything else is a local path.
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Self::Remote(url),
            _ => Self::Local(PathBuf::from(source)),
        }
    }
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches profile documents over HTTP(S) or from disk.
///
/// Plain GET, no authentication, no retry, no caching. A non-2xx response
/// or an unparsable body is fatal.
pub struct ProfileLoader {
    client: reqwest::Client,
}

impl ProfileLoader {
    /// Create a loader with the given user agent. `timeout` of `None` waits
    /// indefinitely.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ForgeError::Fetch {
            url: String::new(),
            source,
        })?;
        Ok(Self { client })
    }

    /// Load and parse one profile.
    pub async fn load(&self, source: &ProfileSource) -> Result<MachineProfile> {
        match source {
            ProfileSource::Local(path) => read_profile(path),
            ProfileSource::Remote(url) => {
                let body = self.fetch_text(url).await?;
                let profile = MachineProfile::from_json(url.as_str(), &body)?;
                info!(
                    "Loaded profile {:?} ({} variants) from {}",
                    profile.display_name(),
                    profile.variant_count(),
                    url
                );
                Ok(profile)
            }
        }
    }

    /// Load every source in order. The first failure aborts the whole set.
    pub async fn load_all(&self, sources: &[ProfileSource]) -> Result<Vec<MachineProfile>> {
        let mut profiles = Vec::with_capacity(sources.len());
        for source in sources {
            profiles.push(self.load(source).await?);
        }
        Ok(profiles)
    }

    async fn fetch_text(&self, url: &Url) -> Result<String> {
        info!("Downloading profile: {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ForgeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForgeError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| ForgeError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}
