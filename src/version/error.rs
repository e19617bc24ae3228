use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("GCR_ACCESS_TOKEN not set in config")]
    MissingToken,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("max retries exceeded after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: Box<RegistryError>,
    },
}

impl RegistryError {
    /// Whether another attempt could succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::UnexpectedStatus(_))
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("error getting remote tags: {0}")]
    RemoteTags(#[from] RegistryError),

    #[error("error parsing current version: {0}")]
    CurrentVersion(#[from] VersionParseError),
}

#[derive(Debug, Error)]
#[error("cannot parse current version {tag:?}: {source}")]
pub struct VersionParseError {
    pub tag: String,
    #[source]
    pub source: semver::Error,
}
