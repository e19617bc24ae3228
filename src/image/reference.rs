//! `registry/repository:tag` image references

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageParseError {
    #[error("invalid image name format: {0:?}")]
    MissingRegistry(String),
    #[error("invalid tag format: {0:?}")]
    InvalidTag(String),
}

/// A locally present image, split into registry, repository and tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    registry: String,
    repository: String,
    tag: String,
}

impl ImageReference {
    pub fn new(
        registry: impl Into<String>,
        repository: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Key shared by every tag of the same repository
    pub fn cache_key(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }
}

impl FromStr for ImageReference {
    type Err = ImageParseError;

    /// The registry is the first path segment, the tag follows the last ':'
    /// of the final segment, and everything in between is the repository.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (registry, rest) = s
            .split_once('/')
            .filter(|(registry, rest)| !registry.is_empty() && !rest.is_empty())
            .ok_or_else(|| ImageParseError::MissingRegistry(s.to_string()))?;

        let (repository, tag) = rest
            .rsplit_once(':')
            .filter(|(repository, tag)| {
                !tag.is_empty()
                    && !tag.contains('/')
                    && !repository.is_empty()
                    && !repository.ends_with('/')
            })
            .ok_or_else(|| ImageParseError::InvalidTag(s.to_string()))?;

        Ok(Self::new(registry, repository, tag))
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}
