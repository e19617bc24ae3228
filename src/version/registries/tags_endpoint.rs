//! Docker-Hub-style tags listing endpoint
//!
//! `GET {registry}/repositories/{repository}/tags/?page_size=1000` returning
//! `{"tags": [...]}`. The same path is used for every registry.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{AuthScheme, FETCH_TIMEOUT_MS};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Scheme used when the registry has none
const DEFAULT_SCHEME: &str = "https";

/// Page size requested from the tags endpoint
const PAGE_SIZE: u32 = 1000;

/// Response from the tags endpoint
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Vec<String>,
}

/// Registry implementation for the tags listing endpoint
pub struct TagsEndpointRegistry {
    client: reqwest::Client,
    scheme: String,
    auth_scheme: AuthScheme,
    token: Option<String>,
    timeout: Duration,
}

impl TagsEndpointRegistry {
    /// Creates a registry client; every request is bounded by [`FETCH_TIMEOUT_MS`]
    pub fn new(auth_scheme: AuthScheme, token: Option<&str>) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().user_agent("tagcheck").build()?;

        Ok(Self {
            client,
            scheme: DEFAULT_SCHEME.to_string(),
            auth_scheme,
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
        })
    }

    /// Bound each request by `timeout` instead of [`FETCH_TIMEOUT_MS`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use another URL scheme for registries given without one
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    fn tags_url(&self, registry: &str, repository: &str) -> String {
        let base = if registry.contains("://") {
            registry.trim_end_matches('/').to_string()
        } else {
            format!("{}://{}", self.scheme, registry)
        };
        format!(
            "{}/repositories/{}/tags/?page_size={}",
            base, repository, PAGE_SIZE
        )
    }
}

#[async_trait::async_trait]
impl Registry for TagsEndpointRegistry {
    fn check_credentials(&self) -> Result<(), RegistryError> {
        match (self.auth_scheme, self.token.as_deref()) {
            (AuthScheme::Bearer, None) => Err(RegistryError::MissingToken),
            _ => Ok(()),
        }
    }

    async fn fetch_tags(
        &self,
        registry: &str,
        repository: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let url = self.tags_url(registry, repository);

        let mut request = self.client.get(&url).timeout(self.timeout);
        if self.auth_scheme == AuthScheme::Bearer {
            let token = self.token.as_deref().ok_or(RegistryError::MissingToken)?;
            request = request.bearer_auth(token);
        }

        debug!("GET {}", url);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Registry returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus(status));
        }

        let bytes = response.bytes().await?;
        let body: TagsResponse = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Failed to parse tags response from {}: {}", url, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(body.tags)
    }
}
