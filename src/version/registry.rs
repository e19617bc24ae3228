//! Registry trait for fetching image tags from remote sources

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Trait for fetching the tags of a repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Checks that the registry can authenticate without sending a request
    fn check_credentials(&self) -> Result<(), RegistryError> {
        Ok(())
    }

    /// Fetches all tags of a repository in a single attempt
    ///
    /// # Arguments
    /// * `registry` - The registry host (e.g., "gcr.io")
    /// * `repository` - The repository path within the registry (e.g., "my-project/app")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Tags in the order the registry returned them
    /// * `Err(RegistryError)` - If the request fails; retrying is the caller's concern
    async fn fetch_tags(
        &self,
        registry: &str,
        repository: &str,
    ) -> Result<Vec<String>, RegistryError>;
}
