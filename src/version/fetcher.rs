//! Cached, paced and retried tag fetching

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Settings;
use crate::image::ImageReference;
use crate::version::cache::TagCache;
use crate::version::error::RegistryError;
use crate::version::rate_limit::RateLimiter;
use crate::version::registry::Registry;
use crate::version::retry::RetryPolicy;

/// Fetches remote tags for images, sharing one cache and one rate limiter
/// across every caller.
pub struct TagFetcher {
    registry: Arc<dyn Registry>,
    cache: TagCache,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl TagFetcher {
    pub fn new(registry: Arc<dyn Registry>, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            registry,
            cache: TagCache::new(),
            limiter,
            retry,
        }
    }

    pub fn from_settings(registry: Arc<dyn Registry>, settings: &Settings) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.rate_limit));
        debug!(
            "Pacing requests every {:?}, up to {} attempts",
            limiter.interval(),
            settings.max_retries
        );
        Self::new(
            registry,
            limiter,
            RetryPolicy::new(settings.max_retries, settings.retry_delay),
        )
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    /// Remote tags for the image's repository.
    ///
    /// Cache hits return without touching the rate limiter or the network.
    pub async fn fetch_tags(&self, image: &ImageReference) -> Result<Vec<String>, RegistryError> {
        let key = image.cache_key();
        self.cache
            .get_or_try_fetch(&key, || {
                self.fetch_remote(image.registry(), image.repository())
            })
            .await
    }

    async fn fetch_remote(
        &self,
        registry: &str,
        repository: &str,
    ) -> Result<Vec<String>, RegistryError> {
        self.registry.check_credentials()?;

        let tags = self
            .retry
            .run(|attempt| async move {
                self.limiter.acquire().await;
                debug!(
                    "Fetching tags for {}/{} (attempt {})",
                    registry, repository, attempt
                );
                self.registry.fetch_tags(registry, repository).await
            })
            .await?;

        info!("Fetched {} tags for {}/{}", tags.len(), registry, repository);
        Ok(tags)
    }
}
