//! Registry test utilities

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};

use tagcheck::config::{AuthScheme, FETCH_TIMEOUT_MS, Settings};
use tagcheck::image::{ImageLister, ListImagesError};
use tagcheck::version::fetcher::TagFetcher;
use tagcheck::version::registries::TagsEndpointRegistry;

/// Image lister returning a fixed set of names
pub struct StaticImageLister {
    names: Vec<String>,
}

impl StaticImageLister {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl ImageLister for StaticImageLister {
    async fn list_image_names(&self) -> Result<Vec<String>, ListImagesError> {
        Ok(self.names.clone())
    }
}

/// Settings with fast pacing and backoff for tests
pub fn test_settings(token: Option<&str>) -> Settings {
    Settings {
        auth_token: token.map(str::to_string),
        auth_scheme: AuthScheme::Bearer,
        rate_limit: Duration::from_millis(1),
        max_retries: 3,
        retry_delay: Duration::from_millis(10),
        max_concurrency: 4,
    }
}

/// Fetcher talking plain HTTP to the mock server
pub fn create_test_fetcher(settings: &Settings) -> Arc<TagFetcher> {
    create_test_fetcher_with_timeout(settings, Duration::from_millis(FETCH_TIMEOUT_MS))
}

/// Fetcher talking plain HTTP with a custom per-request timeout
pub fn create_test_fetcher_with_timeout(settings: &Settings, timeout: Duration) -> Arc<TagFetcher> {
    let registry = TagsEndpointRegistry::new(settings.auth_scheme, settings.auth_token.as_deref())
        .unwrap()
        .with_scheme("http")
        .with_timeout(timeout);
    Arc::new(TagFetcher::from_settings(Arc::new(registry), settings))
}

/// Mock the tags endpoint of `repository` with the given status and body
pub async fn mock_tags(
    server: &mut ServerGuard,
    repository: &str,
    status: usize,
    body: &str,
    hits: usize,
) -> Mock {
    server
        .mock(
            "GET",
            Matcher::Regex(format!("^/repositories/{}/tags/", repository)),
        )
        .match_query(Matcher::UrlEncoded("page_size".into(), "1000".into()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}
