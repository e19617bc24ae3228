//! Concurrent update checks over all local images

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::image::ImageReference;
use crate::version::checker::{UpdateAvailable, check_image};
use crate::version::error::CheckError;
use crate::version::fetcher::TagFetcher;

/// Aggregated outcome of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    /// Outdated images, in the order their checks completed
    pub updates: Vec<UpdateAvailable>,
    pub up_to_date: usize,
    pub failures: usize,
}

/// A closed semaphore is logged and the check runs unthrottled
async fn acquire_permit(
    permits: Arc<Semaphore>,
    image: &ImageReference,
) -> Option<OwnedSemaphorePermit> {
    match permits.acquire_owned().await {
        Ok(permit) => Some(permit),
        Err(e) => {
            error!("Concurrency limiter unavailable, checking {} without a permit: {}", image, e);
            None
        }
    }
}

/// Check every image concurrently.
///
/// Spawns one task per image; at most `max_concurrency` of them run at once.
/// Every network request still waits on the fetcher's shared rate limiter.
/// A failing check is logged and counted without affecting the others.
pub async fn check_all(
    fetcher: Arc<TagFetcher>,
    images: Vec<ImageReference>,
    max_concurrency: usize,
) -> CheckSummary {
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    info!("Checking {} images for updates", images.len());
    for image in images {
        let fetcher = Arc::clone(&fetcher);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = acquire_permit(permits, &image).await;
            let result = check_image(&fetcher, &image).await;
            (image, result)
        });
    }

    let mut summary = CheckSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((image, result)) => summary.record(&image, result),
            Err(e) => {
                error!("Update check task failed: {}", e);
                summary.failures += 1;
            }
        }
    }

    info!(
        "Checked images: {} outdated, {} up to date, {} failed",
        summary.updates.len(),
        summary.up_to_date,
        summary.failures
    );
    summary
}

impl CheckSummary {
    fn record(&mut self, image: &ImageReference, result: Result<Option<UpdateAvailable>, CheckError>) {
        match result {
            Ok(Some(update)) => {
                debug!("{} is outdated", image);
                self.updates.push(update);
            }
            Ok(None) => {
                debug!("{} is up to date", image);
                self.up_to_date += 1;
            }
            Err(e) => {
                error!("Error checking for updates for {}: {}", image, e);
                self.failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::error::RegistryError;
    use crate::version::rate_limit::RateLimiter;
    use crate::version::registry::Registry;
    use crate::version::retry::RetryPolicy;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Registry serving fixed tags per repository; unknown repositories fail
    #[derive(Default)]
    struct FixtureRegistry {
        tags: HashMap<String, Vec<String>>,
        delays: HashMap<String, Duration>,
        requests: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FixtureRegistry {
        fn with_tags(mut self, repository: &str, tags: &[&str]) -> Self {
            self.tags.insert(
                repository.to_string(),
                tags.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        fn with_delay(mut self, repository: &str, delay: Duration) -> Self {
            self.delays.insert(repository.to_string(), delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl Registry for FixtureRegistry {
        async fn fetch_tags(&self, _: &str, repository: &str) -> Result<Vec<String>, RegistryError> {
            self.requests.lock().unwrap().push(repository.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(repository) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.tags
                .get(repository)
                .cloned()
                .ok_or(RegistryError::UnexpectedStatus(StatusCode::NOT_FOUND))
        }
    }

    fn fetcher_for(registry: Arc<FixtureRegistry>) -> Arc<TagFetcher> {
        Arc::new(TagFetcher::new(
            registry,
            Arc::new(RateLimiter::new(Duration::ZERO)),
            RetryPolicy::new(2, Duration::from_millis(1)),
        ))
    }

    fn image(s: &str) -> ImageReference {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn check_all_collects_only_updates_and_counts_failures() {
        let registry = Arc::new(
            FixtureRegistry::default()
                .with_tags("proj/outdated", &["1.0.0", "1.2.0", "nightly"])
                .with_tags("proj/current", &["2.0.0"])
                .with_tags("proj/unversioned", &["latest"]),
        );
        let images = vec![
            image("gcr.io/proj/outdated:1.0.0"),
            image("gcr.io/proj/current:2.0.0"),
            image("gcr.io/proj/current:latest"),
            image("gcr.io/proj/unversioned:1.0.0"),
            image("gcr.io/proj/missing:1.0.0"),
        ];

        let summary = check_all(fetcher_for(registry), images, 4).await;

        assert_eq!(
            summary
                .updates
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["Update available for proj/outdated: 1.0.0 -> 1.2.0"]
        );
        assert_eq!(summary.up_to_date, 2);
        assert_eq!(summary.failures, 2);
    }

    #[tokio::test]
    async fn check_all_fetches_shared_repository_once() {
        let registry = Arc::new(FixtureRegistry::default().with_tags("proj/app", &["1.0.0", "3.0.0"]));
        let images = vec![
            image("gcr.io/proj/app:1.0.0"),
            image("gcr.io/proj/app:2.0.0"),
            image("gcr.io/proj/app:3.0.0"),
        ];

        let summary = check_all(fetcher_for(Arc::clone(&registry)), images, 8).await;

        assert_eq!(summary.updates.len(), 2);
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(*registry.requests.lock().unwrap(), vec!["proj/app"]);
    }

    #[tokio::test]
    async fn check_all_reports_results_in_completion_order() {
        let registry = Arc::new(
            FixtureRegistry::default()
                .with_tags("proj/slow", &["2.0.0"])
                .with_delay("proj/slow", Duration::from_millis(200))
                .with_tags("proj/fast", &["2.0.0"]),
        );
        let images = vec![image("gcr.io/proj/slow:1.0.0"), image("gcr.io/proj/fast:1.0.0")];

        let summary = check_all(fetcher_for(registry), images, 2).await;

        let repositories: Vec<_> = summary
            .updates
            .iter()
            .map(|u| u.image.repository().to_string())
            .collect();
        assert_eq!(repositories, vec!["proj/fast", "proj/slow"]);
    }

    #[tokio::test]
    async fn check_all_caps_concurrent_checks() {
        let mut fixture = FixtureRegistry::default();
        for i in 0..12 {
            let repository = format!("proj/app-{}", i);
            fixture = fixture
                .with_tags(&repository, &["1.0.0"])
                .with_delay(&repository, Duration::from_millis(20));
        }
        let registry = Arc::new(fixture);
        let images = (0..12)
            .map(|i| image(&format!("gcr.io/proj/app-{}:1.0.0", i)))
            .collect();

        let summary = check_all(fetcher_for(Arc::clone(&registry)), images, 3).await;

        assert_eq!(summary.up_to_date, 12);
        assert!(registry.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn check_all_handles_empty_image_list() {
        let registry = Arc::new(FixtureRegistry::default());

        let summary = check_all(fetcher_for(Arc::clone(&registry)), Vec::new(), 4).await;

        assert_eq!(summary, CheckSummary::default());
        assert!(registry.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn acquire_permit_degrades_to_no_permit_when_closed() {
        let image = ImageReference::new("gcr.io", "proj/app", "1.0.0");
        let open = Arc::new(Semaphore::new(1));
        let closed = Arc::new(Semaphore::new(1));
        closed.close();

        assert!(acquire_permit(Arc::clone(&open), &image).await.is_some());
        assert_eq!(open.available_permits(), 1);
        assert!(acquire_permit(closed, &image).await.is_none());
    }
}
