//! Update check for a single image

use std::fmt;

use semver::Version;

use crate::image::ImageReference;
use crate::version::error::CheckError;
use crate::version::fetcher::TagFetcher;
use crate::version::semver::{UpdateStatus, compare_tags};

/// A newer version exists for a local image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAvailable {
    pub image: ImageReference,
    pub current: Version,
    pub latest: Version,
}

impl fmt::Display for UpdateAvailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Update available for {}: {} -> {}",
            self.image.repository(),
            self.current,
            self.latest
        )
    }
}

/// Check whether a newer version of `image` exists in its registry.
///
/// Returns `Ok(None)` when the image is up to date, including when none of the
/// remote tags is a version.
pub async fn check_image(
    fetcher: &TagFetcher,
    image: &ImageReference,
) -> Result<Option<UpdateAvailable>, CheckError> {
    let remote_tags = fetcher.fetch_tags(image).await?;

    match compare_tags(image.tag(), &remote_tags)? {
        UpdateStatus::Outdated { current, latest } => Ok(Some(UpdateAvailable {
            image: image.clone(),
            current,
            latest,
        })),
        UpdateStatus::UpToDate => Ok(None),
    }
}
