//! Enumeration of locally present images

#[cfg(test)]
use mockall::automock;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::image::reference::ImageReference;

#[derive(Debug, Error)]
pub enum ListImagesError {
    #[error("error executing docker command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("docker command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Source of local `repository:tag` names
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ImageLister: Send + Sync {
    /// Returns one raw `repository:tag` line per local image
    async fn list_image_names(&self) -> Result<Vec<String>, ListImagesError>;
}

/// Lists images through the docker CLI
pub struct DockerImageLister {
    program: String,
}

impl DockerImageLister {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for DockerImageLister {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait::async_trait]
impl ImageLister for DockerImageLister {
    async fn list_image_names(&self) -> Result<Vec<String>, ListImagesError> {
        let output = Command::new(&self.program)
            .args(["image", "ls", "--format", "{{.Repository}}:{{.Tag}}"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(ListImagesError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Parse raw image names, logging and skipping the ones that are not references
pub fn parse_image_names(names: &[String]) -> Vec<ImageReference> {
    names
        .iter()
        .filter_map(|name| match name.parse::<ImageReference>() {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Error parsing image name {}: {}", name, e);
                None
            }
        })
        .collect()
}

/// List local images and parse them into references
pub async fn local_images(lister: &dyn ImageLister) -> Result<Vec<ImageReference>, ListImagesError> {
    let names = lister.list_image_names().await?;
    let images = parse_image_names(&names);
    debug!(
        "Found {} local images ({} skipped)",
        images.len(),
        names.len() - images.len()
    );
    Ok(images)
}
