//! Local container images
//!
//! - [`reference`]: `ImageReference` parsing
//! - [`lister`]: enumeration of local images through the docker CLI

pub mod lister;
pub mod reference;

pub use lister::{DockerImageLister, ImageLister, ListImagesError, local_images};
pub use reference::{ImageParseError, ImageReference};
