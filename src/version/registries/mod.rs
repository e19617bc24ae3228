//! Registry implementations for fetching image tags

pub mod tags_endpoint;

pub use tags_endpoint::TagsEndpointRegistry;
