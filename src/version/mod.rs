//! Version management layer for image update checking
//!
//! This module provides the core functionality for fetching, caching, and comparing
//! image tags from container registries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Fetcher   │────▶│    Cache    │◀────│   Checker   │
//! │(retry,pace) │     │ (per run)   │     │  (compare)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │  Registries │                         │   Semver    │
//! │ (tags API)  │                         │(version cmp)│
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Run-scoped tag cache with per-key single flight
//! - [`checker`]: Update decision for one image
//! - [`fetcher`]: Cache-checked, rate-limited, retried tag fetching
//! - [`rate_limit`]: Global request pacing
//! - [`registry`]: Registry trait for fetching tags from remote sources
//! - [`registries`]: Concrete registry implementations
//! - [`retry`]: Exponential backoff policy
//! - [`error`]: Error types for registry and check operations
//! - [`semver`]: Tag parsing and version ordering

pub mod cache;
pub mod checker;
pub mod error;
pub mod fetcher;
pub mod rate_limit;
pub mod registries;
pub mod registry;
pub mod retry;
pub mod semver;
