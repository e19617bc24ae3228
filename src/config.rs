use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single fetch attempt in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Default spacing between registry requests in milliseconds
pub const DEFAULT_RATE_LIMIT_MS: u64 = 100;

/// Default delay before the first retry in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Longest accepted `rate_limit` or `retry_delay` (24 hours)
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

// =============================================================================
// Other defaults
// =============================================================================

/// Default number of attempts per fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default cap on checks running at the same time
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Keys that may be overridden through upper-cased environment variables
pub const ENV_KEYS: &[&str] = &[
    "gcr_access_token",
    "rate_limit",
    "max_retries",
    "retry_delay",
    "max_concurrency",
    "auth_scheme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("error reading config: {0}")]
    Load(#[from] config::ConfigError),
}

/// How a registry expects requests to be authenticated
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Bearer <gcr_access_token>`; the token is mandatory
    #[default]
    Bearer,
    /// No authorization header
    Anonymous,
}

/// Raw configuration as found in the file and environment
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub gcr_access_token: Option<String>,
    pub rate_limit: Option<DurationValue>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<DurationValue>,
    pub max_concurrency: Option<usize>,
    pub auth_scheme: Option<AuthScheme>,
}

/// Resolved, immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub auth_token: Option<String>,
    pub auth_scheme: AuthScheme,
    pub rate_limit: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        FileConfig::default().into_settings()
    }
}

impl FileConfig {
    /// Apply defaults. Zero counts as unset for every numeric field.
    pub fn into_settings(self) -> Settings {
        Settings {
            auth_token: self
                .gcr_access_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            auth_scheme: self.auth_scheme.unwrap_or_default(),
            rate_limit: non_zero_duration(self.rate_limit, DEFAULT_RATE_LIMIT_MS),
            max_retries: self
                .max_retries
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: non_zero_duration(self.retry_delay, DEFAULT_RETRY_DELAY_MS),
            max_concurrency: self
                .max_concurrency
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENCY),
        }
    }
}

fn non_zero_duration(value: Option<DurationValue>, default_ms: u64) -> Duration {
    value
        .map(|v| v.0)
        .filter(|d| !d.is_zero())
        .unwrap_or(Duration::from_millis(default_ms))
}

impl Settings {
    /// Load settings from an optional YAML file merged with the process environment.
    ///
    /// An explicit `path` must exist. Without one, `./config.yaml` is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, env_overrides())
    }

    /// Same as [`Settings::load`] with an explicit set of environment variables
    pub fn load_with_env(
        path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                debug!("Loading config from {:?}", p);
                File::from(p).format(FileFormat::Yaml).required(true)
            }
            None => File::new(DEFAULT_CONFIG_NAME, FileFormat::Yaml).required(false),
        };

        let env: config::Map<String, String> = env.into_iter().collect();
        let raw: FileConfig = ConfigRs::builder()
            .add_source(file)
            .add_source(Environment::default().source(Some(env)).ignore_empty(true))
            .build()?
            .try_deserialize()?;

        Ok(raw.into_settings())
    }
}

/// Collect the environment variables that override config keys
pub fn env_overrides() -> HashMap<String, String> {
    env_overrides_with(|name| std::env::var(name).ok())
}

fn env_overrides_with(lookup: impl Fn(&str) -> Option<String>) -> HashMap<String, String> {
    ENV_KEYS
        .iter()
        .filter_map(|key| {
            let name = key.to_uppercase();
            lookup(&name).map(|value| (name, value))
        })
        .collect()
}

/// A duration written as `"100ms"`, `"1s"`, `"2m"`, `"1h"` or a bare number of milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationValue(pub Duration);

/// Parse a duration with an optional unit suffix; no suffix means milliseconds
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {:?}", input))?;

    let duration = match unit.trim() {
        "" | "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(60 * 60).map(Duration::from_secs),
        other => return Err(format!("invalid duration unit {:?} in {:?}", other, input)),
    };

    duration
        .filter(|d| d.as_secs() <= MAX_DURATION_SECS)
        .ok_or_else(|| format!("duration {:?} out of range", input))
}

fn bounded_millis(ms: u64) -> Result<Duration, String> {
    Some(Duration::from_millis(ms))
        .filter(|d| d.as_secs() <= MAX_DURATION_SECS)
        .ok_or_else(|| format!("duration {}ms out of range", ms))
}

impl<'de> Deserialize<'de> for DurationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = DurationValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a duration such as \"100ms\" or a number of milliseconds")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                bounded_millis(v).map(DurationValue).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                let ms = u64::try_from(v)
                    .map_err(|_| E::custom(format!("negative duration {}", v)))?;
                self.visit_u64(ms)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                parse_duration(v).map(DurationValue).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}
