//! Configuration APIs for evicache
//!
//! Configuration types implement the [`Config`] trait, which provides
//! validation, environment initialization, presets and JSON persistence.
//!
//! # Environment Initialization
//!
//! ```rust
//! use evicache::config::{Config, LruCacheConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads EVICACHE_CACHE_CAPACITY, EVICACHE_NOTIFIER_BACKLOG, ...
//! let config = LruCacheConfig::from_env()?;
//!
//! // Or with a custom prefix
//! let config = LruCacheConfig::from_env_with_prefix("MYAPP_")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Presets
//!
//! ```rust
//! use evicache::config::{Config, LruCacheConfig};
//!
//! let fast = LruCacheConfig::performance_preset();
//! let small = LruCacheConfig::memory_preset();
//! let bounded = LruCacheConfig::realtime_preset();
//! ```

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;

pub mod cache;

pub use cache::LruCacheConfig;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "EVICACHE_";

/// Common configuration trait providing validation, environment initialization,
/// and preset management functionality.
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables.
    ///
    /// Variables use the format `EVICACHE_{COMPONENT}_{FIELD}`, for example
    /// `EVICACHE_CACHE_CAPACITY=4096`.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize configuration from environment variables with a custom prefix.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset optimized for throughput, trading memory for fewer reallocations.
    fn performance_preset() -> Self;

    /// Preset optimized for a small memory footprint.
    fn memory_preset() -> Self;

    /// Preset optimized for predictable insertion latency.
    fn realtime_preset() -> Self;

    /// Balanced preset; the default configuration.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load and validate configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or malformed.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr + Clone,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive) as true,
/// everything else as false.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}
