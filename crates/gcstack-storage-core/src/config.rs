//! Storage engine configuration.
//!
//! Provides [`StorageConfig`]. Values are loaded from environment variables
//! following the conventions client libraries use to locate a storage
//! emulator.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default per-call rewrite budget (1 MiB).
pub const DEFAULT_REWRITE_MAX_BYTES_PER_CALL: u64 = 1024 * 1024;

/// Storage engine configuration.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::config::StorageConfig;
///
/// let config = StorageConfig::default();
/// assert_eq!(config.project_id, "test-project");
/// assert_eq!(config.rewrite_max_bytes_per_call, 1_048_576);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Base URL used to build resumable upload locations.
    #[builder(default = String::from("http://localhost:9000"))]
    pub emulator_host: String,

    /// Project that owns buckets created without an explicit project.
    #[builder(default = String::from("test-project"))]
    pub project_id: String,

    /// Location for buckets created without one.
    #[builder(default = String::from("US"))]
    pub default_location: String,

    /// Upper bound (and default) for the rewrite per-call byte budget.
    #[builder(default = DEFAULT_REWRITE_MAX_BYTES_PER_CALL)]
    pub rewrite_max_bytes_per_call: u64,

    /// Age after which upload sessions and rewrite operations are purged.
    #[builder(default = 86_400)]
    pub session_ttl_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            emulator_host: String::from("http://localhost:9000"),
            project_id: String::from("test-project"),
            default_location: String::from("US"),
            rewrite_max_bytes_per_call: DEFAULT_REWRITE_MAX_BYTES_PER_CALL,
            session_ttl_secs: 86_400,
            log_level: String::from("info"),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STORAGE_EMULATOR_HOST` | `http://localhost:9000` |
    /// | `STORAGE_PROJECT_ID` | `test-project` |
    /// | `STORAGE_DEFAULT_LOCATION` | `US` |
    /// | `STORAGE_REWRITE_MAX_BYTES_PER_CALL` | `1048576` |
    /// | `STORAGE_SESSION_TTL_SECS` | `86400` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numbers keep their defaults. A host without a scheme gets
    /// `http://` prepended.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STORAGE_EMULATOR_HOST") {
            config.emulator_host = normalize_host(&v);
        }
        if let Ok(v) = std::env::var("STORAGE_PROJECT_ID") {
            config.project_id = v;
        }
        if let Ok(v) = std::env::var("STORAGE_DEFAULT_LOCATION") {
            config.default_location = v;
        }
        if let Ok(v) = std::env::var("STORAGE_REWRITE_MAX_BYTES_PER_CALL") {
            if let Ok(n) = v.parse::<u64>() {
                if n > 0 {
                    config.rewrite_max_bytes_per_call = n;
                }
            }
        }
        if let Ok(v) = std::env::var("STORAGE_SESSION_TTL_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.session_ttl_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Ensure the emulator host carries a scheme and no trailing slash.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    }
}
