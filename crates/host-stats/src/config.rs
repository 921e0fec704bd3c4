//! Stats collection configuration.
//!
//! Configuration is loaded from environment variables with defaults; every
//! field is optional, so loading never fails.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

/// Default proc filesystem root.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Default refresh cadence for the maintenance loop, in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 10;

/// Default log level name.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Stats collection configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    /// Proc filesystem root (default: "/proc"). Containers that bind-mount
    /// the host's proc elsewhere point this at the mount.
    pub proc_root: PathBuf,

    /// Refresh cadence for the maintenance loop, in seconds (default: 10).
    pub refresh_interval_seconds: u64,

    /// Log level name (default: "info"). See [`StatsConfig::log_level`] for
    /// the mapping.
    pub log_level: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl StatsConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let proc_root = vars
            .get("HOST_STATS_PROC_ROOT")
            .map_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT), PathBuf::from);

        let refresh_interval_seconds = vars
            .get("HOST_STATS_REFRESH_INTERVAL_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECONDS);

        let log_level = vars
            .get("HOST_STATS_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            proc_root,
            refresh_interval_seconds,
            log_level,
        }
    }

    /// Refresh cadence as a [`Duration`].
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Tracing level for the configured level name.
    ///
    /// Level names follow the media server's config scheme, where `info` is
    /// chattier than `trace`; unknown names land on INFO.
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self.log_level.as_str() {
            "verbose" => Level::TRACE,
            "info" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_defaults() {
        let config = StatsConfig::from_vars(&HashMap::new());
        assert_eq!(config.proc_root, PathBuf::from(DEFAULT_PROC_ROOT));
        assert_eq!(
            config.refresh_interval_seconds,
            DEFAULT_REFRESH_INTERVAL_SECONDS
        );
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config, StatsConfig::default());
    }

    #[test]
    fn test_from_vars_custom_values() {
        let vars = HashMap::from([
            (
                "HOST_STATS_PROC_ROOT".to_string(),
                "/host/proc".to_string(),
            ),
            (
                "HOST_STATS_REFRESH_INTERVAL_SECONDS".to_string(),
                "30".to_string(),
            ),
            ("HOST_STATS_LOG_LEVEL".to_string(), "warn".to_string()),
        ]);

        let config = StatsConfig::from_vars(&vars);
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.refresh_interval_seconds, 30);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.log_level(), Level::WARN);
    }

    #[test]
    fn test_unparseable_interval_falls_back_to_default() {
        let vars = HashMap::from([(
            "HOST_STATS_REFRESH_INTERVAL_SECONDS".to_string(),
            "soon".to_string(),
        )]);
        let config = StatsConfig::from_vars(&vars);
        assert_eq!(
            config.refresh_interval_seconds,
            DEFAULT_REFRESH_INTERVAL_SECONDS
        );
    }

    #[test]
    fn test_log_level_mapping() {
        let level = |name: &str| {
            StatsConfig {
                log_level: name.to_string(),
                ..StatsConfig::default()
            }
            .log_level()
        };
        assert_eq!(level("verbose"), Level::TRACE);
        assert_eq!(level("info"), Level::DEBUG);
        assert_eq!(level("trace"), Level::INFO);
        assert_eq!(level("warn"), Level::WARN);
        assert_eq!(level("error"), Level::ERROR);
        assert_eq!(level("banana"), Level::INFO);
    }
}
