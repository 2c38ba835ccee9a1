//! Core configuration struct definitions.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Replay server configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Routing behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Stock filter toggles and orders.
    #[serde(default)]
    pub filters: FiltersConfig,
    /// Log output.
    #[serde(default)]
    pub log: LogConfig,
    /// Prometheus metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfig {
    /// Match command names regardless of ASCII case (default: false).
    #[serde(default)]
    pub case_insensitive_keys: bool,
}

/// One stock filter: whether it is attached and at which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterToggle {
    pub enabled: bool,
    pub order: i32,
}

/// A `[filters.*]` table as written; missing keys fall back per filter.
#[derive(Debug, Deserialize)]
struct RawToggle {
    #[serde(default = "default_true")]
    enabled: bool,
    order: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawFilters {
    logging: Option<RawToggle>,
    metrics: Option<RawToggle>,
    registration: Option<RawToggle>,
}

fn resolve(raw: Option<RawToggle>, default: FilterToggle) -> FilterToggle {
    match raw {
        Some(raw) => FilterToggle {
            enabled: raw.enabled,
            order: raw.order.unwrap_or(default.order),
        },
        None => default,
    }
}

/// Stock filter configuration.
///
/// `logging` and `metrics` are attached to every command; `registration`
/// only guards commands that need a registered session.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawFilters")]
pub struct FiltersConfig {
    pub logging: FilterToggle,
    pub metrics: FilterToggle,
    pub registration: FilterToggle,
}

impl From<RawFilters> for FiltersConfig {
    fn from(raw: RawFilters) -> Self {
        Self {
            logging: resolve(raw.logging, default_logging_filter()),
            metrics: resolve(raw.metrics, default_metrics_filter()),
            registration: resolve(raw.registration, default_registration_filter()),
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            logging: default_logging_filter(),
            metrics: default_metrics_filter(),
            registration: default_registration_filter(),
        }
    }
}

impl FiltersConfig {
    /// Enabled stock filters with their orders, by config name.
    pub fn enabled(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        [
            ("logging", &self.logging),
            ("metrics", &self.metrics),
            ("registration", &self.registration),
        ]
        .into_iter()
        .filter(|(_, toggle)| toggle.enabled)
        .map(|(name, toggle)| (name, toggle.order))
    }
}

fn default_logging_filter() -> FilterToggle {
    FilterToggle {
        enabled: true,
        order: 100,
    }
}

fn default_metrics_filter() -> FilterToggle {
    FilterToggle {
        enabled: true,
        order: -100,
    }
}

fn default_registration_filter() -> FilterToggle {
    FilterToggle {
        enabled: true,
        order: 0,
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
///
/// `RUST_LOG`, when set, overrides `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default level directive (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Write the Prometheus text exposition to stderr on exit (default: false).
    #[serde(default)]
    pub dump_on_exit: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.dispatch.case_insensitive_keys);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Plain);
        assert!(!config.metrics.dump_on_exit);
        assert_eq!(
            config.filters.enabled().collect::<Vec<_>>(),
            vec![("logging", 100), ("metrics", -100), ("registration", 0)]
        );
    }

    #[test]
    fn partial_filter_section_keeps_other_defaults() {
        let toml = r#"
[filters.metrics]
enabled = false
order = 7

[filters.registration]
order = -5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.filters.enabled().collect::<Vec<_>>(),
            vec![("logging", 100), ("registration", -5)]
        );
    }

    #[test]
    fn toggle_without_order_keeps_default_order() {
        let toml = r#"
[filters.metrics]
enabled = false

[filters.logging]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.filters.metrics,
            FilterToggle {
                enabled: false,
                order: -100
            }
        );
        assert_eq!(
            config.filters.logging,
            FilterToggle {
                enabled: true,
                order: 100
            }
        );
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[dispatch]
case_insensitive_keys = true

[log]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.dispatch.case_insensitive_keys);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nformat = \"xml\"").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
