//! Configuration schema definitions.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lifeline_protocols::Format;
pub use lifeline_protocols::ProcessConfig;

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub process: ProcessConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Render as TOML, e.g. for `lifeline init`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Runtime identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSection {
    #[serde(default = "default_name")]
    pub name: String,

    /// Adds the `telemetry` and `monitor` sub-channels.
    #[serde(default)]
    pub metrics: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            metrics: false,
        }
    }
}

fn default_name() -> String {
    "lifeline".to_string()
}

/// Buffer sizes for the default sub-channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "default_small")]
    pub small: usize,

    #[serde(default = "default_medium")]
    pub medium: usize,

    #[serde(default = "default_large")]
    pub large: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
        }
    }
}

fn default_small() -> usize {
    2
}

fn default_medium() -> usize {
    5
}

fn default_large() -> usize {
    10
}

/// Lifecycle persistence and shutdown targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Where the process configuration is persisted, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_path: Option<PathBuf>,

    #[serde(default = "default_persist_format")]
    pub persist_format: String,

    /// Stage removed on stop/shutdown. Defaults to the current stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_stage: Option<String>,

    /// Event removed on stop/shutdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_event: Option<String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            persist_path: None,
            persist_format: default_persist_format(),
            shutdown_stage: None,
            shutdown_event: None,
        }
    }
}

impl LifecycleConfig {
    pub fn format(&self) -> Result<Format, ConfigError> {
        Format::from_str(&self.persist_format).map_err(|e| ConfigError::InvalidValue {
            field: "lifecycle.persist_format".to_string(),
            message: e.to_string(),
        })
    }

    /// Persistence target with `~` expanded, when configured.
    pub fn persistence(&self) -> Result<Option<(PathBuf, Format)>, ConfigError> {
        let Some(path) = &self.persist_path else {
            return Ok(None);
        };
        let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
        Ok(Some((PathBuf::from(expanded), self.format()?)))
    }
}

fn default_persist_format() -> String {
    "json".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily rolling log files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.runtime.name, "lifeline");
        assert!(!config.runtime.metrics);
        assert_eq!(config.channels, ChannelsConfig { small: 2, medium: 5, large: 10 });
        assert_eq!(config.lifecycle.persist_format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [channels]
            medium = 8

            [logging]
            format = "json"
        "#,
        )
        .unwrap();
        assert_eq!(config.channels.small, 2);
        assert_eq!(config.channels.medium, 8);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let result = toml::from_str::<RuntimeConfig>("[logging]\nformat = \"xml\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_persistence() {
        let mut lifecycle = LifecycleConfig::default();
        assert!(lifecycle.persistence().unwrap().is_none());

        lifecycle.persist_path = Some(PathBuf::from("/var/lib/lifeline/process.yml"));
        lifecycle.persist_format = "YML".to_string();
        let (path, format) = lifecycle.persistence().unwrap().unwrap();
        assert_eq!(path, PathBuf::from("/var/lib/lifeline/process.yml"));
        assert_eq!(format, Format::Yaml);

        lifecycle.persist_format = "xml".to_string();
        assert!(matches!(
            lifecycle.persistence(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_process_section() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [process]
            name = "worker"
            command = "/usr/bin/worker"
            args = ["--once"]
            wait_for = ["db"]
            restart = true
        "#,
        )
        .unwrap();
        assert_eq!(config.process.name, "worker");
        assert_eq!(config.process.args, vec!["--once"]);
        assert_eq!(config.process.wait_for, vec!["db"]);
        assert!(config.process.restart);
    }

    #[test]
    fn test_to_toml_string_reloads() {
        let mut config = RuntimeConfig::default();
        config.runtime.metrics = true;
        config.lifecycle.shutdown_event = Some("heartbeat".to_string());

        let text = config.to_toml_string().unwrap();
        let reloaded: RuntimeConfig = toml::from_str(&text).unwrap();
        assert!(reloaded.runtime.metrics);
        assert_eq!(reloaded.lifecycle.shutdown_event.as_deref(), Some("heartbeat"));
    }
}
