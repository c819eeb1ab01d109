//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::RuntimeConfig;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<RuntimeConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<RuntimeConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: RuntimeConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<RuntimeConfig, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(RuntimeConfig::default()),
            other => other,
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
        let re = PATTERN
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}"))
            .as_ref()
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.lifeline`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// `~/.lifeline/config.toml`, or a relative `lifeline.toml` when the
    /// home directory is unknown.
    pub fn default_path() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".lifeline").join("config.toml"),
            None => PathBuf::from("lifeline.toml"),
        }
    }
}
