//! Configuration validation.

use std::str::FromStr;

use lifeline_protocols::Format;

use crate::schema::RuntimeConfig;

/// Outcome of [`ConfigValidator::validate`].
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &RuntimeConfig) -> ValidationReport {
        let mut report = ValidationReport::default();

        Self::validate_runtime(config, &mut report);
        Self::validate_channels(config, &mut report);
        Self::validate_lifecycle(config, &mut report);
        Self::validate_process(config, &mut report);
        Self::validate_logging(config, &mut report);

        report
    }

    fn validate_runtime(config: &RuntimeConfig, report: &mut ValidationReport) {
        if config.runtime.name.trim().is_empty() {
            report.add_error(ValidationError::new("runtime.name", "Name cannot be empty"));
        }
    }

    fn validate_channels(config: &RuntimeConfig, report: &mut ValidationReport) {
        let channels = &config.channels;
        for (path, size) in [
            ("channels.small", channels.small),
            ("channels.medium", channels.medium),
            ("channels.large", channels.large),
        ] {
            if size == 0 {
                report.add_error(ValidationError::new(path, "Buffer size must be greater than 0"));
            }
        }

        if channels.small > channels.medium {
            report.add_warning(ValidationWarning::new(
                "channels.small",
                format!(
                    "small buffer ({}) is larger than medium ({})",
                    channels.small, channels.medium
                ),
            ));
        }
        if channels.medium > channels.large {
            report.add_warning(ValidationWarning::new(
                "channels.medium",
                format!(
                    "medium buffer ({}) is larger than large ({})",
                    channels.medium, channels.large
                ),
            ));
        }
    }

    fn validate_lifecycle(config: &RuntimeConfig, report: &mut ValidationReport) {
        if let Err(e) = Format::from_str(&config.lifecycle.persist_format) {
            report.add_error(ValidationError::new(
                "lifecycle.persist_format",
                format!("{}, valid values: json, yaml, toml", e),
            ));
        }
    }

    fn validate_process(config: &RuntimeConfig, report: &mut ValidationReport) {
        let process = &config.process;
        if process.command.is_empty() {
            report.add_warning(ValidationWarning::new(
                "process.command",
                "No command set, the process input will fail validation",
            ));
        }
        if !process.name.is_empty() && process.wait_for.contains(&process.name) {
            report.add_error(ValidationError::new(
                "process.wait_for",
                format!("Process '{}' cannot wait for itself", process.name),
            ));
        }
    }

    fn validate_logging(config: &RuntimeConfig, report: &mut ValidationReport) {
        let level = config.logging.level.to_ascii_lowercase();
        // Anything with a directive separator is handed to EnvFilter as-is.
        if !level.contains('=') && !level.contains(',') && !LOG_LEVELS.contains(&level.as_str()) {
            report.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
