use super::*;

fn has_error(report: &ValidationReport, path: &str) -> bool {
    report.errors.iter().any(|e| e.path == path)
}

fn has_warning(report: &ValidationReport, path: &str) -> bool {
    report.warnings.iter().any(|w| w.path == path)
}

#[test]
fn test_validate_default_config() {
    let report = ConfigValidator::validate(&RuntimeConfig::default());
    assert!(report.is_valid());
    // The default config has no process command.
    assert!(has_warning(&report, "process.command"));
}

#[test]
fn test_validate_zero_buffer() {
    let mut config = RuntimeConfig::default();
    config.channels.small = 0;
    config.channels.large = 0;

    let report = ConfigValidator::validate(&config);
    assert!(!report.is_valid());
    assert!(has_error(&report, "channels.small"));
    assert!(has_error(&report, "channels.large"));
    assert!(!has_error(&report, "channels.medium"));
}

#[test]
fn test_validate_buffer_ordering_warnings() {
    let mut config = RuntimeConfig::default();
    config.channels.small = 6;
    config.channels.medium = 12;

    let report = ConfigValidator::validate(&config);
    assert!(report.is_valid());
    assert!(!has_warning(&report, "channels.small"));
    assert!(has_warning(&report, "channels.medium"));
}

#[test]
fn test_validate_unknown_persist_format() {
    let mut config = RuntimeConfig::default();
    config.lifecycle.persist_format = "xml".to_string();

    let report = ConfigValidator::validate(&config);
    assert!(has_error(&report, "lifecycle.persist_format"));
    let message = &report.errors[0].message;
    assert!(message.contains("xml"));
}

#[test]
fn test_validate_yml_alias() {
    let mut config = RuntimeConfig::default();
    config.lifecycle.persist_format = "yml".to_string();
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_validate_self_dependency() {
    let mut config = RuntimeConfig::default();
    config.process.name = "worker".to_string();
    config.process.command = "/usr/bin/worker".to_string();
    config.process.wait_for = vec!["db".to_string(), "worker".to_string()];

    let report = ConfigValidator::validate(&config);
    assert!(has_error(&report, "process.wait_for"));
    assert!(!has_warning(&report, "process.command"));
}

#[test]
fn test_validate_log_level() {
    let mut config = RuntimeConfig::default();
    config.logging.level = "chatty".to_string();
    assert!(has_error(&ConfigValidator::validate(&config), "logging.level"));

    config.logging.level = "WARN".to_string();
    assert!(ConfigValidator::validate(&config).is_valid());

    config.logging.level = "info,lifeline_core=debug".to_string();
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_validate_empty_name() {
    let mut config = RuntimeConfig::default();
    config.runtime.name = "  ".to_string();
    assert!(has_error(&ConfigValidator::validate(&config), "runtime.name"));
}
