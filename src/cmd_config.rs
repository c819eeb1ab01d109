//! `lifeline validate` and `lifeline init`.

use std::path::Path;

use anyhow::bail;

use lifeline_config::{ConfigLoader, ConfigValidator, RuntimeConfig};

/// Print the validation report. Fails when there are errors.
pub(crate) fn validate(path: &Path) -> anyhow::Result<()> {
    let config = ConfigLoader::load(path)?;
    let report = ConfigValidator::validate(&config);

    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !report.is_valid() {
        bail!(
            "{} has {} error(s)",
            path.display(),
            report.errors.len()
        );
    }
    println!("{} is valid", path.display());
    Ok(())
}

/// Write a default configuration to `path`.
pub(crate) fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, RuntimeConfig::default().to_toml_string()?)?;
    println!("Wrote {}", path.display());
    Ok(())
}
