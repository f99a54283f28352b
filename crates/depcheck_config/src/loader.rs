//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::DepcheckConfig;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "depcheck.toml";

/// Loads and validates a `depcheck.toml` configuration from a project directory.
///
/// Reads `<project_dir>/depcheck.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<DepcheckConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `depcheck.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<DepcheckConfig, ConfigError> {
    let config: DepcheckConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &DepcheckConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name"));
    }
    if config.sources.is_empty() {
        return Err(ConfigError::MissingField("sources"));
    }
    if let Some(root) = config.sources.iter().find(|s| s.dir.is_empty()) {
        return Err(ConfigError::Invalid(format!(
            "source root with prefix {:?} has an empty dir",
            root.prefix.as_deref().unwrap_or("")
        )));
    }
    if config.objects.extension.is_empty() || config.objects.extension.starts_with('.') {
        return Err(ConfigError::Invalid(
            "objects.extension must be a non-empty extension without a leading dot".to_string(),
        ));
    }
    if config.scan.extensions.is_empty() {
        return Err(ConfigError::Invalid(
            "scan.extensions must list at least one extension".to_string(),
        ));
    }
    if config.snapshot.path.is_empty() {
        return Err(ConfigError::MissingField("snapshot.path"));
    }
    Ok(())
}
