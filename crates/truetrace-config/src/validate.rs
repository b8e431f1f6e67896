//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_keys(config)?;
    validate_events(config)?;
    validate_rules(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn require_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    let s = &config.storage;
    require_non_empty("storage.chain_file", &s.chain_file)?;
    require_non_empty("storage.backup_suffix", &s.backup_suffix)?;
    if s.backup_suffix.contains('/') || s.backup_suffix.contains('\\') {
        return Err(invalid(
            "storage.backup_suffix",
            "must not contain path separators",
        ));
    }
    Ok(())
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    require_non_empty("keys.private_key", &config.keys.private_key)?;
    require_non_empty("keys.public_key", &config.keys.public_key)?;
    if config.keys.private_key == config.keys.public_key {
        return Err(invalid(
            "keys.public_key",
            "must differ from keys.private_key",
        ));
    }
    Ok(())
}

fn validate_events(config: &Config) -> ConfigResult<()> {
    require_non_empty("events.version", &config.events.version)?;
    require_non_empty("events.origin", &config.events.origin)
}

fn validate_rules(config: &Config) -> ConfigResult<()> {
    if let Some(pos) = config
        .rules
        .allowed_event_types
        .iter()
        .position(|t| t.trim().is_empty())
    {
        return Err(invalid(
            "rules.allowed_event_types",
            format!("entry {pos} is empty"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    require_non_empty("logging.level", &l.level)?;
    if !LOG_FORMATS.contains(&l.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_chain_file_rejected() {
        let mut config = Config::default();
        config.storage.chain_file = "  ".to_owned();
        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "storage.chain_file"
        ));
    }

    #[test]
    fn test_backup_suffix_with_separator_rejected() {
        let mut config = Config::default();
        config.storage.backup_suffix = "/tmp/x".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_key_paths_rejected() {
        let mut config = Config::default();
        config.keys.public_key = config.keys.private_key.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("logging.format"));

        config.logging.format = "JSON".to_owned();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_blank_event_type_rejected() {
        let mut config = Config::default();
        config.rules.allowed_event_types = vec!["login".to_owned(), String::new()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }
}
