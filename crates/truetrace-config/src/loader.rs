//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.truetrace/config.toml` (user)
//! 3. Merge `{workspace}/.truetrace/config.toml` (workspace)
//! 4. Merge the explicit `--config` file, which must exist
//! 5. Apply `TRUETRACE_*` environment overrides
//! 6. Deserialize merged tree → `Config`
//! 7. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
pub(crate) const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Directory name used for user and workspace config.
pub const CONFIG_DIR_NAME: &str = ".truetrace";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Where [`load`] looks for configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Project root for the workspace layer. `None` skips it.
    pub workspace_root: Option<PathBuf>,
    /// Directory holding the user `config.toml`. `None` uses
    /// `~/.truetrace`.
    pub user_dir: Option<PathBuf>,
    /// File passed with `--config`.
    pub explicit_file: Option<PathBuf>,
}

/// Load the configuration with the full precedence chain, reading the
/// process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, the explicit
/// file is missing, or the final configuration fails validation.
pub fn load(options: &LoadOptions) -> ConfigResult<ResolvedConfig> {
    load_with_env(options, &collect_env_vars())
}

/// Like [`load`], with an explicit environment map.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    options: &LoadOptions,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let user_dir = match &options.user_dir {
        Some(dir) => Some(dir.clone()),
        None => home_directory().ok().map(|h| h.join(CONFIG_DIR_NAME)),
    };
    let workspace_path = options
        .workspace_root
        .as_ref()
        .map(|root| root.join(CONFIG_DIR_NAME).join("config.toml"));

    let layers = [
        (user_dir.map(|d| d.join("config.toml")), ConfigLayer::User),
        (workspace_path, ConfigLayer::Workspace),
    ];
    for (path, layer) in layers {
        let Some(path) = path else { continue };
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, &layer, &mut field_sources);
            info!(path = %path.display(), layer = %layer, "loaded config");
            loaded_files.push(path.display().to_string());
        }
    }

    if let Some(path) = &options.explicit_file {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge_tracking(
            &mut merged,
            &overlay,
            &ConfigLayer::Explicit,
            &mut field_sources,
        );
        info!(path = %path.display(), "loaded explicit config");
        loaded_files.push(path.display().to_string());
    }

    let env_count = apply_env_overrides(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable overrides");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a single file (no layering, no environment).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Read and parse a TOML file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, body: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn isolated(home: &tempfile::TempDir) -> LoadOptions {
        LoadOptions {
            user_dir: Some(home.path().join(CONFIG_DIR_NAME)),
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_defaults_only() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(&isolated(&home), &HashMap::new()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("events.origin"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_precedence_chain() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write(
            &home.path().join(CONFIG_DIR_NAME),
            "[events]\norigin = \"user\"\n[logging]\nlevel = \"info\"",
        );
        write(
            &ws.path().join(CONFIG_DIR_NAME),
            "[events]\norigin = \"workspace\"",
        );
        let explicit = ws.path().join("explicit.toml");
        std::fs::write(&explicit, "[logging]\nlevel = \"debug\"").unwrap();

        let options = LoadOptions {
            workspace_root: Some(ws.path().to_path_buf()),
            explicit_file: Some(explicit),
            ..isolated(&home)
        };
        let env = HashMap::from([(
            "TRUETRACE_EVENT_ORIGIN".to_owned(),
            "env".to_owned(),
        )]);

        let resolved = load_with_env(&options, &env).unwrap();
        assert_eq!(resolved.config.events.origin, "env");
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(resolved.loaded_files.len(), 3);
        assert_eq!(
            resolved.field_sources.get("logging.level"),
            Some(&ConfigLayer::Explicit)
        );

        let resolved = load_with_env(&options, &HashMap::new()).unwrap();
        assert_eq!(resolved.config.events.origin, "workspace");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let options = LoadOptions {
            explicit_file: Some(home.path().join("nope.toml")),
            ..isolated(&home)
        };
        assert!(matches!(
            load_with_env(&options, &HashMap::new()),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join(CONFIG_DIR_NAME), "[events\norigin =");
        assert!(matches!(
            load_with_env(&isolated(&home), &HashMap::new()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        let env = HashMap::from([("TRUETRACE_LOG_FORMAT".to_owned(), "xml".to_owned())]);
        assert!(matches!(
            load_with_env(&isolated(&home), &env),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = format!("x = \"{}\"", "a".repeat(1_100_000));
        std::fs::write(&file_path, data).unwrap();

        assert!(matches!(
            try_load_file(&file_path),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
