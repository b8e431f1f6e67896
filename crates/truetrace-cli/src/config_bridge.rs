//! Bridge from `truetrace_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates. These
//! functions translate its types into the chain and telemetry types, so the
//! conversion happens once, here.

use std::path::Path;

use truetrace_chain::{ChainLog, EventDefaults, JsonFileChainStorage, RulePolicy, Validator};
use truetrace_config::Config;
use truetrace_telemetry::{LogConfig, LogFormat};

/// Convert config to [`LogConfig`]. A relative log directory resolves
/// against `base`.
#[must_use]
pub fn to_log_config(cfg: &Config, base: &Path) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();

    let log = LogConfig::new(&cfg.logging.level)
        .with_format(format)
        .with_directives(&cfg.logging.directives);
    match cfg.log_directory(base) {
        Some(dir) => log.in_directory(dir),
        None => log,
    }
}

/// Convert config to [`RulePolicy`]. A zero size limit disables the check.
#[must_use]
pub fn to_rule_policy(cfg: &Config) -> RulePolicy {
    let rules = &cfg.rules;
    RulePolicy {
        check_field_types: rules.check_field_types,
        require_object_payload: rules.require_object_payload,
        max_payload_bytes: (rules.max_payload_bytes > 0)
            .then(|| usize::try_from(rules.max_payload_bytes).unwrap_or(usize::MAX)),
        allowed_event_types: rules.allowed_event_types.clone(),
    }
}

/// Convert config to [`EventDefaults`].
#[must_use]
pub fn to_event_defaults(cfg: &Config) -> EventDefaults {
    EventDefaults {
        version: cfg.events.version.clone(),
        origin: cfg.events.origin.clone(),
    }
}

/// Convert config to the validator used for appends and diagnostics.
#[must_use]
pub fn to_validator(cfg: &Config) -> Validator {
    Validator::from_policy(&to_rule_policy(cfg))
}

/// Convert config to the file-backed storage, with relative paths resolved
/// against `base`.
#[must_use]
pub fn to_storage(cfg: &Config, base: &Path) -> JsonFileChainStorage {
    JsonFileChainStorage::new(cfg.chain_path(base)).with_backup_suffix(&cfg.storage.backup_suffix)
}

/// Build an unsigned [`ChainLog`] from config.
#[must_use]
pub fn to_chain_log(cfg: &Config, base: &Path) -> ChainLog {
    ChainLog::with_storage(Box::new(to_storage(cfg, base)))
        .with_validator(to_validator(cfg))
        .with_defaults(to_event_defaults(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use truetrace_telemetry::LogTarget;

    #[test]
    fn test_default_policy_matches_chain_default() {
        assert_eq!(to_rule_policy(&Config::default()), RulePolicy::default());
    }

    #[test]
    fn test_zero_limit_disables_size_rule() {
        let mut cfg = Config::default();
        cfg.rules.max_payload_bytes = 0;
        cfg.rules.allowed_event_types = vec!["login".to_owned()];

        let policy = to_rule_policy(&cfg);
        assert_eq!(policy.max_payload_bytes, None);
        assert_eq!(policy.allowed_event_types, vec!["login"]);
        assert!(!to_validator(&cfg).rules().names().contains(&"payload_size"));
    }

    #[test]
    fn test_log_config_from_config() {
        let mut cfg = Config::default();
        cfg.logging.format = "json".to_owned();
        cfg.logging.directives = vec!["truetrace_chain=debug".to_owned()];

        let lc = to_log_config(&cfg, Path::new("/srv"));
        assert_eq!(lc.level, "warn");
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.directives, vec!["truetrace_chain=debug"]);
        assert_eq!(lc.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_directory_from_config() {
        let mut cfg = Config::default();
        cfg.logging.directory = "logs".to_owned();

        let lc = to_log_config(&cfg, Path::new("/srv"));
        assert_eq!(lc.target, LogTarget::Directory("/srv/logs".into()));
        assert!(!lc.ansi);
    }

    #[test]
    fn test_storage_paths() {
        let cfg = Config::default();
        let storage = to_storage(&cfg, Path::new("/srv"));
        assert_eq!(
            storage.path(),
            Path::new("/srv/data/chain/event_chain.json")
        );
        assert_eq!(
            storage.backup_path(),
            Path::new("/srv/data/chain/event_chain.json.bak")
        );
    }

    #[test]
    fn test_chain_log_writes_configured_file() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.events.origin = "sensor".to_owned();
        cfg.rules.allowed_event_types = vec!["login".to_owned()];

        let log = to_chain_log(&cfg, root.path());
        let event = log
            .create(truetrace_chain::NewEvent::new("login", serde_json::json!({})))
            .unwrap();
        assert_eq!(event.get("origin"), Some(&serde_json::json!("sensor")));
        assert!(cfg.chain_path(root.path()).exists());

        assert!(log
            .create(truetrace_chain::NewEvent::new("logout", serde_json::json!({})))
            .is_err());
        assert_eq!(to_chain_log(&cfg, root.path()).len().unwrap(), 1);
    }

    #[test]
    fn test_event_defaults() {
        let mut cfg = Config::default();
        cfg.events.origin = "sensor".to_owned();
        assert_eq!(to_event_defaults(&cfg).origin, "sensor");
    }
}
