use super::{ConfigLayer, FieldSources};

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                    },
                }
            }
        },
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Deep-merge `overlay` into `base`, recording `layer` as the source of
/// every leaf the overlay sets.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    merge_at(base, overlay, "", layer, sources);
}

fn merge_at(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) => merge_at(base_val, overlay_val, &path, layer, sources),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Record every leaf path under `val` as set by `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_deep_merge_keeps_unset_keys() {
        let mut base = parse("[storage]\ndata_dir = \"data\"\nbackup_suffix = \".bak\"");
        deep_merge(&mut base, &parse("[storage]\ndata_dir = \"/var/lib/tt\""));

        assert_eq!(base["storage"]["data_dir"].as_str(), Some("/var/lib/tt"));
        assert_eq!(base["storage"]["backup_suffix"].as_str(), Some(".bak"));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[rules]\nallowed_event_types = [\"a\", \"b\"]");
        deep_merge(&mut base, &parse("[rules]\nallowed_event_types = [\"c\"]"));
        assert_eq!(
            base["rules"]["allowed_event_types"].as_array().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_tracking_records_leaf_paths() {
        let mut base = parse("[events]\norigin = \"system\"\nversion = \"1.5\"");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", &ConfigLayer::Defaults, &mut sources);

        deep_merge_tracking(
            &mut base,
            &parse("[events]\norigin = \"sensor\"\n[logging]\nlevel = \"debug\""),
            &ConfigLayer::User,
            &mut sources,
        );

        assert_eq!(sources.get("events.origin"), Some(&ConfigLayer::User));
        assert_eq!(sources.get("events.version"), Some(&ConfigLayer::Defaults));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::User));
    }
}
