//! Layered deep-merge over `toml::Value`, for the three config layers this
//! crate composes: global → tenant → agent.

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge recursively per-field; scalars and arrays from `overlay`
/// replace the corresponding value in `base`.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_scalar_replaces_base_scalar() {
        let mut base: toml::Value = toml::from_str("wait_ms = 600").unwrap();
        let overlay: toml::Value = toml::from_str("wait_ms = 1200").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["wait_ms"].as_integer(), Some(1200));
    }

    #[test]
    fn overlay_merges_nested_tables_without_dropping_untouched_keys() {
        let mut base: toml::Value = toml::from_str(
            r#"
            [channels.web]
            default_turn_window_ms = 600
            max_message_length = 8192
            "#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
            [channels.web]
            default_turn_window_ms = 900
            "#,
        )
        .unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["channels"]["web"]["default_turn_window_ms"].as_integer(), Some(900));
        assert_eq!(base["channels"]["web"]["max_message_length"].as_integer(), Some(8192));
    }
}
