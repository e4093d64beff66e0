use serde_json::{Map, Value};

use crate::config::data::ConfigData;

/// Top-level key under which per-module configuration branches live.
pub const MODULES_KEY: &str = "modules";

/// Merge `overlay` into `base` key-wise.
///
/// When both sides hold a map under the same key the maps are merged
/// recursively; otherwise the overlay value replaces the base value outright
/// (sequences are replaced, never concatenated).
pub fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(key), overlay_value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                merge_maps(base_map, overlay_map);
            }
            _ => {
                base.insert(key.clone(), overlay_value.clone());
            }
        }
    }
}

/// Compose configuration layers in increasing precedence.
///
/// `defaults` is the lowest layer; each entry of `layers` overrides
/// everything before it.
pub fn compose(defaults: &ConfigData, layers: &[ConfigData]) -> ConfigData {
    let mut composed = defaults.clone();
    for layer in layers {
        composed.merge(layer);
    }
    composed
}

/// Canonical lookup key for a module name.
pub fn normalize_module_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Read the `modules.<name>` branch of a composed tree.
///
/// Keys under `modules` are compared case-insensitively; when several keys
/// normalize to the same name they are merged in key order.
pub fn module_section(tree: &ConfigData, module_name: &str) -> ConfigData {
    let wanted = normalize_module_key(module_name);
    let mut section = ConfigData::new();

    if let Some(Value::Object(modules)) = tree.get_path(MODULES_KEY) {
        for (key, value) in modules {
            if normalize_module_key(key) != wanted {
                continue;
            }
            if let Value::Object(branch) = value {
                section.merge(&ConfigData::from_map(branch.clone()));
            }
        }
    }
    section
}
