//! # Deep Merge Engine
//!
//! Combines an ordered list of raw fragments into one tree with fixed
//! precedence and replacement rules.
//!
//! # Merge Rules
//! Applied recursively, key by key:
//! 1. An override array **replaces** the base value entirely, whatever the
//!    base's type. Arrays are never concatenated or element-merged.
//! 2. Override object + base object merge recursively.
//! 3. Anything else (scalars, type mismatches) — the override wins.
//!
//! Layers apply left to right, lowest precedence first:
//! `{}` → shared defaults → tenant base → report-mode override.

use serde_json::{Map, Value};

/// Merge an override tree onto a base tree.
///
/// Pure: both inputs are left untouched and a new tree is returned.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let replacement = match merged.get(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        deep_merge(base_value, overlay_value)
                    }
                    // Arrays and scalars replace; so does any type mismatch.
                    _ => overlay_value.clone()
                };
                merged.insert(key.clone(), replacement);
            }
            Value::Object(merged)
        }
        _ => overlay.clone()
    }
}

/// Fold an ordered list of layers into one merged tree, starting from an
/// empty object. A single-layer list (legacy mode) comes back unchanged.
pub fn merge_layers<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), |merged, layer| deep_merge(&merged, layer))
}
