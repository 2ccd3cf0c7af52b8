//! Field-level diff between two plain document snapshots.

use serde_json::{Map, Value};
use service_migration_shared::{ChangedBy, FieldChange};
use std::collections::BTreeMap;

/// Root fields refreshed on every write and never reported as changes.
pub const EXCLUDED_FIELDS: [&str; 2] = ["createdTime", "lastUpdated"];

/// Compute the changed fields between two snapshots.
///
/// Nested objects are reported by dotted path and list elements as
/// `field[i]`. When a list changes length the whole list is reported at its
/// own path. A key present on one side only is a change even when its value
/// is null; the absent side is reported as null. Excluded fields are compared
/// at the root only.
pub fn detect_changes(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    excluded: &[&str],
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    for key in union_keys(old, new) {
        if excluded.contains(&key) {
            continue;
        }
        compare(key.to_string(), old.get(key), new.get(key), &mut changes);
    }
    changes
}

fn union_keys<'a>(old: &'a Map<String, Value>, new: &'a Map<String, Value>) -> Vec<&'a str> {
    let mut keys: Vec<&str> = old.keys().chain(new.keys()).map(String::as_str).collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

fn compare(
    path: String,
    old: Option<&Value>,
    new: Option<&Value>,
    changes: &mut BTreeMap<String, FieldChange>,
) {
    match (old, new) {
        (Some(Value::Object(old_map)), Some(Value::Object(new_map))) => {
            for key in union_keys(old_map, new_map) {
                compare(
                    format!("{path}.{key}"),
                    old_map.get(key),
                    new_map.get(key),
                    changes,
                );
            }
        }
        (Some(Value::Array(old_items)), Some(Value::Array(new_items)))
            if old_items.len() == new_items.len() =>
        {
            for (index, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
                compare(
                    format!("{path}[{index}]"),
                    Some(old_item),
                    Some(new_item),
                    changes,
                );
            }
        }
        _ if old != new => {
            changes.insert(
                path,
                FieldChange {
                    old: old.cloned().unwrap_or(Value::Null),
                    new: new.cloned().unwrap_or(Value::Null),
                },
            );
        }
        _ => {}
    }
}

/// The actor recorded in the snapshot's `lastUpdatedBy`, or the unknown actor.
pub fn extract_changed_by(document: &Map<String, Value>) -> ChangedBy {
    let default = ChangedBy::default();
    let Some(actor) = document.get("lastUpdatedBy").and_then(Value::as_object) else {
        return default;
    };

    let field = |name: &str, fallback: String| {
        actor
            .get(name)
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or(fallback)
    };

    ChangedBy {
        display: field("display", default.display.clone()),
        actor_type: field("type", default.actor_type.clone()),
        value: field("value", default.value.clone()),
    }
}
