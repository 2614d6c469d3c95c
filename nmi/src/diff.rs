//! Structural diffing used by [`crate::NodeManagementInterface::get_nodes_update`].
//!
//! Grounded on `interfaces/gnmi.py`'s
//! `DeepDiff(old, new, ignore_order=True, exclude_regex_paths=[r"\['timestamp'\]"])`
//! plus the `node_data | grep("Hello World! update for node")` pragma that
//! silently drops the hello-world app's own writes.

use serde_json::Value;

/// Marker text the source greps for to suppress the hello-world app's own
/// update notifications from being treated as a real change.
const HELLO_WORLD_MARKER: &str = "Hello World! update for node";

/// Compute the diff to publish for a freshly observed `new` value against
/// the previously cached `old` value (`None` on a node/path's first read).
///
/// Returns `None` when there is nothing worth notifying about: the values
/// are equal once `timestamp` keys are ignored at any depth, or `new`
/// textually contains the hello-world suppression marker. Otherwise
/// returns `Some(new.clone())`.
#[must_use]
pub fn diff_excluding_timestamp(old: Option<&Value>, new: &Value) -> Option<Value> {
    if contains_hello_world_marker(new) {
        return None;
    }

    match old {
        None => Some(new.clone()),
        Some(old) if values_equal_ignoring_timestamp(old, new) => None,
        Some(_) => Some(new.clone()),
    }
}

fn contains_hello_world_marker(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(HELLO_WORLD_MARKER),
        Value::Array(items) => items.iter().any(contains_hello_world_marker),
        Value::Object(map) => map.values().any(contains_hello_world_marker),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

fn values_equal_ignoring_timestamp(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: std::collections::BTreeSet<&String> =
                a.keys().chain(b.keys()).filter(|k| k.as_str() != "timestamp").collect();
            keys.into_iter().all(|key| {
                match (a.get(key), b.get(key)) {
                    (Some(av), Some(bv)) => values_equal_ignoring_timestamp(av, bv),
                    (None, None) => true,
                    _ => false,
                }
            })
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(av, bv)| values_equal_ignoring_timestamp(av, bv))
        }
        (a, b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_read_is_always_a_diff() {
        let new = json!({"admin-status": "UP"});
        assert_eq!(diff_excluding_timestamp(None, &new), Some(new));
    }

    #[test]
    fn identical_values_are_not_a_diff() {
        let old = json!({"admin-status": "UP", "timestamp": 100});
        let new = json!({"admin-status": "UP", "timestamp": 200});
        assert_eq!(diff_excluding_timestamp(Some(&old), &new), None);
    }

    #[test]
    fn changed_field_is_a_diff() {
        let old = json!({"admin-status": "UP", "timestamp": 100});
        let new = json!({"admin-status": "DOWN", "timestamp": 200});
        assert_eq!(diff_excluding_timestamp(Some(&old), &new), Some(new));
    }

    #[test]
    fn timestamp_nested_inside_object_is_still_ignored() {
        let old = json!({"state": {"counters": {"in-pkts": 5, "timestamp": 1}}});
        let new = json!({"state": {"counters": {"in-pkts": 5, "timestamp": 2}}});
        assert_eq!(diff_excluding_timestamp(Some(&old), &new), None);
    }

    #[test]
    fn hello_world_marker_suppresses_diff_even_with_real_change() {
        let old = json!({"description": "old"});
        let new = json!({"description": "Hello World! update for node r1"});
        assert_eq!(diff_excluding_timestamp(Some(&old), &new), None);
    }
}
