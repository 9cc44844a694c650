//! Field-diff computation for audit entry detail payloads.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{EatError, EatResult};

/// Stamps that never appear in UPDATE diffs: they change on every
/// write and carry no audit signal of their own.
pub const DIFF_IGNORED_FIELDS: &[&str] =
    &["id", "created_at", "updated_at", "created_by", "updated_by"];

/// Serialize a record to the flat field map used for CREATE and DELETE
/// detail payloads.
pub fn snapshot<T: Serialize>(record: &T) -> EatResult<Value> {
    serde_json::to_value(record).map_err(|e| EatError::Internal(format!("snapshot: {e}")))
}

/// Compute the UPDATE detail payload: one `{"old": .., "new": ..}`
/// object per changed field, unchanged fields omitted. Both inputs
/// must be JSON objects (the output of [`snapshot`]).
///
/// Fields present in only one side diff against JSON `null`, so a
/// cleared optional shows as `{"old": <v>, "new": null}`.
pub fn diff_fields(old: &Value, new: &Value) -> Map<String, Value> {
    let empty = Map::new();
    let old_map = old.as_object().unwrap_or(&empty);
    let new_map = new.as_object().unwrap_or(&empty);

    let mut changes = Map::new();
    let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        if DIFF_IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let old_value = old_map.get(key).unwrap_or(&Value::Null);
        let new_value = new_map.get(key).unwrap_or(&Value::Null);
        if old_value != new_value {
            changes.insert(key.clone(), json!({ "old": old_value, "new": new_value }));
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_fields_are_omitted() {
        let old = json!({ "status": "inactive", "name": "tracker" });
        let new = json!({ "status": "active", "name": "tracker" });

        let changes = diff_fields(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes["status"],
            json!({ "old": "inactive", "new": "active" })
        );
        assert!(!changes.contains_key("name"));
    }

    #[test]
    fn volatile_stamps_never_diff() {
        let old = json!({ "updated_at": "2026-01-01T00:00:00Z", "name": "a" });
        let new = json!({ "updated_at": "2026-02-01T00:00:00Z", "name": "a" });
        assert!(diff_fields(&old, &new).is_empty());
    }

    #[test]
    fn cleared_field_diffs_against_null() {
        let old = json!({ "system_manager_notes": "secret" });
        let new = json!({ "system_manager_notes": null });
        let changes = diff_fields(&old, &new);
        assert_eq!(
            changes["system_manager_notes"],
            json!({ "old": "secret", "new": null })
        );
    }

    #[test]
    fn identical_records_produce_no_changes() {
        let value = json!({ "a": 1, "b": [1, 2], "c": { "d": true } });
        assert!(diff_fields(&value, &value).is_empty());
    }
}
