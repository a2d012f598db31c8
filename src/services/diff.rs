use serde_json::Value;

use crate::db::models::requests::{DiffEntry, Payload};

/// Field-level diff between an original snapshot and a proposed payload.
///
/// Keys are visited in the order they first appear (original first, then
/// payload-only keys). Values are compared by their serialized form, so
/// nested arrays and objects are order-sensitive. Absent sides become `null`.
pub fn compute_diff(original: &Payload, payload: &Payload) -> Vec<DiffEntry> {
    let keys = original
        .keys()
        .chain(payload.keys().filter(|k| !original.contains_key(*k)));

    keys.filter_map(|key| {
        let from = original.get(key).cloned().unwrap_or(Value::Null);
        let to = payload.get(key).cloned().unwrap_or(Value::Null);
        if same_serialized(&from, &to) {
            None
        } else {
            Some(DiffEntry { field: key.clone(), from, to })
        }
    })
    .collect()
}

fn same_serialized(a: &Value, b: &Value) -> bool {
    match (serde_json::to_string(a), serde_json::to_string(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
