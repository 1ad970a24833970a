//! Reference scanning over document, event and task JSON schemas.
//!
//! Import uses these to check that a schema only points at register keys and
//! units that exist in the target environment.

use serde_json::Value;

use crate::types::DbId;

/// Every numeric `keyId` anywhere in the schema, in document order, deduplicated.
///
/// Non-numeric `keyId` values (function sources, placeholders) are skipped.
pub fn key_ids(schema: &Value) -> Vec<DbId> {
    let mut out = Vec::new();
    walk(schema, &mut |node| {
        if let Some(id) = node.get("keyId").and_then(Value::as_i64) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    });
    out
}

/// A schema node declaring both a `keyId` and a `whiteList`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteListNode<'a> {
    pub key_id: &'a Value,
    pub white_list: &'a Value,
}

impl WhiteListNode<'_> {
    /// Numeric register key ids in the white list.
    pub fn key_ids(&self) -> Vec<DbId> {
        self.white_list
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    /// The `keyId` source text when it is a string.
    pub fn key_id_source(&self) -> Option<&str> {
        self.key_id.as_str()
    }
}

/// Every node that declares both `keyId` and `whiteList`.
pub fn white_list_nodes(schema: &Value) -> Vec<WhiteListNode<'_>> {
    let mut out = Vec::new();
    collect_white_list_nodes(schema, &mut out);
    out
}

fn collect_white_list_nodes<'a>(value: &'a Value, out: &mut Vec<WhiteListNode<'a>>) {
    match value {
        Value::Object(map) => {
            if let (Some(key_id), Some(white_list)) = (map.get("keyId"), map.get("whiteList")) {
                out.push(WhiteListNode { key_id, white_list });
            }
            for child in map.values() {
                collect_white_list_nodes(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_white_list_nodes(child, out);
            }
        }
        _ => {}
    }
}

/// Unit ids listed under `setPermissions[].performerUnits[]`, deduplicated.
pub fn performer_unit_ids(schema: &Value) -> Vec<DbId> {
    let mut out = Vec::new();
    let permissions = schema
        .get("setPermissions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for permission in permissions {
        let units = permission
            .get("performerUnits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for id in units.iter().filter_map(Value::as_i64) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

/// Depth-first visit of every object in the tree.
fn walk<'a>(value: &'a Value, visit: &mut impl FnMut(&'a Value)) {
    match value {
        Value::Object(map) => {
            visit(value);
            for child in map.values() {
                walk(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collects_nested_numeric_key_ids_once() {
        let schema = json!({
            "keyId": 1,
            "properties": {
                "a": {"keyId": 2},
                "b": {"items": [{"keyId": 3}, {"keyId": 2}]},
                "c": {"keyId": "() => 4"}
            }
        });
        assert_eq!(key_ids(&schema), vec![1, 2, 3]);
    }

    #[test]
    fn schema_without_key_ids_is_empty() {
        assert!(key_ids(&json!({"title": "plain"})).is_empty());
        assert!(key_ids(&json!(null)).is_empty());
    }

    #[test]
    fn white_list_nodes_need_both_fields() {
        let schema = json!({
            "properties": {
                "a": {"keyId": "() => 1", "whiteList": [10, 11, "x"]},
                "b": {"keyId": 5},
                "c": {"whiteList": [12]}
            }
        });
        let nodes = white_list_nodes(&schema);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key_id_source(), Some("() => 1"));
        assert_eq!(nodes[0].key_ids(), vec![10, 11]);
    }

    #[test]
    fn performer_units_are_read_from_top_level_permissions() {
        let schema = json!({
            "setPermissions": [
                {"performerUnits": [4, 5]},
                {"performerUnits": [5, 6]},
                {"other": true}
            ],
            "nested": {"setPermissions": [{"performerUnits": [99]}]}
        });
        assert_eq!(performer_unit_ids(&schema), vec![4, 5, 6]);
    }

    #[test]
    fn missing_permissions_yield_no_units() {
        assert!(performer_unit_ids(&json!({})).is_empty());
        assert!(performer_unit_ids(&json!({"setPermissions": "nope"})).is_empty());
    }
}
