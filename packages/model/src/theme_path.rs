//! Dot-path addressing into nested JSON objects.
//!
//! Used for whole-path theme assignment (`globalColors.primary`). Setting a
//! path creates any missing intermediate objects and replaces intermediate
//! values that are not objects.

use serde_json::{Map, Value};

/// Split a dot path into segments. Empty paths and empty segments
/// (`"a..b"`, `".a"`) are rejected.
pub fn segments(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }

    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    Some(parts)
}

/// Read the value at `path`, if every segment resolves.
pub fn get_at_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cursor = root;
    for segment in segments(path)? {
        cursor = cursor.as_object()?.get(segment)?;
    }
    Some(cursor)
}

/// Assign `value` at `path` inside `root`. Returns `false` (leaving `root`
/// untouched) when the path is malformed.
pub fn set_at_path(root: &mut Value, path: &str, value: Value) -> bool {
    let Some(parts) = segments(path) else {
        return false;
    };
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    assign(root, parents, last, value);
    true
}

fn assign(target: &mut Value, parents: &[&str], last: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };

    match parents.split_first() {
        None => {
            map.insert(last.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            assign(child, rest, last, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_existing_leaf() {
        let mut root = json!({ "globalColors": { "primary": "#000" } });
        assert!(set_at_path(&mut root, "globalColors.primary", json!("#fff")));
        assert_eq!(root, json!({ "globalColors": { "primary": "#fff" } }));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut root = json!({});
        assert!(set_at_path(&mut root, "spacing.section.top", json!(48)));
        assert_eq!(get_at_path(&root, "spacing.section.top"), Some(&json!(48)));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut root = json!({ "spacing": 4 });
        assert!(set_at_path(&mut root, "spacing.unit", json!("px")));
        assert_eq!(root, json!({ "spacing": { "unit": "px" } }));
    }

    #[test]
    fn test_set_on_scalar_root() {
        let mut root = json!(5);
        assert!(set_at_path(&mut root, "a.b", json!(true)));
        assert_eq!(root, json!({ "a": { "b": true } }));

        let mut root = json!(["x"]);
        assert!(set_at_path(&mut root, "a", json!(1)));
        assert_eq!(root, json!({ "a": 1 }));
    }

    #[test]
    fn test_malformed_paths_rejected() {
        let mut root = json!({ "a": 1 });
        for path in ["", ".", "a.", ".a", "a..b"] {
            assert!(!set_at_path(&mut root, path, json!(2)), "path {:?}", path);
        }
        assert_eq!(root, json!({ "a": 1 }));
    }

    #[test]
    fn test_get_missing_path() {
        let root = json!({ "a": { "b": 1 } });
        assert_eq!(get_at_path(&root, "a.c"), None);
        assert_eq!(get_at_path(&root, "a.b.c"), None);
    }
}
