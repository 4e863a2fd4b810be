//! Deep merge of settings trees.
//!
//! Later trees win at the leaf level. Objects merge key by key; every other
//! value (scalars, arrays, null, or a type mismatch) replaces the
//! accumulated value wholesale. Arrays are never merged element-wise.

use serde_json::Value;

/// Merge `trees` left to right into a new tree. Inputs are not modified.
///
/// An empty slice yields an empty object.
pub fn deep_merge(trees: &[&Value]) -> Value {
    let mut acc = Value::Object(serde_json::Map::new());
    for (i, tree) in trees.iter().enumerate() {
        if i == 0 {
            acc = (*tree).clone();
        } else {
            merge_into(&mut acc, tree);
        }
    }
    acc
}

/// Merge `incoming` into `target` in place.
pub fn merge_into(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(acc), Value::Object(next)) => {
            for (key, value) in next {
                match acc.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        acc.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, incoming) => *target = incoming.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_wins_at_leaf() {
        let defaults = json!({"theme": {"dark": false, "primary": "#1976D2"}});
        let remote = json!({"theme": {"dark": true}});
        let local = json!({});

        let merged = deep_merge(&[&defaults, &remote, &local]);
        assert_eq!(
            merged,
            json!({"theme": {"dark": true, "primary": "#1976D2"}})
        );
    }

    #[test]
    fn test_arrays_replaced_wholesale() {
        let merged = deep_merge(&[&json!({"tags": [1, 2]}), &json!({"tags": [3]})]);
        assert_eq!(merged, json!({"tags": [3]}));
    }

    #[test]
    fn test_type_mismatch_replaces() {
        let merged = deep_merge(&[&json!({"a": {"b": 1}}), &json!({"a": "flat"})]);
        assert_eq!(merged, json!({"a": "flat"}));

        let merged = deep_merge(&[&json!({"a": "flat"}), &json!({"a": {"b": 1}})]);
        assert_eq!(merged, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_null_overrides() {
        let merged = deep_merge(&[
            &json!({"lastError": {"message": "x"}}),
            &json!({"lastError": null}),
        ]);
        assert_eq!(merged, json!({"lastError": null}));
    }

    #[test]
    fn test_inputs_untouched() {
        let base = json!({"a": {"b": 1}});
        let over = json!({"a": {"c": 2}});
        let base_before = base.clone();
        let over_before = over.clone();

        let merged = deep_merge(&[&base, &over]);

        assert_eq!(merged, json!({"a": {"b": 1, "c": 2}}));
        assert_eq!(base, base_before);
        assert_eq!(over, over_before);
    }

    #[test]
    fn test_priority_chain() {
        let defaults = json!({"x": "default", "y": "default", "z": "default"});
        let remote = json!({"x": "remote", "y": "remote"});
        let local = json!({"x": "local"});

        let merged = deep_merge(&[&defaults, &remote, &local]);
        assert_eq!(merged, json!({"x": "local", "y": "remote", "z": "default"}));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(deep_merge(&[]), json!({}));
    }
}
