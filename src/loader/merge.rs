//! Deep merge of layer configurations.

use serde_json::{Map, Value};

/// Merge `overlay` into `base`. Objects merge recursively; any other value
/// (array, scalar, null) replaces the base value wholesale.
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            merge_maps(base_map, overlay_map);
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Merge `overlay` into `base` key by key.
pub fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Fold `merge_maps` over `layers` in order, starting from an empty object.
pub fn merge_all<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        merge_maps(&mut merged, layer);
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_merge_nested_objects() {
        let merged = merge_all(&[
            obj(json!({"a": "1", "b": {"x": "2"}})),
            obj(json!({"b": {"y": "3"}, "c": "4"})),
        ]);
        assert_eq!(merged, json!({"a": "1", "b": {"x": "2", "y": "3"}, "c": "4"}));
    }

    #[test]
    fn test_later_layer_wins() {
        let merged = merge_all(&[
            obj(json!({"option1": "value1", "option2": {"cle1": "value2"}})),
            obj(json!({"option1": "new value1", "option3": "value3", "option2": {"cle2": "value cle2"}})),
            obj(json!({"option1": "value1 ok", "option2": {"cle1": "value2 ok"}})),
        ]);
        assert_eq!(
            merged,
            json!({
                "option1": "value1 ok",
                "option2": {"cle1": "value2 ok", "cle2": "value cle2"},
                "option3": "value3",
            })
        );
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let merged = merge_all(&[
            obj(json!({"list": [1, 2, 3], "nested": {"list": ["a"]}})),
            obj(json!({"list": [9], "nested": {"list": []}})),
        ]);
        assert_eq!(merged, json!({"list": [9], "nested": {"list": []}}));
    }

    #[test]
    fn test_scalar_and_object_override_each_other() {
        let merged = merge_all(&[obj(json!({"a": {"x": 1}})), obj(json!({"a": "flat"}))]);
        assert_eq!(merged, json!({"a": "flat"}));

        let merged = merge_all(&[obj(json!({"a": "flat"})), obj(json!({"a": {"x": 1}}))]);
        assert_eq!(merged, json!({"a": {"x": 1}}));

        let merged = merge_all(&[obj(json!({"a": 1})), obj(json!({"a": null}))]);
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_merge_all_empty() {
        let layers: Vec<Map<String, Value>> = vec![];
        assert_eq!(merge_all(&layers), json!({}));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,4}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
                prop::collection::btree_map("[a-c]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_layer() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map("[a-c]", arb_value(), 0..4)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(layers in prop::collection::vec(arb_layer(), 0..5)) {
            prop_assert_eq!(merge_all(&layers), merge_all(&layers));
        }

        #[test]
        fn prop_merge_is_left_fold(layers in prop::collection::vec(arb_layer(), 1..5)) {
            // Merging a prefix first and then the remainder gives the same result.
            let split = layers.len() / 2;
            let mut stepwise = merge_all(&layers[..split]);
            for layer in &layers[split..] {
                merge_values(&mut stepwise, &Value::Object(layer.clone()));
            }
            prop_assert_eq!(stepwise, merge_all(&layers));
        }

        #[test]
        fn prop_last_layer_keys_win_for_scalars(
            first in arb_layer(),
            key in "[a-c]",
            scalar in any::<i32>(),
        ) {
            let mut last = Map::new();
            last.insert(key.clone(), json!(scalar));
            let merged = merge_all(&[first, last]);
            prop_assert_eq!(&merged[&key], &json!(scalar));
        }
    }
}
