//! Options reconciliation.
//!
//! The single trust boundary between externally supplied option objects
//! (URL tokens, share payloads, local storage) and the live typed records.
//! Reconciliation starts from the current record and copies over only those
//! foreign keys that already exist and whose value has the same JSON kind.
//! It never adds keys, never changes a field's type, and never fails.

use serde_json::{Map, Value};
use std::mem::discriminant;

use crate::options::OptionsRecord;

/// Merge `foreign` into a copy of `current`, schema-free.
///
/// For each own key of `foreign` (only when it is an object) that also exists
/// in `current` with a value of the same JSON kind, the copy takes the
/// foreign value. Everything else is skipped silently.
pub fn reconcile_map(current: &Map<String, Value>, foreign: &Value) -> Map<String, Value> {
    let mut merged = current.clone();
    let Some(foreign) = foreign.as_object() else {
        return merged;
    };

    for (key, value) in foreign {
        if let Some(slot) = merged.get_mut(key) {
            if same_kind(slot, value) {
                *slot = value.clone();
            }
        }
    }

    merged
}

/// Merge `foreign` into a copy of a typed record.
///
/// Applies the same key and kind rules as [`reconcile_map`], and additionally
/// keeps a candidate field only if the record still deserializes with it, so
/// an enumerated field never takes a string outside its variants.
pub fn reconcile<T: OptionsRecord>(current: &T, foreign: &Value) -> T {
    let Some(foreign) = foreign.as_object() else {
        return current.clone();
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(current) else {
        return current.clone();
    };

    for (key, value) in foreign {
        let accept = match merged.get(key) {
            Some(existing) => same_kind(existing, value) && existing != value,
            None => false,
        };
        if !accept {
            continue;
        }

        let previous = merged.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            if let Some(previous) = previous {
                merged.insert(key.clone(), previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| current.clone())
}

/// Interpret a user-typed option value.
///
/// JSON literals (`true`, `"quoted"`, `3`) are parsed; anything else is taken
/// as a plain string.
pub fn parse_option_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn same_kind(a: &Value, b: &Value) -> bool {
    discriminant(a) == discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{AlternateMangler, AlternateOptions, Mangler, PrimaryOptions};
    use proptest::prelude::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn matching_keys_and_kinds_are_copied() {
        let current = PrimaryOptions::default();
        let merged = reconcile(&current, &json!({"strip": true, "root": "lib.wgsl"}));

        assert!(merged.strip);
        assert_eq!(merged.root, "lib.wgsl");
        assert_eq!(merged.imports, current.imports);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let current = PrimaryOptions::default();
        let merged = reconcile(&current, &json!({"__proto__": {}, "entrypoints": ["main"]}));
        assert_eq!(merged, current);
    }

    #[test]
    fn wrong_kinds_are_ignored() {
        let current = PrimaryOptions::default();
        let merged = reconcile(
            &current,
            &json!({"strip": "yes", "root": 7, "imports": null, "validate": [true]}),
        );
        assert_eq!(merged, current);
    }

    #[test]
    fn enum_field_accepts_known_variant_only() {
        let current = PrimaryOptions::default();

        let merged = reconcile(&current, &json!({"mangler": "hash"}));
        assert_eq!(merged.mangler, Mangler::Hash);

        let merged = reconcile(&current, &json!({"mangler": "rot13", "strip": true}));
        assert_eq!(merged.mangler, Mangler::Escape);
        assert!(merged.strip, "a bad field must not block good ones");
    }

    #[test]
    fn non_object_foreign_returns_current() {
        let current = AlternateOptions {
            mangler: AlternateMangler::None,
            ..AlternateOptions::default()
        };
        for foreign in [json!(null), json!(true), json!("x"), json!([1, 2])] {
            assert_eq!(reconcile(&current, &foreign), current);
        }
    }

    #[test]
    fn map_reconcile_follows_same_rules() {
        let current = as_map(json!({"a": true, "b": "x", "c": 1}));
        let merged = reconcile_map(&current, &json!({"a": false, "b": 2, "c": 5, "d": true}));
        assert_eq!(merged, as_map(json!({"a": false, "b": "x", "c": 5})));
    }

    #[test]
    fn parse_option_value_literals() {
        assert_eq!(parse_option_value("true"), json!(true));
        assert_eq!(parse_option_value("\"hash\""), json!("hash"));
        assert_eq!(parse_option_value("main.wgsl"), json!("main.wgsl"));
        assert_eq!(parse_option_value(""), json!(""));
    }

    fn foreign_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(2, 12, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-e]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn primitive_map() -> impl Strategy<Value = Map<String, Value>> {
        let primitive = prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        prop::collection::btree_map("[a-e]", primitive, 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    fn primary_foreign() -> impl Strategy<Value = Value> {
        let key = prop_oneof![
            Just("root"),
            Just("mangler"),
            Just("imports"),
            Just("condcomp"),
            Just("strip"),
            Just("lower"),
            Just("validate"),
            Just("eval"),
            Just("entrypoints"),
            Just("features"),
        ];
        let value = prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            prop_oneof![Just("escape"), Just("hash"), Just("none"), Just("zzz")]
                .prop_map(|s| Value::String(s.to_string())),
            "[a-z.]{0,8}".prop_map(Value::String),
            any::<i32>().prop_map(|n| json!(n)),
            Just(Value::Null),
        ];
        prop::collection::btree_map(key, value, 0..8).prop_map(|m| {
            Value::Object(m.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
        })
    }

    proptest! {
        #[test]
        fn map_keeps_key_set_and_kinds(current in primitive_map(), foreign in foreign_value()) {
            let merged = reconcile_map(&current, &foreign);

            prop_assert_eq!(
                merged.keys().collect::<Vec<_>>(),
                current.keys().collect::<Vec<_>>()
            );
            for (key, value) in &merged {
                prop_assert!(same_kind(value, &current[key]));
            }
        }

        #[test]
        fn map_reconcile_is_idempotent(current in primitive_map(), foreign in foreign_value()) {
            let once = reconcile_map(&current, &foreign);
            let twice = reconcile_map(&current, &Value::Object(once.clone()));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn typed_reconcile_keeps_schema(foreign in primary_foreign()) {
            let current = PrimaryOptions::default();
            let merged = reconcile(&current, &foreign);

            let before = as_map(serde_json::to_value(&current).unwrap());
            let after = as_map(serde_json::to_value(&merged).unwrap());
            prop_assert_eq!(
                after.keys().collect::<Vec<_>>(),
                before.keys().collect::<Vec<_>>()
            );
            for (key, value) in &after {
                prop_assert!(same_kind(value, &before[key]));
            }
        }

        #[test]
        fn typed_reconcile_is_idempotent(foreign in primary_foreign()) {
            let current = PrimaryOptions::default();
            let once = reconcile(&current, &foreign);
            let twice = reconcile(&current, &serde_json::to_value(&once).unwrap());
            prop_assert_eq!(once, twice);
        }
    }
}
