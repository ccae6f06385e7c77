//! Proptest strategies for the flat JSON objects trees are built from.

use proptest::prelude::*;
use serde_json::Value;

/// Any scalar a flat object's property may hold, plus small arrays.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::from(n)),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::String),
        prop::collection::vec("[a-z]{1,6}".prop_map(Value::String), 0..4)
            .prop_map(Value::Array),
    ]
}

/// Non-empty flat JSON object with unique keys, up to `max_props`
/// properties.
pub fn flat_object(max_props: usize) -> impl Strategy<Value = Value> {
    prop::collection::hash_map("[a-z][a-z0-9_]{0,11}", json_scalar(), 1..=max_props)
        .prop_map(|props| Value::Object(props.into_iter().collect()))
}
