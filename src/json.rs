//! JSON encoding of [`Value`]s.
//!
//! Plain JSON covers most values. Three single-key objects carry what JSON cannot:
//! - `{"__tuple__": [...]}` for tuples,
//! - `{"__float__": "nan"}` (or `"inf"`, `"-inf"`) for non-finite floats,
//! - `{"__repr__": "..."}` for objects without a JSON form (decoded as their repr string).
//!
//! Lesson files and the Python call protocol both use this encoding.

use std::collections::BTreeMap;

use autograde_core::Value;
use serde_json::{Map, Number, Value as Json};

const TUPLE_KEY: &str = "__tuple__";
const FLOAT_KEY: &str = "__float__";
const REPR_KEY: &str = "__repr__";

/// Decode a JSON value.
pub fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => number_value(&n),
        Json::String(s) => Value::Str(s),
        Json::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        Json::Object(map) => object_value(map),
    }
}

fn number_value(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn object_value(mut map: Map<String, Json>) -> Value {
    if map.len() == 1 {
        if let Some(Json::Array(items)) = map.get(TUPLE_KEY) {
            return Value::Tuple(items.iter().cloned().map(from_json).collect());
        }
        if let Some(Json::String(text)) = map.get(FLOAT_KEY) {
            return Value::Float(parse_special_float(text));
        }
        if let Some(Json::String(_)) = map.get(REPR_KEY) {
            if let Some(Json::String(text)) = map.remove(REPR_KEY) {
                return Value::Str(text);
            }
        }
    }
    Value::Dict(map.into_iter().map(|(k, v)| (k, from_json(v))).collect::<BTreeMap<_, _>>())
}

fn parse_special_float(text: &str) -> f64 {
    match text {
        "inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        other => other.parse().unwrap_or(f64::NAN),
    }
}

/// Encode a value as JSON.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(x) => match Number::from_f64(*x) {
            Some(n) => Json::Number(n),
            None => single(FLOAT_KEY, Json::String(value.to_string())),
        },
        Value::Str(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Tuple(items) => single(TUPLE_KEY, Json::Array(items.iter().map(to_json).collect())),
        Value::Dict(map) => Json::Object(map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect()),
    }
}

fn single(key: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Json::Object(map)
}
