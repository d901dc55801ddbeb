use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value};

/// True when every key in `keys` is present in `map`. Duplicate keys are
/// checked once.
pub fn keys_exist<K: AsRef<str>>(keys: &[K], map: &Map<String, Value>) -> bool {
    keys.iter().all(|k| map.contains_key(k.as_ref()))
}

/// True when at least one element (array) or value (object) is itself an
/// array or object. Scalars are never multi-dimensional.
pub fn is_multi_dimensional(value: &Value) -> bool {
    let nested = |v: &Value| v.is_array() || v.is_object();
    match value {
        Value::Array(items) => items.iter().any(nested),
        Value::Object(fields) => fields.values().any(nested),
        _ => false,
    }
}

/// The same key/value pairs in a uniformly random order.
pub fn shuffle_entries<R: Rng + ?Sized>(map: Map<String, Value>, rng: &mut R) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.shuffle(rng);
    entries.into_iter().collect()
}
