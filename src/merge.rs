use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Shallow-merge persisted state over initial state.
///
/// When both values are JSON objects, the result holds every key of
/// `initial`, with same-named keys taken from `persisted`. Otherwise
/// `persisted` replaces `initial` outright. Nested objects are not merged.
///
/// # Examples
///
/// ```
/// use persiststate::merge_state;
/// use serde_json::json;
///
/// let merged = merge_state(&json!({"a": 1, "b": 2}), &json!({"b": 3, "c": 4}));
/// assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
///
/// assert_eq!(merge_state(&json!({"a": 1}), &json!(5)), json!(5));
/// ```
pub fn merge_state(initial: &Value, persisted: &Value) -> Value {
    match (initial, persisted) {
        (Value::Object(initial), Value::Object(persisted)) => {
            let mut merged = initial.clone();
            for (key, value) in persisted {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => persisted.clone(),
    }
}

/// Combines the application's initial state with rehydrated state.
///
/// Implementations must be pure. Any `Fn(S, S) -> S` is a `Merge<S>`, so an
/// application with a typed state usually passes a closure that knows its
/// own shape.
pub trait Merge<S> {
    fn merge(&self, initial: S, persisted: S) -> S;
}

impl<S, F> Merge<S> for F
where
    F: Fn(S, S) -> S,
{
    fn merge(&self, initial: S, persisted: S) -> S {
        self(initial, persisted)
    }
}

/// Structural fallback merge for any serde-representable state.
///
/// Both states are converted to [`serde_json::Value`], merged with
/// [`merge_state`], and converted back. If either side is not an object, or
/// the merged object does not deserialize into `S`, the persisted state wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl<S> Merge<S> for ShallowMerge
where
    S: Serialize + DeserializeOwned,
{
    fn merge(&self, initial: S, persisted: S) -> S {
        let (initial_value, persisted_value) =
            match (serde_json::to_value(&initial), serde_json::to_value(&persisted)) {
                (Ok(i), Ok(p)) => (i, p),
                (Err(e), _) | (_, Err(e)) => {
                    log::warn!(
                        "persiststate: cannot merge state structurally ({e}), using persisted state"
                    );
                    return persisted;
                }
            };

        if !(initial_value.is_object() && persisted_value.is_object()) {
            return persisted;
        }

        match serde_json::from_value(merge_state(&initial_value, &persisted_value)) {
            Ok(merged) => merged,
            Err(e) => {
                log::warn!(
                    "persiststate: merged state does not fit its type ({e}), using persisted state"
                );
                persisted
            }
        }
    }
}
