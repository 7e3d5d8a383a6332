//! Option values and deferred-reference resolution.
//!
//! A node's config object may contain deferred references: array values
//! whose first element is one of the reserved markers below. [`resolve`]
//! classifies each config entry at compile time:
//!
//! - `["$call", fnId, arg*]` invokes the named function immediately and
//!   stores its return value. The binding is not re-derivable afterwards;
//!   this trades dynamism for a serializable tree.
//! - `["$fn", fnId, arg*]` binds the option to re-invoke the named function
//!   with the fixed arguments on every evaluation.
//! - `["$get", seg+]` binds the option to read a fixed key path out of the
//!   current state on every evaluation.
//!
//! Everything else is kept as a concrete literal. A resolved option is
//! represented explicitly as [`OptionValue::Concrete`] or
//! [`OptionValue::Deferred`] so serialization code can detect closures and
//! reject them deliberately instead of encoding something stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::state::State;

/// Marker for a compile-time function call.
pub const CALL: &str = "$call";

/// Marker for a per-tick function call.
pub const FN: &str = "$fn";

/// Marker for a per-tick state lookup.
pub const GET: &str = "$get";

/// A callable installed in a [`FnTable`].
pub type OptionFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Caller-supplied table mapping function ids to callables.
///
/// Supplied once to [`Compiler::compile`](crate::Compiler::compile); deferred
/// call references resolve against it.
#[derive(Clone, Default)]
pub struct FnTable {
    funcs: HashMap<String, OptionFn>,
}

impl FnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a function under the given id.
    pub fn insert<F>(&mut self, id: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.funcs.insert(id.into(), Arc::new(func));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<F>(mut self, id: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.insert(id, func);
        self
    }

    pub fn get(&self, id: &str) -> Option<&OptionFn> {
        self.funcs.get(id)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FnTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// A per-tick binding captured at compile time and re-evaluated against the
/// current state before every dispatch.
#[derive(Clone)]
pub enum Binding {
    /// Re-invoke a named function with fixed arguments.
    Call {
        id: String,
        func: OptionFn,
        args: Vec<Value>,
    },
    /// Read a fixed key path out of the current state.
    Lookup { path: Vec<String> },
}

impl Binding {
    /// Evaluates the binding. A lookup that misses yields `Null`.
    pub fn eval(&self, state: &State) -> Value {
        match self {
            Binding::Call { func, args, .. } => func(args),
            Binding::Lookup { path } => state.get_path(path).cloned().unwrap_or(Value::Null),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Call { id, args, .. } => {
                f.debug_struct("Call").field("id", id).field("args", args).finish()
            }
            Binding::Lookup { path } => f.debug_struct("Lookup").field("path", path).finish(),
        }
    }
}

/// A resolved option: either a value fixed at compile time or a deferred
/// binding re-evaluated before every dispatch.
#[derive(Clone, Debug)]
pub enum OptionValue {
    Concrete(Value),
    Deferred(Binding),
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Concrete(value) => value.serialize(serializer),
            OptionValue::Deferred(binding) => Err(S::Error::custom(format!(
                "deferred option {binding:?} cannot be serialized"
            ))),
        }
    }
}

/// The resolved configuration of a compiled node.
#[derive(Clone, Debug, Default)]
pub struct ResolvedOptions {
    entries: HashMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl Serialize for ResolvedOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Resolves a raw config object into [`ResolvedOptions`], classifying
/// deferred references and invoking immediate calls.
pub(crate) fn resolve(
    funcs: &FnTable,
    config: &Map<String, Value>,
    tag: &str,
) -> Result<ResolvedOptions, CompileError> {
    let mut entries = HashMap::with_capacity(config.len());
    for (key, raw) in config {
        entries.insert(key.clone(), classify(funcs, tag, raw)?);
    }
    Ok(ResolvedOptions { entries })
}

/// A value is deferred iff it is an array of two or more elements whose
/// first element is a reserved marker; everything else stays concrete.
fn classify(funcs: &FnTable, tag: &str, raw: &Value) -> Result<OptionValue, CompileError> {
    let Some(items) = raw.as_array() else {
        return Ok(OptionValue::Concrete(raw.clone()));
    };
    if items.len() < 2 {
        return Ok(OptionValue::Concrete(raw.clone()));
    }
    match items[0].as_str() {
        Some(CALL) => {
            let (_, func, args) = call_parts(funcs, tag, items)?;
            Ok(OptionValue::Concrete(func(&args)))
        }
        Some(FN) => {
            let (id, func, args) = call_parts(funcs, tag, items)?;
            Ok(OptionValue::Deferred(Binding::Call { id, func, args }))
        }
        Some(GET) => {
            let path = items[1..]
                .iter()
                .map(|segment| {
                    segment.as_str().map(str::to_string).ok_or_else(|| {
                        CompileError::malformed(format!(
                            "state lookup in node `{tag}` has a non-string path segment"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(OptionValue::Deferred(Binding::Lookup { path }))
        }
        _ => Ok(OptionValue::Concrete(raw.clone())),
    }
}

fn call_parts(
    funcs: &FnTable,
    tag: &str,
    items: &[Value],
) -> Result<(String, OptionFn, Vec<Value>), CompileError> {
    let id = items[1].as_str().ok_or_else(|| {
        CompileError::malformed(format!(
            "function reference in node `{tag}` must name its function with a string"
        ))
    })?;
    let func = funcs.get(id).ok_or_else(|| CompileError::UnknownFunction {
        tag: tag.to_string(),
        func: id.to_string(),
    })?;
    Ok((id.to_string(), Arc::clone(func), items[2..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn plain_values_stay_concrete() {
        let resolved = resolve(
            &FnTable::new(),
            &config(json!({"count": 3, "tags": [1, 2, 3], "short": ["x"]})),
            "loop",
        )
        .unwrap();

        for key in ["count", "tags", "short"] {
            assert!(matches!(resolved.get(key), Some(OptionValue::Concrete(_))));
        }
    }

    #[test]
    fn immediate_call_resolves_at_compile_time() {
        let funcs = FnTable::new().with("answer", |args: &[Value]| {
            json!(args[0].as_i64().unwrap() * 2)
        });
        let resolved = resolve(&funcs, &config(json!({"val": ["$call", "answer", 21]})), "t").unwrap();

        match resolved.get("val").unwrap() {
            OptionValue::Concrete(value) => assert_eq!(value, &json!(42)),
            other => panic!("expected concrete value, got {other:?}"),
        }
    }

    #[test]
    fn per_tick_call_defers_to_evaluation() {
        let funcs = FnTable::new().with("now", |_: &[Value]| json!(99));
        let resolved = resolve(&funcs, &config(json!({"val": ["$fn", "now"]})), "t").unwrap();

        match resolved.get("val").unwrap() {
            OptionValue::Deferred(binding) => {
                assert_eq!(binding.eval(&State::new()), json!(99));
            }
            other => panic!("expected deferred binding, got {other:?}"),
        }
    }

    #[test]
    fn state_lookup_reads_current_state() {
        let resolved = resolve(
            &FnTable::new(),
            &config(json!({"val": ["$get", "agent", "mood"]})),
            "t",
        )
        .unwrap();

        let state: State = serde_json::from_value(json!({"agent": {"mood": "calm"}})).unwrap();
        match resolved.get("val").unwrap() {
            OptionValue::Deferred(binding) => {
                assert_eq!(binding.eval(&state), json!("calm"));
                assert_eq!(binding.eval(&State::new()), Value::Null);
            }
            other => panic!("expected deferred binding, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_id_fails_naming_both_sides() {
        let err = resolve(
            &FnTable::new(),
            &config(json!({"val": ["$fn", "missing"]})),
            "test?",
        )
        .unwrap_err();

        match err {
            CompileError::UnknownFunction { tag, func } => {
                assert_eq!(tag, "test?");
                assert_eq!(func, "missing");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn deferred_options_refuse_serialization() {
        let funcs = FnTable::new().with("now", |_: &[Value]| json!(1));
        let resolved = resolve(&funcs, &config(json!({"val": ["$fn", "now"]})), "t").unwrap();
        assert!(serde_json::to_string(&resolved).is_err());

        let concrete = resolve(&funcs, &config(json!({"val": ["$call", "now"]})), "t").unwrap();
        assert!(serde_json::to_string(&concrete).is_ok());
    }
}
