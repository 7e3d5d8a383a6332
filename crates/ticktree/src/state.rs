//! Layered evaluation state.
//!
//! [`State`] is the caller-owned associative snapshot threaded by value
//! through every tick. Two reserved top-level regions layer on top of the
//! caller's own data:
//!
//! - **Working memory** (`"$wm"`): bindings scoped to one top-level `run`
//!   call. Installed on entry, stripped before the result is returned.
//! - **Node memory** (`"$nodes"`): per-node data keyed by stable node
//!   identity, persisting across evaluations. Stateful node types (e.g.
//!   `choose-each`) keep their bookkeeping here. The engine never evicts
//!   entries; the embedding application owns the state's lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compile::NodeId;

/// Reserved key of the working-memory region.
pub const WM: &str = "$wm";

/// Reserved key of the node-memory region.
pub const NODES: &str = "$nodes";

/// Caller-owned associative state threaded through every evaluation step.
///
/// Handlers take the state by value and return the next value in their
/// [`Tick`](crate::Tick); nothing is mutated behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Map<String, Value>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Stores a value under a top-level key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Removes a top-level key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Walks a key path through nested objects.
    ///
    /// Returns `None` as soon as a segment is absent or the value under a
    /// non-final segment is not an object.
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Installs working-memory bindings for one top-level evaluation.
    pub(crate) fn install_working(&mut self, bindings: Map<String, Value>) {
        self.0.insert(WM.to_string(), Value::Object(bindings));
    }

    /// Strips the working-memory region; it never escapes a `run` call.
    pub(crate) fn clear_working(&mut self) {
        self.0.remove(WM);
    }

    /// Returns the working-memory bindings of the evaluation in flight.
    pub fn working(&self) -> Option<&Map<String, Value>> {
        self.0.get(WM).and_then(Value::as_object)
    }

    /// Returns the persistent memory of the node with the given identity.
    pub fn node_memory(&self, id: NodeId) -> Option<&Value> {
        self.0.get(NODES)?.as_object()?.get(&id.to_string())
    }

    /// Stores the persistent memory of the node with the given identity,
    /// creating the region lazily.
    pub fn set_node_memory(&mut self, id: NodeId, value: Value) {
        let region = self
            .0
            .entry(NODES.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(entries) = region.as_object_mut() {
            entries.insert(id.to_string(), value);
        }
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwraps into the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for State {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_of(value: Value) -> State {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let state = state_of(json!({"agent": {"mood": "calm", "pos": {"x": 3}}}));

        let path = |segs: &[&str]| segs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(state.get_path(&path(&["agent", "mood"])), Some(&json!("calm")));
        assert_eq!(state.get_path(&path(&["agent", "pos", "x"])), Some(&json!(3)));
        assert_eq!(state.get_path(&path(&["agent", "missing"])), None);
        assert_eq!(state.get_path(&path(&["agent", "mood", "deeper"])), None);
        assert_eq!(state.get_path(&[]), None);
    }

    #[test]
    fn working_memory_installs_and_strips() {
        let mut state = State::new();
        let mut bindings = Map::new();
        bindings.insert("target".to_string(), json!("door"));

        state.install_working(bindings);
        assert_eq!(state.working().unwrap().get("target"), Some(&json!("door")));

        state.clear_working();
        assert!(state.working().is_none());
        assert!(state.get(WM).is_none());
    }

    #[test]
    fn node_memory_is_keyed_by_identity() {
        let mut state = State::new();
        assert!(state.node_memory(NodeId(7)).is_none());

        state.set_node_memory(NodeId(7), json!([1, 2]));
        state.set_node_memory(NodeId(9), json!("other"));

        assert_eq!(state.node_memory(NodeId(7)), Some(&json!([1, 2])));
        assert_eq!(state.node_memory(NodeId(9)), Some(&json!("other")));

        state.set_node_memory(NodeId(7), json!([2]));
        assert_eq!(state.node_memory(NodeId(7)), Some(&json!([2])));
    }
}
