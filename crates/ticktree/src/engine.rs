//! Tree evaluation: tag dispatch and state threading.
//!
//! Evaluation is single-threaded, synchronous, and depth-first recursive.
//! Nothing suspends or yields; one top-level [`Engine::run`] runs to
//! completion on the calling thread. Boundedness is the tree author's
//! responsibility (via loop counts).
//!
//! Before each dispatch the engine re-evaluates the node's deferred option
//! bindings against the *current* state, so per-tick calls and state
//! lookups always reflect the latest context rather than a compile-time
//! snapshot.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::compile::{CompiledNode, NodeId};
use crate::error::EngineError;
use crate::options::OptionValue;
use crate::registry::Registry;
use crate::sampler::{Sampler, ThreadSampler};
use crate::state::State;
use crate::status::Tick;

/// A node's options materialized against the current state for one
/// dispatch, with typed accessors that fail as structured errors.
#[derive(Debug)]
pub struct TickOptions {
    tag: String,
    id: NodeId,
    values: Map<String, Value>,
}

impl TickOptions {
    pub(crate) fn for_node(node: &CompiledNode, state: &State) -> Self {
        let mut values = Map::new();
        for (key, option) in node.options().iter() {
            let concrete = match option {
                OptionValue::Concrete(value) => value.clone(),
                OptionValue::Deferred(binding) => binding.eval(state),
            };
            values.insert(key.to_string(), concrete);
        }
        Self {
            tag: node.tag().to_string(),
            id: node.id(),
            values,
        }
    }

    /// The option value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The option value under `key`, required.
    pub fn value(&self, key: &str) -> Result<&Value, EngineError> {
        self.values.get(key).ok_or_else(|| self.missing(key))
    }

    /// A required numeric option.
    pub fn float(&self, key: &str) -> Result<f64, EngineError> {
        self.value(key)?
            .as_f64()
            .ok_or_else(|| self.invalid(key, "a number"))
    }

    /// A required integer option.
    pub fn integer(&self, key: &str) -> Result<i64, EngineError> {
        self.value(key)?
            .as_i64()
            .ok_or_else(|| self.invalid(key, "an integer"))
    }

    /// A required boolean option.
    pub fn boolean(&self, key: &str) -> Result<bool, EngineError> {
        self.value(key)?
            .as_bool()
            .ok_or_else(|| self.invalid(key, "a boolean"))
    }

    /// A required string option.
    pub fn string(&self, key: &str) -> Result<&str, EngineError> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| self.invalid(key, "a string"))
    }

    /// A structured error for an option that is present but unusable.
    pub fn invalid(&self, key: &str, expected: &'static str) -> EngineError {
        EngineError::InvalidOption {
            tag: self.tag.clone(),
            id: self.id,
            key: key.to_string(),
            expected,
        }
    }

    fn missing(&self, key: &str) -> EngineError {
        EngineError::MissingOption {
            tag: self.tag.clone(),
            id: self.id,
            key: key.to_string(),
        }
    }
}

/// Evaluates compiled trees by dispatching each node's tag through the
/// registry.
pub struct Engine {
    registry: Arc<Registry>,
    sampler: Box<dyn Sampler>,
}

impl Engine {
    /// An engine drawing random samples from the thread-local generator.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_sampler(registry, ThreadSampler)
    }

    /// An engine with an injected sampler, for deterministic evaluation.
    pub fn with_sampler(registry: Arc<Registry>, sampler: impl Sampler + 'static) -> Self {
        Self {
            registry,
            sampler: Box::new(sampler),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The sampler stochastic nodes draw from.
    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    /// Runs one top-level evaluation with no working-memory bindings.
    pub fn run(&self, state: State, tree: &CompiledNode) -> Result<Tick, EngineError> {
        self.run_with(state, tree, Map::new())
    }

    /// Runs one top-level evaluation.
    ///
    /// `bindings` are installed into working memory for the duration of the
    /// call and stripped from the returned state; working memory never
    /// escapes one `run`.
    pub fn run_with(
        &self,
        mut state: State,
        tree: &CompiledNode,
        bindings: Map<String, Value>,
    ) -> Result<Tick, EngineError> {
        state.install_working(bindings);
        let mut tick = self.tick(state, tree)?;
        tick.state.clear_working();
        debug!(
            target: "ticktree::engine",
            root = %tree.id(),
            status = ?tick.status,
            "run complete"
        );
        Ok(tick)
    }

    /// Ticks a single node: materializes its deferred options against the
    /// current state, then dispatches its tag's handler.
    ///
    /// Control handlers call back into this for their children, threading
    /// state strictly in child order.
    pub fn tick(&self, state: State, node: &CompiledNode) -> Result<Tick, EngineError> {
        let Some(handler) = self.registry.handler(node.tag()) else {
            return Err(EngineError::UnregisteredTag {
                tag: node.tag().to_string(),
                id: node.id(),
            });
        };
        let opts = TickOptions::for_node(node, &state);
        trace!(target: "ticktree::engine", tag = node.tag(), id = %node.id(), "tick");
        handler(self, state, node, &opts)
    }
}
