//! Data-driven behavior tree engine.
//!
//! Trees are authored as JSON-shaped literals (`[tag, config?, child*]`),
//! compiled once into an immutable [`CompiledNode`] tree, then evaluated
//! repeatedly against a caller-owned [`State`] snapshot. Every evaluation
//! returns a [`Tick`]: a [`Status`] plus the next state value.
//!
//! - **Open dispatch**: every node tag, built-in or caller-defined, resolves
//!   through the same [`Registry`] of handlers and validation specs
//! - **Value-threaded state**: handlers never mutate a caller-visible
//!   snapshot in place; each returns the state the next node observes
//! - **Deferred options**: config values can bind to per-tick function calls
//!   or state lookups, re-evaluated against the current state before every
//!   dispatch
//! - **Stable identities**: each compiled node gets a process-wide-unique id,
//!   the addressing key for memory that persists across evaluations
//!
//! # Architecture
//!
//! - [`Registry`]: tag → {tick handler, required options, children spec}
//! - [`Compiler`]: validates a literal, resolves options, assigns identities
//! - [`Engine`]: dispatches tags depth-first, threading state in child order
//! - [`State`]: caller-owned map with working-memory and node-memory regions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use ticktree::{Compiler, Engine, FnTable, Registry, State, Status};
//!
//! let registry = Arc::new(Registry::with_builtins());
//! let compiler = Compiler::new(Arc::clone(&registry));
//! let engine = Engine::new(registry);
//!
//! let tree = compiler
//!     .compile(&json!(["selector", ["failure"], ["success"]]), &FnTable::new())
//!     .unwrap();
//! let tick = engine.run(State::new(), &tree).unwrap();
//! assert_eq!(tick.status, Status::Success);
//! ```

pub mod compile;
pub mod engine;
pub mod error;
pub mod nodes;
pub mod options;
pub mod registry;
pub mod sampler;
pub mod state;
pub mod status;

// Re-export core types for ergonomic API
pub use compile::{CompiledNode, Compiler, IdSource, NodeId};
pub use engine::{Engine, TickOptions};
pub use error::{CompileError, EngineError};
pub use options::{Binding, FnTable, OptionValue, ResolvedOptions};
pub use registry::{ChildSpec, Registry, TickHandler};
pub use sampler::{Sampler, SeededSampler, ThreadSampler};
pub use state::State;
pub use status::{Status, Tick};
