//! Node type registry: the engine's sole polymorphism mechanism.
//!
//! A symbolic tag maps to three independently registered facets: a tick
//! handler, a list of required option keys, and a child-count spec. The
//! built-in vocabulary is installed through the same public interface
//! caller extensions use, so built-ins and extensions are indistinguishable
//! to the compiler and the engine.
//!
//! Registration must complete before a tree using a tag is compiled or
//! evaluated; both consumers take the registry behind an `Arc` and never
//! mutate it afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::compile::CompiledNode;
use crate::engine::{Engine, TickOptions};
use crate::error::EngineError;
use crate::state::State;
use crate::status::Tick;

/// Handler invoked when a node with the matching tag is ticked.
///
/// Receives the engine (for ticking children), the current state by value,
/// the node itself, and the node's options materialized against the current
/// state. Returns the status and the next state; it must not retain a state
/// reference beyond the tick it returns.
pub type TickHandler = Arc<
    dyn Fn(&Engine, State, &CompiledNode, &TickOptions) -> Result<Tick, EngineError> + Send + Sync,
>;

/// Child-count policy, validated at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildSpec {
    /// Exactly this many children.
    Exactly(usize),
    /// Any count out of the listed ones.
    OneOf(Vec<usize>),
    /// One or more children.
    AtLeastOne,
    /// Any count, including zero.
    Any,
}

impl ChildSpec {
    pub fn allows(&self, count: usize) -> bool {
        match self {
            ChildSpec::Exactly(n) => count == *n,
            ChildSpec::OneOf(choices) => choices.contains(&count),
            ChildSpec::AtLeastOne => count >= 1,
            ChildSpec::Any => true,
        }
    }
}

impl fmt::Display for ChildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildSpec::Exactly(n) => write!(f, "exactly {n}"),
            ChildSpec::OneOf(choices) => {
                let listed: Vec<String> = choices.iter().map(usize::to_string).collect();
                write!(f, "one of {}", listed.join("/"))
            }
            ChildSpec::AtLeastOne => write!(f, "at least one"),
            ChildSpec::Any => write!(f, "any number of"),
        }
    }
}

/// Mapping from symbolic tag to tick handler and validation specs.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, TickHandler>,
    required_options: HashMap<String, Vec<String>>,
    children: HashMap<String, ChildSpec>,
}

impl Registry {
    /// An empty registry with no vocabulary at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in control vocabulary.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::nodes::install(&mut registry);
        registry
    }

    /// Registers the tick handler for a tag. A tag without a handler cannot
    /// be compiled or dispatched.
    pub fn set_handler<F>(&mut self, tag: impl Into<String>, handler: F)
    where
        F: Fn(&Engine, State, &CompiledNode, &TickOptions) -> Result<Tick, EngineError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(tag.into(), Arc::new(handler));
    }

    /// Registers the option keys that must be present on every compiled node
    /// with this tag. Defaults to none.
    pub fn set_required_options(&mut self, tag: impl Into<String>, keys: &[&str]) {
        self.required_options
            .insert(tag.into(), keys.iter().map(|key| key.to_string()).collect());
    }

    /// Registers the child-count spec for a tag. Defaults to
    /// [`ChildSpec::Exactly`]`(0)`.
    pub fn set_children(&mut self, tag: impl Into<String>, spec: ChildSpec) {
        self.children.insert(tag.into(), spec);
    }

    /// The tick handler for a tag, if one is registered.
    pub fn handler(&self, tag: &str) -> Option<&TickHandler> {
        self.handlers.get(tag)
    }

    /// Whether a tag has a handler and can therefore be compiled and ticked.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// The required option keys for a tag.
    pub fn required_options(&self, tag: &str) -> &[String] {
        self.required_options
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The child-count spec for a tag.
    pub fn children(&self, tag: &str) -> ChildSpec {
        self.children
            .get(tag)
            .cloned()
            .unwrap_or(ChildSpec::Exactly(0))
    }

    /// All tags with a registered handler.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_specs_validate_counts() {
        assert!(ChildSpec::Exactly(0).allows(0));
        assert!(!ChildSpec::Exactly(0).allows(1));
        assert!(ChildSpec::OneOf(vec![1, 2]).allows(2));
        assert!(!ChildSpec::OneOf(vec![1, 2]).allows(3));
        assert!(ChildSpec::AtLeastOne.allows(1));
        assert!(!ChildSpec::AtLeastOne.allows(0));
        assert!(ChildSpec::Any.allows(0));
    }

    #[test]
    fn unregistered_tags_fall_back_to_defaults() {
        let registry = Registry::new();
        assert!(!registry.is_registered("nope"));
        assert!(registry.required_options("nope").is_empty());
        assert_eq!(registry.children("nope"), ChildSpec::Exactly(0));
    }

    #[test]
    fn builtins_and_extensions_register_identically() {
        let mut registry = Registry::with_builtins();
        assert!(registry.is_registered("sequence"));
        assert!(!registry.is_registered("speak!"));

        registry.set_handler("speak!", |_, state, _, _| Ok(Tick::success(state)));
        registry.set_required_options("speak!", &["text"]);
        assert!(registry.is_registered("speak!"));
        assert_eq!(registry.required_options("speak!"), ["text".to_string()]);
    }
}
