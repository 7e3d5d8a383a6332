//! Tree compilation: raw literal → validated, identity-assigned tree.
//!
//! A literal is an array `[tag, config?, child*]`. Compilation walks it
//! depth-first (parent before children, children in order, which fixes the
//! identity assignment order deterministically), consults the registry for
//! each tag's validation specs, resolves deferred option references against
//! the caller's function table, and produces a [`CompiledNode`] ready for
//! repeated evaluation. Compilation is all-or-nothing: the first violation
//! aborts with a [`CompileError`] and no partial tree.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::CompileError;
use crate::options::{self, FnTable, ResolvedOptions};
use crate::registry::Registry;

/// Stable identity of a compiled node.
///
/// Assigned once at compile time, unique for the process lifetime as long
/// as all compilers draw from one shared [`IdSource`], and never reused.
/// This is the addressing key for persistent node memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared source of node identities.
///
/// An explicit counter object rather than global state: each compiler owns
/// one by default, and callers who need uniqueness across independently
/// constructed compilers share a single source by cloning the handle. The
/// counter is atomic, so concurrent compiles on separate threads are safe.
#[derive(Clone, Debug)]
pub struct IdSource {
    next: Arc<AtomicU64>,
}

impl IdSource {
    /// A fresh source starting at identity 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Draws the next identity.
    pub fn next(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Advances the counter past an explicitly supplied identity so later
    /// auto-assigned ones do not collide with it.
    pub fn observe(&self, id: NodeId) {
        self.next.fetch_max(id.0 + 1, Ordering::Relaxed);
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated, identity-assigned, option-resolved node, evaluated
/// repeatedly without further checks.
///
/// Serializable as long as no option is deferred; a deferred binding makes
/// serialization fail loudly rather than encode a stale value.
#[derive(Clone, Debug, Serialize)]
pub struct CompiledNode {
    tag: String,
    id: NodeId,
    options: ResolvedOptions,
    children: Vec<CompiledNode>,
}

impl CompiledNode {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn children(&self) -> &[CompiledNode] {
        &self.children
    }
}

/// Validates and prepares raw tree literals for repeated execution.
pub struct Compiler {
    registry: Arc<Registry>,
    ids: IdSource,
}

impl Compiler {
    /// A compiler with its own fresh identity source.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_ids(registry, IdSource::new())
    }

    /// A compiler drawing identities from a shared source, so uniqueness
    /// holds across every compiler constructed over it.
    pub fn with_ids(registry: Arc<Registry>, ids: IdSource) -> Self {
        Self { registry, ids }
    }

    /// The identity source this compiler draws from.
    pub fn ids(&self) -> &IdSource {
        &self.ids
    }

    /// Compiles a tree literal against the caller's function table.
    pub fn compile(&self, literal: &Value, funcs: &FnTable) -> Result<CompiledNode, CompileError> {
        let root = self.compile_node(literal, funcs)?;
        debug!(
            target: "ticktree::compile",
            tag = root.tag(),
            id = %root.id(),
            "compiled tree"
        );
        Ok(root)
    }

    fn compile_node(&self, literal: &Value, funcs: &FnTable) -> Result<CompiledNode, CompileError> {
        let items = literal
            .as_array()
            .ok_or_else(|| CompileError::malformed("node literal must be an array"))?;
        let tag = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| CompileError::malformed("node literal must start with a tag string"))?;
        if !self.registry.is_registered(tag) {
            return Err(CompileError::UnknownTag {
                tag: tag.to_string(),
            });
        }

        let (config, child_literals) = split_tail(&items[1..]);
        let options = match config {
            Some(config) => options::resolve(funcs, config, tag)?,
            None => ResolvedOptions::default(),
        };

        // An author-supplied identity is honored verbatim; auto-assignment
        // only fills the gap, and the counter skips past explicit ids.
        let id = match explicit_id(config, tag)? {
            Some(id) => {
                self.ids.observe(id);
                id
            }
            None => self.ids.next(),
        };

        for key in self.registry.required_options(tag) {
            if !options.contains(key) {
                return Err(CompileError::MissingOption {
                    tag: tag.to_string(),
                    id,
                    key: key.clone(),
                });
            }
        }

        let spec = self.registry.children(tag);
        if !spec.allows(child_literals.len()) {
            return Err(CompileError::ChildCount {
                tag: tag.to_string(),
                id,
                expected: spec,
                found: child_literals.len(),
            });
        }

        let children = child_literals
            .iter()
            .map(|child| self.compile_node(child, funcs))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(
            target: "ticktree::compile",
            tag,
            id = %id,
            children = children.len(),
            "compiled node"
        );
        Ok(CompiledNode {
            tag: tag.to_string(),
            id,
            options,
            children,
        })
    }
}

/// Splits a node's tail into an optional config object and child literals.
fn split_tail(tail: &[Value]) -> (Option<&Map<String, Value>>, &[Value]) {
    match tail.first().and_then(Value::as_object) {
        Some(config) => (Some(config), &tail[1..]),
        None => (None, tail),
    }
}

fn explicit_id(config: Option<&Map<String, Value>>, tag: &str) -> Result<Option<NodeId>, CompileError> {
    let Some(raw) = config.and_then(|config| config.get("id")) else {
        return Ok(None);
    };
    match raw.as_u64() {
        Some(id) if id > 0 => Ok(Some(NodeId(id))),
        _ => Err(CompileError::malformed(format!(
            "node `{tag}` has a non-positive-integer `id`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiler() -> Compiler {
        Compiler::new(Arc::new(Registry::with_builtins()))
    }

    fn ids_of(node: &CompiledNode) -> Vec<NodeId> {
        let mut out = vec![node.id()];
        for child in node.children() {
            out.extend(ids_of(child));
        }
        out
    }

    #[test]
    fn assigns_depth_first_identities() {
        let tree = compiler()
            .compile(
                &json!(["selector", ["sequence", ["success"], ["failure"]], ["success"]]),
                &FnTable::new(),
            )
            .unwrap();

        assert_eq!(
            ids_of(&tree),
            [1, 2, 3, 4, 5].map(NodeId).to_vec(),
        );
    }

    #[test]
    fn explicit_identities_are_never_overwritten() {
        let compiler = compiler();
        let literal = json!(["sequence", {"id": 40}, ["success", {"id": 41}]]);

        let first = compiler.compile(&literal, &FnTable::new()).unwrap();
        let second = compiler.compile(&literal, &FnTable::new()).unwrap();

        assert_eq!(ids_of(&first), ids_of(&second));
        assert_eq!(first.id(), NodeId(40));
        assert_eq!(first.children()[0].id(), NodeId(41));
    }

    #[test]
    fn auto_assignment_skips_past_explicit_identities() {
        let compiler = compiler();
        let tree = compiler
            .compile(
                &json!(["sequence", {"id": 10}, ["success"]]),
                &FnTable::new(),
            )
            .unwrap();

        assert_eq!(tree.children()[0].id(), NodeId(11));
    }

    #[test]
    fn shared_id_source_keeps_identities_unique_across_compilers() {
        let registry = Arc::new(Registry::with_builtins());
        let ids = IdSource::new();
        let first = Compiler::with_ids(Arc::clone(&registry), ids.clone());
        let second = Compiler::with_ids(registry, ids);

        let a = first.compile(&json!(["success"]), &FnTable::new()).unwrap();
        let b = second.compile(&json!(["success"]), &FnTable::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rejects_malformed_literals() {
        let compiler = compiler();
        for literal in [json!({"tag": "sequence"}), json!([]), json!([42, ["success"]])] {
            assert!(matches!(
                compiler.compile(&literal, &FnTable::new()),
                Err(CompileError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn rejects_unknown_tags() {
        let err = compiler()
            .compile(&json!(["warp-drive"]), &FnTable::new())
            .unwrap_err();
        assert!(matches!(err, CompileError::UnknownTag { tag } if tag == "warp-drive"));
    }

    #[test]
    fn rejects_missing_required_options() {
        let err = compiler()
            .compile(&json!(["loop", ["success"]]), &FnTable::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingOption { tag, key, .. } if tag == "loop" && key == "count"
        ));
    }

    #[test]
    fn rejects_child_count_violations() {
        let compiler = compiler();
        for literal in [
            json!(["sequence"]),
            json!(["loop", {"count": 1}, ["success"], ["success"]]),
            json!(["randomly", {"p": 0.5}, ["success"], ["success"], ["success"]]),
            json!(["success", ["success"]]),
        ] {
            assert!(matches!(
                compiler.compile(&literal, &FnTable::new()),
                Err(CompileError::ChildCount { .. })
            ));
        }
    }

    #[test]
    fn failure_inside_a_child_aborts_the_whole_compile() {
        let err = compiler()
            .compile(
                &json!(["sequence", ["success"], ["no-such-tag"]]),
                &FnTable::new(),
            )
            .unwrap_err();
        assert!(matches!(err, CompileError::UnknownTag { .. }));
    }

    #[test]
    fn compiled_tree_without_deferred_options_serializes() {
        let tree = compiler()
            .compile(&json!(["loop", {"count": 2}, ["success"]]), &FnTable::new())
            .unwrap();
        let encoded = serde_json::to_value(&tree).unwrap();
        assert_eq!(encoded["tag"], json!("loop"));
        assert_eq!(encoded["options"]["count"], json!(2));
    }
}
