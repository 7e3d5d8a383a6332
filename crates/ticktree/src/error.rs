//! Error types for compilation and evaluation.
//!
//! Compile and dispatch failures are structured errors carrying the
//! offending node; they are never silently swallowed. Domain-level
//! negative outcomes are not errors at all — they travel as
//! [`Status`](crate::Status) values.

use crate::compile::NodeId;
use crate::registry::ChildSpec;

/// Errors produced while compiling a tree literal.
///
/// Compilation is all-or-nothing: the first violation aborts with no
/// partial result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error("malformed node literal: {reason}")]
    Malformed { reason: String },

    #[error("unknown node tag `{tag}`")]
    UnknownTag { tag: String },

    #[error("node `{tag}` (id {id}) is missing required option `{key}`")]
    MissingOption { tag: String, id: NodeId, key: String },

    #[error("node `{tag}` references unknown function `{func}`")]
    UnknownFunction { tag: String, func: String },

    #[error("node `{tag}` (id {id}) takes {expected} children, found {found}")]
    ChildCount {
        tag: String,
        id: NodeId,
        expected: ChildSpec,
        found: usize,
    },
}

impl CompileError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CompileError::Malformed {
            reason: reason.into(),
        }
    }
}

/// Errors produced while evaluating a compiled tree.
///
/// Fatal to the enclosing run; a failed node is a [`Status`](crate::Status),
/// not one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("no handler registered for tag `{tag}` (id {id})")]
    UnregisteredTag { tag: String, id: NodeId },

    #[error("node `{tag}` (id {id}) is missing option `{key}`")]
    MissingOption { tag: String, id: NodeId, key: String },

    #[error("node `{tag}` (id {id}): option `{key}` must be {expected}")]
    InvalidOption {
        tag: String,
        id: NodeId,
        key: String,
        expected: &'static str,
    },
}
