//! Status and tick results returned by behavior nodes.

use serde::{Deserialize, Serialize};

use crate::state::State;

/// The result of evaluating a behavior node.
///
/// `Failure` and `Error` are first-class outcomes, not exceptions: expected
/// negative results are encoded as `Failure`, while `Error` is reserved for
/// conditions severe enough that continuing the evaluation is meaningless.
/// No built-in node produces `Error`; leaf behaviors may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// The behavior completed successfully.
    Success,

    /// The behavior failed.
    Failure,

    /// The behavior has not finished yet.
    ///
    /// Reserved for multi-tick suspension. Control nodes propagate it per
    /// their scan rules (it interrupts a sequence or selector scan the way
    /// a success does), but resuming a previously-running node on a later
    /// top-level evaluation is not implemented.
    Running,

    /// The behavior hit an unrecoverable condition.
    Error,
}

impl Status {
    /// Returns `true` for `Success` and `Running`.
    ///
    /// Control nodes treat an in-progress child as having succeeded so far.
    #[inline]
    pub fn succeeded(self) -> bool {
        matches!(self, Status::Success | Status::Running)
    }

    /// Returns `true` for `Failure` and `Error`.
    #[inline]
    pub fn failed(self) -> bool {
        !self.succeeded()
    }

    /// Returns `true` if the behavior has not finished yet.
    #[inline]
    pub fn in_progress(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Swaps `Success` and `Failure`; `Running` and `Error` pass through
    /// unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

/// Outcome of one evaluation pass: a status plus the state the next
/// observer sees.
///
/// Handlers thread state by value; the state carried here is exactly the
/// value the ticked node returned, and a parent must hand it to the next
/// child unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub status: Status,
    pub state: State,
}

impl Tick {
    pub fn new(status: Status, state: State) -> Self {
        Self { status, state }
    }

    /// Shorthand for a successful tick.
    pub fn success(state: State) -> Self {
        Self::new(Status::Success, state)
    }

    /// Shorthand for a failed tick.
    pub fn failure(state: State) -> Self {
        Self::new(Status::Failure, state)
    }
}
