//! Decorator control nodes.
//!
//! Decorators wrap a single child and reshape its result or repeat its
//! execution. Child presence is guaranteed by the compile-time children
//! spec (`Exactly(1)` for every tag here).

use crate::compile::CompiledNode;
use crate::engine::{Engine, TickOptions};
use crate::error::EngineError;
use crate::registry::{ChildSpec, Registry};
use crate::state::State;
use crate::status::Tick;

pub(crate) fn install(registry: &mut Registry) {
    registry.set_handler("loop", loop_);
    registry.set_children("loop", ChildSpec::Exactly(1));
    registry.set_required_options("loop", &["count"]);

    registry.set_handler("loop-until-success", loop_until_success);
    registry.set_children("loop-until-success", ChildSpec::Exactly(1));
    registry.set_required_options("loop-until-success", &["count"]);

    registry.set_handler("always", always);
    registry.set_children("always", ChildSpec::Exactly(1));

    registry.set_handler("never", never);
    registry.set_children("never", ChildSpec::Exactly(1));

    registry.set_handler("invert", invert);
    registry.set_children("invert", ChildSpec::Exactly(1));
}

/// Ticks the child exactly `count` times, aborting on the first failed
/// result and propagating it; succeeds after `count` consecutive successes.
///
/// With `loop-until-success`, this is the vocabulary for retry-like
/// behavior; there is no implicit retry anywhere else.
pub fn loop_(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let count = opts.integer("count")?;
    let child = &node.children()[0];
    let mut state = state;
    for _ in 0..count {
        let tick = engine.tick(state, child)?;
        if tick.status.failed() {
            return Ok(tick);
        }
        state = tick.state;
    }
    Ok(Tick::success(state))
}

/// Ticks the child up to `count` times, returning the first succeeded
/// result unchanged; fails after `count` unsuccessful attempts.
pub fn loop_until_success(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let count = opts.integer("count")?;
    let child = &node.children()[0];
    let mut state = state;
    for _ in 0..count {
        let tick = engine.tick(state, child)?;
        if tick.status.succeeded() {
            return Ok(tick);
        }
        state = tick.state;
    }
    Ok(Tick::failure(state))
}

/// Ticks the child, discards its status, succeeds.
pub fn always(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let tick = engine.tick(state, &node.children()[0])?;
    Ok(Tick::success(tick.state))
}

/// Ticks the child, discards its status, fails.
pub fn never(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let tick = engine.tick(state, &node.children()[0])?;
    Ok(Tick::failure(tick.state))
}

/// Ticks the child and swaps success and failure; in-progress and error
/// results pass through unchanged.
pub fn invert(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let tick = engine.tick(state, &node.children()[0])?;
    Ok(Tick::new(tick.status.invert(), tick.state))
}
