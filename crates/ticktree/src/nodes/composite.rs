//! Composite control nodes.
//!
//! Composites drive multiple children, threading state strictly in child
//! order: the state a child returns is exactly the state the next child
//! observes.

use crate::compile::CompiledNode;
use crate::engine::{Engine, TickOptions};
use crate::error::EngineError;
use crate::registry::{ChildSpec, Registry};
use crate::state::State;
use crate::status::{Status, Tick};

pub(crate) fn install(registry: &mut Registry) {
    registry.set_handler("sequence", sequence);
    registry.set_children("sequence", ChildSpec::AtLeastOne);

    registry.set_handler("selector", selector);
    registry.set_children("selector", ChildSpec::AtLeastOne);

    registry.set_handler("selector-p", selector_p);
    registry.set_children("selector-p", ChildSpec::AtLeastOne);
    registry.set_required_options("selector-p", &["p"]);

    registry.set_handler("parallel", parallel);
    registry.set_children("parallel", ChildSpec::AtLeastOne);
    registry.set_required_options("parallel", &["mode", "how-many"]);
}

/// Ticks children in order, stopping at the first failed or in-progress
/// result and returning it unchanged; succeeds once every child succeeded.
///
/// Short-circuited AND.
pub fn sequence(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let mut state = state;
    for child in node.children() {
        let tick = engine.tick(state, child)?;
        if tick.status.failed() || tick.status.in_progress() {
            return Ok(tick);
        }
        state = tick.state;
    }
    Ok(Tick::success(state))
}

/// Ticks children in order, stopping at the first succeeded result and
/// returning it unchanged; fails once every child failed.
///
/// Short-circuited OR. An in-progress child interrupts the scan the way a
/// success does.
pub fn selector(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let mut state = state;
    for child in node.children() {
        let tick = engine.tick(state, child)?;
        if tick.status.succeeded() {
            return Ok(tick);
        }
        state = tick.state;
    }
    Ok(Tick::failure(state))
}

/// Probability-gated selector: each child is attempted only when a fresh
/// uniform draw lands under `p`. A skipped child counts like a failed one;
/// the scan fails once it is exhausted without a success.
pub fn selector_p(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let p = opts.float("p")?;
    let mut state = state;
    for child in node.children() {
        if engine.sampler().sample() >= p {
            continue;
        }
        let tick = engine.tick(state, child)?;
        if tick.status.succeeded() {
            return Ok(tick);
        }
        state = tick.state;
    }
    Ok(Tick::failure(state))
}

/// Ticks every child unconditionally and sequentially, tallying succeeded
/// and failed results, then compares the tally named by `mode` against
/// `how-many`: meeting the threshold yields the mode's status, missing it
/// yields the opposite.
///
/// Despite the name there is no concurrency; children run one after the
/// other on the calling thread.
pub fn parallel(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let mode = opts.string("mode")?;
    let how_many = opts.integer("how-many")?;
    if mode != "success" && mode != "failure" {
        return Err(opts.invalid("mode", "\"success\" or \"failure\""));
    }

    let mut state = state;
    let mut succeeded = 0i64;
    let mut failed = 0i64;
    for child in node.children() {
        let tick = engine.tick(state, child)?;
        if tick.status.succeeded() {
            succeeded += 1;
        } else {
            failed += 1;
        }
        state = tick.state;
    }

    let status = match mode {
        "success" if succeeded >= how_many => Status::Success,
        "success" => Status::Failure,
        _ if failed >= how_many => Status::Failure,
        _ => Status::Success,
    };
    Ok(Tick::new(status, state))
}
