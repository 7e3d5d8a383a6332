//! Example leaf behaviors for the ticktree engine.
//!
//! Leaves are where the embedding application meets the tree: they read and
//! write the caller's state and encode expected negative outcomes as
//! `Failure`. Everything here registers through the same [`Registry`]
//! extension points the built-in vocabulary uses — the engine cannot tell
//! these apart from `sequence` or `loop`.
//!
//! Option values may be deferred: `["$fn", id]` re-invokes a table function
//! per tick and `["$get", path*]` reads the current state, so predicates
//! like `test?` can compare against values that change while a tree runs.

use serde_json::Value;
use tracing::trace;

use ticktree::{CompiledNode, Engine, EngineError, Registry, State, Status, Tick, TickOptions};

/// Installs the example vocabulary into `registry`.
pub fn install(registry: &mut Registry) {
    registry.set_handler("counter!", counter);
    registry.set_required_options("counter!", &["key"]);

    registry.set_handler("less-than?", less_than);
    registry.set_required_options("less-than?", &["key", "val"]);

    registry.set_handler("test?", test);
    registry.set_required_options("test?", &["key", "val", "oper"]);

    registry.set_handler("present?", present);
    registry.set_required_options("present?", &["key"]);
}

/// Increments the integer under `key`, treating a missing entry as zero.
/// Always succeeds.
fn counter(
    _engine: &Engine,
    mut state: State,
    _node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let key = opts.string("key")?.to_string();
    let next = state.get(&key).and_then(Value::as_i64).unwrap_or(0) + 1;
    trace!(target: "ticktree::leaves", key = %key, next, "counter!");
    state.set(key, Value::from(next));
    Ok(Tick::success(state))
}

/// Succeeds iff the number under `key` is strictly below `val`. A missing
/// or non-numeric entry fails.
fn less_than(
    _engine: &Engine,
    state: State,
    _node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let key = opts.string("key")?;
    let bound = opts.float("val")?;
    let status = match state.get(key).and_then(Value::as_f64) {
        Some(current) if current < bound => Status::Success,
        _ => Status::Failure,
    };
    Ok(Tick::new(status, state))
}

/// Compares the state value under `key` against `val` with `oper`.
///
/// `=`/`not=` fall back to structural equality for non-numbers; the
/// ordering operators fail on anything non-numeric.
fn test(
    _engine: &Engine,
    state: State,
    _node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let key = opts.string("key")?;
    let expected = opts.value("val")?;
    let oper = opts.string("oper")?;
    let actual = state.get(key).cloned().unwrap_or(Value::Null);

    let Some(holds) = compare(&actual, expected, oper) else {
        return Err(opts.invalid("oper", "one of =, not=, <, >, <=, >="));
    };
    let status = if holds { Status::Success } else { Status::Failure };
    Ok(Tick::new(status, state))
}

/// Succeeds iff `key` exists in state at all.
fn present(
    _engine: &Engine,
    state: State,
    _node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let key = opts.string("key")?;
    let status = if state.get(key).is_some() {
        Status::Success
    } else {
        Status::Failure
    };
    Ok(Tick::new(status, state))
}

fn compare(actual: &Value, expected: &Value, oper: &str) -> Option<bool> {
    match oper {
        "=" => Some(values_equal(actual, expected)),
        "not=" => Some(!values_equal(actual, expected)),
        "<" | ">" | "<=" | ">=" => {
            let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) else {
                return Some(false);
            };
            Some(match oper {
                "<" => a < b,
                ">" => a > b,
                "<=" => a <= b,
                _ => a >= b,
            })
        }
        _ => None,
    }
}

/// Numbers compare by value so that `2` equals `2.0`; everything else
/// compares structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}
