//! Constant-outcome leaves.

use crate::compile::CompiledNode;
use crate::engine::{Engine, TickOptions};
use crate::error::EngineError;
use crate::registry::Registry;
use crate::state::State;
use crate::status::Tick;

pub(crate) fn install(registry: &mut Registry) {
    // Children specs stay at the default Exactly(0).
    registry.set_handler("success", success);
    registry.set_handler("failure", failure);
}

/// Succeeds immediately, leaving the state untouched.
pub fn success(
    _engine: &Engine,
    state: State,
    _node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    Ok(Tick::success(state))
}

/// Fails immediately, leaving the state untouched.
pub fn failure(
    _engine: &Engine,
    state: State,
    _node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    Ok(Tick::failure(state))
}

#[cfg(test)]
mod tests {
    use crate::nodes::support::harness;
    use crate::options::FnTable;
    use crate::state::State;
    use crate::status::Status;
    use serde_json::json;

    #[test]
    fn constant_leaves_return_immediately_without_touching_state() {
        let (compiler, engine) = harness();
        let mut state = State::new();
        state.set("kept", json!(true));

        let succeed = compiler.compile(&json!(["success"]), &FnTable::new()).unwrap();
        let tick = engine.run(state.clone(), &succeed).unwrap();
        assert_eq!(tick.status, Status::Success);
        assert_eq!(tick.state, state);

        let fail = compiler.compile(&json!(["failure"]), &FnTable::new()).unwrap();
        let tick = engine.run(state.clone(), &fail).unwrap();
        assert_eq!(tick.status, Status::Failure);
        assert_eq!(tick.state, state);
    }
}
