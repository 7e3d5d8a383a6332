//! Stochastic control nodes.
//!
//! All draws go through the engine's [`Sampler`](crate::Sampler), so these
//! nodes are deterministic under an injected seeded sampler.

use serde_json::Value;

use crate::compile::CompiledNode;
use crate::engine::{Engine, TickOptions};
use crate::error::EngineError;
use crate::registry::{ChildSpec, Registry};
use crate::state::State;
use crate::status::Tick;

pub(crate) fn install(registry: &mut Registry) {
    registry.set_handler("randomly", randomly);
    registry.set_children("randomly", ChildSpec::OneOf(vec![1, 2]));
    registry.set_required_options("randomly", &["p"]);

    registry.set_handler("choose", choose);
    registry.set_children("choose", ChildSpec::AtLeastOne);

    registry.set_handler("choose-each", choose_each);
    registry.set_children("choose-each", ChildSpec::AtLeastOne);
    registry.set_required_options("choose-each", &["repeat"]);
}

/// Gates or branches on a uniform draw.
///
/// With one child: tick it only when the draw lands under `p`, otherwise
/// fail without ticking. With two children: the draw picks the first child
/// (under `p`) or the second, and the result is returned unchanged.
pub fn randomly(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let p = opts.float("p")?;
    let hit = engine.sampler().sample() < p;
    let children = node.children();
    if children.len() == 1 {
        return if hit {
            engine.tick(state, &children[0])
        } else {
            Ok(Tick::failure(state))
        };
    }
    let child = if hit { &children[0] } else { &children[1] };
    engine.tick(state, child)
}

/// Ticks one uniformly chosen child, returning its result unchanged.
pub fn choose(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    _opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let children = node.children();
    let child = &children[engine.sampler().pick(children.len())];
    engine.tick(state, child)
}

/// Draws children without replacement from a pool kept in node memory.
///
/// Each evaluation removes one pool entry at random, ticks that child and
/// returns its result. Once the pool is exhausted it refills (with a fresh
/// random order) when `repeat` is set; otherwise every further evaluation
/// fails without ticking anything.
pub fn choose_each(
    engine: &Engine,
    state: State,
    node: &CompiledNode,
    opts: &TickOptions,
) -> Result<Tick, EngineError> {
    let repeat = opts.boolean("repeat")?;
    let children = node.children();
    let mut state = state;

    let mut pool = match load_pool(&state, node, children.len()) {
        Some(pool) => pool,
        None => (0..children.len()).collect(),
    };
    if pool.is_empty() {
        if !repeat {
            return Ok(Tick::failure(state));
        }
        pool = (0..children.len()).collect();
    }

    let slot = engine.sampler().pick(pool.len());
    let index = pool.swap_remove(slot);
    state.set_node_memory(node.id(), pool_value(&pool));
    engine.tick(state, &children[index])
}

fn load_pool(state: &State, node: &CompiledNode, child_count: usize) -> Option<Vec<usize>> {
    let entries = state.node_memory(node.id())?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(Value::as_u64)
            .map(|index| index as usize)
            .filter(|index| *index < child_count)
            .collect(),
    )
}

fn pool_value(pool: &[usize]) -> Value {
    Value::Array(pool.iter().map(|index| Value::from(*index as u64)).collect())
}
