//! Built-in control node vocabulary.
//!
//! Every built-in is installed through the same [`Registry`] extension
//! points caller-defined leaves use; nothing here is privileged. The
//! vocabulary is grouped by role:
//!
//! - [`composite`]: multi-child flow control (`sequence`, `selector`,
//!   `selector-p`, `parallel`)
//! - [`decorator`]: single-child wrappers (`loop`, `loop-until-success`,
//!   `always`, `never`, `invert`)
//! - [`random`]: stochastic selection (`randomly`, `choose`, `choose-each`)
//! - [`leaf`]: constant outcomes (`success`, `failure`)

pub mod composite;
pub mod decorator;
pub mod leaf;
pub mod random;

use crate::registry::Registry;

/// Installs the built-in vocabulary into `registry`.
pub fn install(registry: &mut Registry) {
    composite::install(registry);
    decorator::install(registry);
    random::install(registry);
    leaf::install(registry);
}
