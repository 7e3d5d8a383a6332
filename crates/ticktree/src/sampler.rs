//! Randomness injection for stochastic control nodes.
//!
//! Random draws go through the [`Sampler`] trait so evaluation can be made
//! deterministic for tests and replay. The default [`ThreadSampler`] draws
//! from the thread-local generator; [`SeededSampler`] produces the same
//! sequence for the same seed.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random draws for stochastic nodes.
pub trait Sampler: Send + Sync {
    /// A uniform draw in `[0, 1)`.
    fn sample(&self) -> f64;

    /// A uniform index in `0..n`. `n` must be nonzero.
    fn pick(&self, n: usize) -> usize;
}

/// Default sampler over the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSampler;

impl Sampler for ThreadSampler {
    fn sample(&self) -> f64 {
        rand::rng().random()
    }

    fn pick(&self, n: usize) -> usize {
        rand::rng().random_range(0..n)
    }
}

/// Deterministic sampler over a seeded generator.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, draw: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        draw(&mut guard)
    }
}

impl Sampler for SeededSampler {
    fn sample(&self) -> f64 {
        self.with_rng(|rng| rng.random())
    }

    fn pick(&self, n: usize) -> usize {
        self.with_rng(|rng| rng.random_range(0..n))
    }
}
