//! Injected randomness.
//!
//! The workflow draws its simulated delays and fault decisions from a
//! `RandomSource` it is handed, never from a process-wide generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Source of uniform random integers.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[0, bound)`. `bound` must be non-zero.
    fn next_below(&self, bound: u32) -> u32;

    /// Uniform integer in `[low, high)`. An empty range yields `low`.
    fn between(&self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        low + self.next_below(high - low)
    }
}

/// Pseudo-random source backed by `StdRng`.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Deterministic source for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_below(&self, bound: u32) -> u32 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..bound)
    }
}

/// Replays a fixed sequence of draws.
///
/// Each value is reduced modulo the requested bound; once the script runs
/// out, every draw returns 0.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    values: Mutex<VecDeque<u32>>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    /// Draws not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&self, bound: u32) -> u32 {
        let next = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(0);
        next % bound
    }
}
