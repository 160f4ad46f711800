//! Injectable source of uniform random choices.

use rand::Rng;
use rand::rngs::{SmallRng, StdRng, ThreadRng};
use std::collections::VecDeque;

/// Picks uniformly among `len` options.
///
/// Implementations return a value in `0..len`. Callers never ask with
/// `len == 0`.
pub trait RandomSource {
    /// Returns an index in `0..len`.
    fn pick(&mut self, len: usize) -> usize;
}

impl RandomSource for ThreadRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

impl RandomSource for StdRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

impl RandomSource for SmallRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Replays a fixed sequence of picks, for deterministic tests.
///
/// Each pick is reduced modulo `len`. Once the script runs out every pick
/// is `0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    /// Creates a source that will return `picks` in order.
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }

    /// Picks not yet consumed.
    pub fn remaining(&self) -> usize {
        self.picks.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().map(|p| p % len).unwrap_or(0)
    }
}
