// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-run seed derivation.
//!
//! Run `i` of an evaluation with base seed `s` is seeded with `s + i`
//! (wrapping). Each run owns its generator; nothing reads process-global
//! randomness, so results do not depend on what ran before.

use image_source::RunRng;
use rand::SeedableRng;

/// The seed of one run. Consumed to build that run's generator.
///
/// A `SeedState` cannot be duplicated, so each run's generator is built
/// exactly once:
///
/// ```compile_fail
/// let seed = eval_engine::derive(42, 0);
/// let again = seed.clone();
/// let _a = seed.into_rng();
/// let _b = again.into_rng();
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct SeedState {
    run: usize,
    seed: u64,
}

impl SeedState {
    pub fn run(&self) -> usize {
        self.run
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Builds the run's generator.
    pub fn into_rng(self) -> RunRng {
        RunRng::seed_from_u64(self.seed)
    }
}

/// Derives the seed for `run_index`.
pub fn derive(base_seed: u64, run_index: usize) -> SeedState {
    SeedState {
        run: run_index,
        seed: base_seed.wrapping_add(run_index as u64),
    }
}

/// Hands out [`SeedState`]s for consecutive runs.
#[derive(Debug, Clone, Copy)]
pub struct SeedController {
    base_seed: u64,
}

impl SeedController {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn derive(&self, run_index: usize) -> SeedState {
        derive(self.base_seed, run_index)
    }

    /// Seeds for runs `0..runs`.
    pub fn runs(&self, runs: usize) -> impl Iterator<Item = SeedState> + '_ {
        (0..runs).map(move |i| self.derive(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_derive_offsets_base() {
        assert_eq!(derive(42, 0).seed(), 42);
        assert_eq!(derive(42, 3).seed(), 45);
        assert_eq!(derive(u64::MAX, 1).seed(), 0);
        assert_eq!(derive(42, 3).run(), 3);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = derive(7, 1).into_rng();
        let mut b = derive(7, 1).into_rng();
        let xs: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_runs_get_distinct_streams() {
        let c = SeedController::new(100);
        let firsts: Vec<u64> = c.runs(3).map(|s| s.into_rng().gen()).collect();
        assert_ne!(firsts[0], firsts[1]);
        assert_ne!(firsts[1], firsts[2]);
    }
}
