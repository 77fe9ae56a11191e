//! Seeded randomness for structures.
//!
//! Each structure that needs random choices owns a [`DeterministicRng`]
//! seeded from its anchor tile and the tick its execution was initialized.
//! Two simulations that register the same executions on the same ticks
//! therefore draw the same numbers in the same order.
//!
//! Draws are always made on `u32` ranges so the stream does not depend on
//! the platform's pointer width.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::map::TileRef;
use crate::Tick;

/// Derive the seed for a structure initialized on `tick` at `tile`.
#[must_use]
pub const fn structure_seed(tick: Tick, tile: TileRef) -> u64 {
    tick ^ (tile.0 as u64)
}

/// Per-structure pseudo-random source.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl DeterministicRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[min, max)`.
    ///
    /// Returns `min` when the range is empty.
    pub fn next_int(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Uniform index into a slice of `len` elements.
    ///
    /// Slices longer than `u32::MAX` are clamped to their first `u32::MAX`
    /// elements so the draw stays platform independent.
    pub fn next_index(&mut self, len: usize) -> usize {
        let bound = u32::try_from(len).unwrap_or(u32::MAX);
        self.next_int(0, bound) as usize
    }
}
