//! Unweighted fallback sampler
//!
//! With a small pool, or with items in the range where weighting is not meant to
//! apply, a weighted pick becomes noticeable to the people being drawn. The backup
//! pool ignores the weight table and picks uniformly among the eligible items.

use super::{check_eligible, Sampler};
use crate::error::DrawError;
use crate::whitelist::{Item, Whitelist};
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform sampler over the eligible part of the universe
pub struct BackupPool {
    universe: usize,
    rng: Xoshiro256PlusPlus,
}

impl BackupPool {
    /// Create a backup pool with specific seed
    pub fn with_seed(universe: usize, seed: u64) -> Self {
        Self::with_rng(universe, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    pub fn with_rng(universe: usize, rng: Xoshiro256PlusPlus) -> Self {
        Self { universe, rng }
    }
}

impl Sampler for BackupPool {
    fn sample(&mut self, eligible: &Whitelist) -> Result<Item, DrawError> {
        check_eligible(eligible, self.universe)?;
        eligible
            .items()
            .choose(&mut self.rng)
            .ok_or(DrawError::EmptyEligibleSet)
    }
}
