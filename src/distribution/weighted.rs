//! Weighted sampler backed by the prefetch buffer
//!
//! Raw items are dequeued from the [`PrefetchBuffer`] one at a time until one is
//! eligible; that item is returned and the rejected ones are discarded.
//!
//! # Accuracy
//!
//! Buffer entries are independent weighted draws over the full universe,
//! so filtering them yields the weighted distribution restricted to the whitelist.
//! Two things bend that:
//!
//! - Entries queued before a weight change follow the old weights; the effect is
//!   bounded by the buffer depth.
//! - A primed head from the entropy source is handed out as-is if eligible.
//!
//! Both are accepted approximations.

use super::prefetch::PrefetchBuffer;
use super::weights::WeightTable;
use super::{check_eligible, Sampler};
use crate::error::DrawError;
use crate::whitelist::{Item, Whitelist};

/// Weight table plus the lookahead buffer drawn from it
pub struct WeightedPool {
    weights: WeightTable,
    buffer: PrefetchBuffer,
}

impl WeightedPool {
    pub fn new(weights: WeightTable, buffer: PrefetchBuffer) -> Self {
        Self { weights, buffer }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn buffer(&self) -> &PrefetchBuffer {
        &self.buffer
    }

    pub fn universe_size(&self) -> usize {
        self.weights.universe_size()
    }

    /// Swap in a new weight table of the same universe size
    pub fn replace_weights(&mut self, weights: WeightTable) -> Result<(), DrawError> {
        if weights.universe_size() != self.weights.universe_size() {
            return Err(DrawError::UniverseMismatch {
                expected: self.weights.universe_size(),
                actual: weights.universe_size(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Make `item` the next raw value dequeued
    pub fn prime(&mut self, item: Item) -> Result<(), DrawError> {
        let universe = self.weights.universe_size();
        if item == 0 || item as usize > universe {
            return Err(DrawError::ItemOutOfRange { item, universe });
        }
        self.buffer.prime(item);
        Ok(())
    }
}

impl Sampler for WeightedPool {
    fn sample(&mut self, eligible: &Whitelist) -> Result<Item, DrawError> {
        check_eligible(eligible, self.weights.universe_size())?;

        // Every weight is positive, so each eligible item has a non-zero chance
        // of being queued and the loop terminates.
        loop {
            let item = self
                .buffer
                .pop(&self.weights)
                .ok_or(DrawError::EmptyEligibleSet)?;
            if eligible.contains(item) {
                return Ok(item);
            }
        }
    }
}
