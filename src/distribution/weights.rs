//! Per-item weight table
//!
//! Every universe item carries a positive integer weight: its relative frequency
//! multiplier in weighted sampling. A table starts from a default weight and takes
//! per-item overrides. Zero weights are rejected at every entry point, so every
//! item keeps a nonzero chance in weighted sampling.
//!
//! The table keeps a cumulative index next to the raw weights. It is built once per
//! table and patched on [`WeightTable::set`], so sampling never allocates and its
//! cost does not depend on how large the weights are.

use crate::error::WeightError;
use crate::whitelist::{Item, Whitelist};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Weight of every universe item (slot 0 is item 1)
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: Vec<u32>,
    /// Cumulative weights in `u64`, so even `u32::MAX` weights cannot overflow the total
    index: WeightedIndex<u64>,
}

impl PartialEq for WeightTable {
    fn eq(&self, other: &Self) -> bool {
        self.weights == other.weights
    }
}

impl Eq for WeightTable {}

fn build_index(weights: &[u32]) -> Result<WeightedIndex<u64>, WeightError> {
    Ok(WeightedIndex::new(weights.iter().map(|&w| u64::from(w)))?)
}

impl WeightTable {
    /// Create a table assigning `default` to every item
    pub fn new(universe: usize, default: u32) -> Result<Self, WeightError> {
        if universe == 0 {
            return Err(WeightError::EmptyUniverse);
        }
        if default == 0 {
            return Err(WeightError::ZeroWeight { item: 1 });
        }
        let weights = vec![default; universe];
        let index = build_index(&weights)?;
        Ok(Self { weights, index })
    }

    /// Table with weight 1 for every item
    pub fn uniform(universe: usize) -> Result<Self, WeightError> {
        Self::new(universe, 1)
    }

    /// Create a table from an explicit weight vector
    pub fn from_weights(weights: Vec<u32>) -> Result<Self, WeightError> {
        if weights.is_empty() {
            return Err(WeightError::EmptyUniverse);
        }
        if let Some(index) = weights.iter().position(|&w| w == 0) {
            return Err(WeightError::ZeroWeight {
                item: index as Item + 1,
            });
        }
        let index = build_index(&weights)?;
        Ok(Self { weights, index })
    }

    /// Override the weight of one item
    pub fn set(&mut self, item: Item, weight: u32) -> Result<(), WeightError> {
        let universe = self.weights.len();
        let slot = (item as usize)
            .checked_sub(1)
            .filter(|&index| index < universe)
            .ok_or(WeightError::ItemOutOfRange { item, universe })?;
        if weight == 0 {
            return Err(WeightError::ZeroWeight { item });
        }
        self.index.update_weights(&[(slot, &u64::from(weight))])?;
        self.weights[slot] = weight;
        Ok(())
    }

    /// Builder-style [`set`](Self::set)
    pub fn with_override(mut self, item: Item, weight: u32) -> Result<Self, WeightError> {
        self.set(item, weight)?;
        Ok(self)
    }

    /// Weight of `item`, or 0 for items outside the universe
    pub fn weight(&self, item: Item) -> u32 {
        (item as usize)
            .checked_sub(1)
            .and_then(|index| self.weights.get(index))
            .copied()
            .unwrap_or(0)
    }

    pub fn universe_size(&self) -> usize {
        self.weights.len()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.weights
    }

    /// Sum of the weights of the eligible items
    pub fn total(&self, eligible: &Whitelist) -> u64 {
        eligible.items().map(|item| self.weight(item) as u64).sum()
    }

    /// Weighted pick over the whole universe: item `i` comes up with probability
    /// `weight(i) / sum(weights)`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Item {
        self.index.sample(rng) as Item + 1
    }
}
