//! Error types for the draw sequencer
//!
//! Draw failures are never transient: a whitelist that fails validation will fail
//! again with the same input, so nothing in the crate retries a draw. Callers are
//! expected to correct the whitelist and ask again.

use crate::whitelist::Item;

/// Errors raised while drawing or while mutating sequencer inputs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("whitelist has {eligible} eligible item(s), at least {required} required")]
    InvalidWhitelist { eligible: usize, required: usize },

    #[error("no eligible item left to sample")]
    EmptyEligibleSet,

    #[error("universe size mismatch: expected {expected} items, got {actual}")]
    UniverseMismatch { expected: usize, actual: usize },

    #[error("item {item} is outside the universe 1..={universe}")]
    ItemOutOfRange { item: Item, universe: usize },

    #[error("weight table error: {0}")]
    Weight(#[from] WeightError),
}

/// Errors raised while building or updating a weight table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("item {item} has zero weight; weights must be positive")]
    ZeroWeight { item: Item },

    #[error("weight override for item {item} is outside the universe 1..={universe}")]
    ItemOutOfRange { item: Item, universe: usize },

    #[error("weight table must cover at least one item")]
    EmptyUniverse,

    #[error("weights cannot be sampled: {0}")]
    Sampling(#[from] rand::distributions::WeightedError),
}
