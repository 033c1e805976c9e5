//! Item samplers
//!
//! This module provides the two samplers a draw sequencer chooses between, plus
//! the weight table and lookahead buffer that back the weighted one.
//!
//! # Samplers
//!
//! - **Weighted**: Rejection sampling against a buffer of full-universe weighted
//!   draws ([`weighted::WeightedPool`])
//! - **Backup**: Uniform pick among eligible items, ignoring weights
//!   ([`backup::BackupPool`])
//!
//! # Example
//!
//! ```
//! use dutydraw::distribution::{Sampler, backup::BackupPool};
//! use dutydraw::whitelist::Whitelist;
//!
//! let mut pool = BackupPool::with_seed(40, 1);
//! let eligible = Whitelist::from_items(40, [3, 17, 29]).unwrap();
//! let item = pool.sample(&eligible).unwrap();
//! assert!(eligible.contains(item));
//! ```

use crate::error::DrawError;
use crate::whitelist::{Item, Whitelist};

/// Sampler trait for picking one eligible item
///
/// # Thread Safety
///
/// Samplers must be `Send` so a sequencer can move to the task that owns it. They
/// are not shared: every sequencer owns its samplers and their RNG state.
pub trait Sampler: Send {
    /// Pick one item that is eligible in `eligible`
    ///
    /// # Errors
    ///
    /// - [`DrawError::EmptyEligibleSet`] if no item is eligible
    /// - [`DrawError::UniverseMismatch`] if the whitelist covers a different
    ///   universe than the sampler
    fn sample(&mut self, eligible: &Whitelist) -> Result<Item, DrawError>;
}

/// Shared precondition of every sampler
pub(crate) fn check_eligible(eligible: &Whitelist, universe: usize) -> Result<(), DrawError> {
    if eligible.len() != universe {
        return Err(DrawError::UniverseMismatch {
            expected: universe,
            actual: eligible.len(),
        });
    }
    if eligible.count() == 0 {
        return Err(DrawError::EmptyEligibleSet);
    }
    Ok(())
}

pub mod backup;
pub mod prefetch;
pub mod weighted;
pub mod weights;
