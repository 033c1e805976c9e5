//! Remote entropy
//!
//! An optional remote service can replace the local weight table and suggest the
//! next value to hand out. This module implements both ends of that exchange.
//!
//! # Architecture
//!
//! ```text
//! DrawSession                 tokio task                    EntropyService
//!     |                           |                               |
//!     |  spawn_refresh(whitelist) |                               |
//!     |-------------------------->|------ <auth> <whitelist> ---->|
//!     |                           |<----- <primed> <weights> -----|
//!     |<====== mpsc: Refresh =====|                               |
//!     |                           |                               |
//!  try_refresh() before the next draw
//! ```
//!
//! The sequencer only ever sees the [`EntropySource`] trait. Refreshes travel over
//! a single-consumer channel and are applied by the session that owns the
//! sequencer, so no state is shared between the fetch task and the draws.
//!
//! # Modules
//!
//! - `protocol`: Symbol alphabet, message bodies and framing
//! - `client`: Fetches refreshes for a draw session
//! - `service`: Answers refresh requests
//! - `ledger`: Service-side weight transactions

pub mod client;
pub mod ledger;
pub mod protocol;
pub mod service;

use crate::distribution::weights::WeightTable;
use crate::whitelist::Item;
use tokio::sync::mpsc;

pub use client::EntropyClient;
pub use service::EntropyService;

/// Update delivered by a remote entropy source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    /// Replacement weight table
    pub weights: WeightTable,
    /// Item to splice in as the next prefetched value
    pub primed: Option<Item>,
}

/// Non-blocking supplier of refreshes
pub trait EntropySource: Send {
    /// Next pending refresh, if one has arrived
    fn try_refresh(&mut self) -> Option<Refresh>;
}

/// Sending half handed to fetch tasks
pub type RefreshSender = mpsc::UnboundedSender<Refresh>;

/// Entropy source fed by background fetch tasks
pub struct ChannelEntropySource {
    receiver: mpsc::UnboundedReceiver<Refresh>,
}

impl EntropySource for ChannelEntropySource {
    fn try_refresh(&mut self) -> Option<Refresh> {
        self.receiver.try_recv().ok()
    }
}

/// Create a connected sender / entropy source pair
pub fn channel() -> (RefreshSender, ChannelEntropySource) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (sender, ChannelEntropySource { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_in_order() {
        let (sender, mut source) = channel();
        assert_eq!(source.try_refresh(), None);

        for primed in [1, 2] {
            sender
                .send(Refresh {
                    weights: WeightTable::uniform(3).unwrap(),
                    primed: Some(primed),
                })
                .unwrap();
        }

        assert_eq!(source.try_refresh().unwrap().primed, Some(1));
        assert_eq!(source.try_refresh().unwrap().primed, Some(2));
        assert_eq!(source.try_refresh(), None);
    }

    #[test]
    fn test_closed_channel_yields_nothing() {
        let (sender, mut source) = channel();
        drop(sender);
        assert_eq!(source.try_refresh(), None);
    }
}
