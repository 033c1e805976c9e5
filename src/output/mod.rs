//! Draw results
//!
//! A [`DrawReport`] collects what a draw run produced. `text` renders it for people,
//! `json` for scripts.

pub mod json;
pub mod text;

use crate::sequencer::DrawMode;
use crate::whitelist::{Item, Whitelist};
use serde::{Deserialize, Serialize};

/// Outcome of one draw run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawReport {
    pub mode: DrawMode,
    pub universe_size: usize,
    /// Eligible items at the time of the draws
    pub whitelist: Vec<Item>,
    /// Drawn items in order
    pub draws: Vec<Item>,
    /// Remote refreshes applied during the run
    pub refreshes_applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl DrawReport {
    pub fn new(mode: DrawMode, whitelist: &Whitelist, seed: Option<u64>) -> Self {
        Self {
            mode,
            universe_size: whitelist.len(),
            whitelist: whitelist.items().collect(),
            draws: Vec::new(),
            refreshes_applied: 0,
            seed,
        }
    }

    pub fn record(&mut self, item: Item) {
        self.draws.push(item);
    }
}
