//! Draw session
//!
//! A [`DrawSession`] is what a front end holds on to: the sequencer, the draw mode
//! toggle, the most recent result and, optionally, a remote entropy source. It is
//! the single place where remote refreshes are applied. Pending refreshes are
//! drained right before each draw, so a refresh never lands halfway through one.

use super::{DrawMode, DrawSequencer};
use crate::entropy::EntropySource;
use crate::error::DrawError;
use crate::whitelist::{Item, Whitelist};
use tracing::warn;

/// Explicitly owned draw state for one front end
pub struct DrawSession {
    sequencer: DrawSequencer,
    source: Option<Box<dyn EntropySource>>,
    mode: DrawMode,
    last_drawn: Option<Item>,
    refreshes_applied: usize,
}

impl DrawSession {
    pub fn new(sequencer: DrawSequencer, mode: DrawMode) -> Self {
        Self {
            sequencer,
            source: None,
            mode,
            last_drawn: None,
            refreshes_applied: 0,
        }
    }

    /// Attach a remote entropy source
    pub fn with_entropy_source(mut self, source: Box<dyn EntropySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
    }

    /// Most recently drawn item, `None` before the first draw
    pub fn last_drawn(&self) -> Option<Item> {
        self.last_drawn
    }

    /// Number of remote refreshes applied so far
    pub fn refreshes_applied(&self) -> usize {
        self.refreshes_applied
    }

    pub fn sequencer(&self) -> &DrawSequencer {
        &self.sequencer
    }

    /// Apply every refresh that has arrived since the last call
    ///
    /// Refreshes the sequencer cannot accept are logged and dropped; local state is
    /// left as it was. Returns the number applied.
    pub fn sync_entropy(&mut self) -> usize {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        while let Some(refresh) = source.try_refresh() {
            match self.sequencer.apply_refresh(refresh) {
                Ok(()) => applied += 1,
                Err(e) => warn!("Ignoring entropy refresh: {}", e),
            }
        }
        self.refreshes_applied += applied;
        applied
    }

    /// Draw one item in the current mode
    pub fn draw(&mut self, whitelist: &Whitelist) -> Result<Item, DrawError> {
        self.sync_entropy();
        let item = self.sequencer.draw(self.mode, whitelist)?;
        self.last_drawn = Some(item);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::distribution::weights::WeightTable;
    use crate::entropy::{self, Refresh};

    fn session(mode: DrawMode) -> DrawSession {
        let sampling = SamplingConfig {
            seed: Some(21),
            ..SamplingConfig::default()
        };
        DrawSession::new(
            DrawSequencer::new(WeightTable::uniform(40).unwrap(), &sampling),
            mode,
        )
    }

    #[test]
    fn test_last_drawn() {
        let mut session = session(DrawMode::Regular);
        assert_eq!(session.last_drawn(), None);

        let whitelist = Whitelist::from_items(40, 1..=29).unwrap();
        let item = session.draw(&whitelist).unwrap();
        assert_eq!(session.last_drawn(), Some(item));

        // a failed draw keeps the previous result
        assert!(session.draw(&Whitelist::empty(40)).is_err());
        assert_eq!(session.last_drawn(), Some(item));
    }

    #[test]
    fn test_mode_toggle_persists() {
        let mut session = session(DrawMode::WithoutRepetition);
        let whitelist = Whitelist::from_items(40, 1..=5).unwrap();
        session.draw(&whitelist).unwrap();
        assert_eq!(session.sequencer().cycle_history().len(), 1);

        session.set_mode(DrawMode::Regular);
        assert_eq!(session.mode(), DrawMode::Regular);
        session.draw(&whitelist).unwrap();
        assert_eq!(session.sequencer().cycle_history().len(), 1);
        assert_eq!(session.sequencer().regular_history().len(), 2);
    }

    #[test]
    fn test_refresh_applied_before_draw() {
        let (sender, source) = entropy::channel();
        let mut session =
            session(DrawMode::Unconstrained).with_entropy_source(Box::new(source));

        sender
            .send(Refresh {
                weights: WeightTable::new(40, 5).unwrap(),
                primed: Some(38),
            })
            .unwrap();

        let item = session.draw(&Whitelist::full(40)).unwrap();
        assert_eq!(item, 38);
        assert_eq!(session.refreshes_applied(), 1);
        assert_eq!(session.sequencer().weights().weight(1), 5);
    }

    #[test]
    fn test_invalid_refresh_is_dropped() {
        let (sender, source) = entropy::channel();
        let mut session =
            session(DrawMode::Unconstrained).with_entropy_source(Box::new(source));

        sender
            .send(Refresh {
                weights: WeightTable::uniform(12).unwrap(),
                primed: Some(3),
            })
            .unwrap();

        assert_eq!(session.sync_entropy(), 0);
        assert_eq!(session.refreshes_applied(), 0);
        assert_eq!(session.sequencer().weights().universe_size(), 40);
    }

    #[test]
    fn test_later_refresh_supersedes_primed_head() {
        let (sender, source) = entropy::channel();
        let mut session =
            session(DrawMode::Unconstrained).with_entropy_source(Box::new(source));

        for primed in [4, 9] {
            sender
                .send(Refresh {
                    weights: WeightTable::uniform(40).unwrap(),
                    primed: Some(primed),
                })
                .unwrap();
        }

        assert_eq!(session.sync_entropy(), 2);
        assert_eq!(session.sequencer().prefetch().peek(), Some(9));
    }

    #[test]
    fn test_no_source_no_refresh() {
        let mut session = session(DrawMode::Regular);
        assert_eq!(session.sync_entropy(), 0);
    }
}
