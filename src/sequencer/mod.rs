//! Draw sequencer
//!
//! The sequencer turns a whitelist, the weight table and the history of earlier
//! draws into the next item. It offers three modes:
//!
//! - **Unconstrained**: weighted pick among eligible items, nothing remembered
//! - **Regular**: never returns the previous regular draw again straight away
//! - **Without repetition**: cycles through every eligible item before any repeats
//!
//! # State
//!
//! The sequencer has no explicit state enum. Its behavior follows from two
//! histories and the cycle counter `k`, the number of most recent
//! without-repetition draws that belong to the current cycle.
//!
//! # Sampler choice
//!
//! Regular draws (and therefore without-repetition draws) fall back to the
//! unweighted [`BackupPool`] when fewer than `backup_below` items are eligible, or
//! when an eligible item lies above `weighting_limit`. In both cases weighting would
//! be visible to the people being drawn.
//!
//! # Example
//!
//! ```
//! use dutydraw::config::SamplingConfig;
//! use dutydraw::distribution::weights::WeightTable;
//! use dutydraw::sequencer::DrawSequencer;
//! use dutydraw::whitelist::Whitelist;
//!
//! let sampling = SamplingConfig { seed: Some(7), ..SamplingConfig::default() };
//! let mut sequencer = DrawSequencer::new(WeightTable::uniform(5).unwrap(), &sampling);
//! let whitelist = Whitelist::full(5);
//!
//! let mut seen: Vec<u32> = (0..5)
//!     .map(|_| sequencer.draw_without_repetition(&whitelist).unwrap())
//!     .collect();
//! seen.sort();
//! assert_eq!(seen, vec![1, 2, 3, 4, 5]);
//! ```

pub mod session;

use crate::config::SamplingConfig;
use crate::distribution::backup::BackupPool;
use crate::distribution::prefetch::PrefetchBuffer;
use crate::distribution::weighted::WeightedPool;
use crate::distribution::weights::WeightTable;
use crate::distribution::Sampler;
use crate::entropy::Refresh;
use crate::error::DrawError;
use crate::whitelist::{Item, Whitelist, MIN_DRAWABLE};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub use session::DrawSession;

/// Draw mode selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    /// Weighted pick, repeats allowed
    Unconstrained,
    /// No immediate repeat
    Regular,
    /// No repeat until every eligible item was drawn once
    #[default]
    WithoutRepetition,
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconstrained => write!(f, "unconstrained"),
            Self::Regular => write!(f, "regular"),
            Self::WithoutRepetition => write!(f, "without-repetition"),
        }
    }
}

/// Stateful draw engine
pub struct DrawSequencer {
    weighted: WeightedPool,
    backup: BackupPool,
    backup_below: usize,
    exclusion_floor: usize,
    weighting_limit: Option<Item>,
    regular_history: Vec<Item>,
    cycle_history: Vec<Item>,
    cycle_len: usize,
}

impl DrawSequencer {
    /// Create a sequencer over the universe covered by `weights`
    ///
    /// With `sampling.seed` set, both samplers derive their RNG state from it and
    /// the draw sequence is reproducible.
    pub fn new(weights: WeightTable, sampling: &SamplingConfig) -> Self {
        let mut rng = match sampling.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let buffer_rng = rng.clone();
        rng.jump();

        let universe = weights.universe_size();
        Self {
            weighted: WeightedPool::new(
                weights,
                PrefetchBuffer::new(sampling.prefetch_depth, buffer_rng),
            ),
            backup: BackupPool::with_rng(universe, rng),
            backup_below: sampling.backup_below,
            exclusion_floor: sampling.exclusion_floor,
            weighting_limit: sampling.weighting_limit,
            regular_history: Vec::new(),
            cycle_history: Vec::new(),
            cycle_len: 0,
        }
    }

    pub fn universe_size(&self) -> usize {
        self.weighted.universe_size()
    }

    pub fn weights(&self) -> &WeightTable {
        self.weighted.weights()
    }

    pub fn prefetch(&self) -> &PrefetchBuffer {
        self.weighted.buffer()
    }

    /// Items returned by regular draws (including those made on behalf of
    /// without-repetition draws), oldest first
    pub fn regular_history(&self) -> &[Item] {
        &self.regular_history
    }

    /// Items returned by without-repetition draws, oldest first
    pub fn cycle_history(&self) -> &[Item] {
        &self.cycle_history
    }

    /// Items already drawn in the current without-repetition cycle
    pub fn current_cycle(&self) -> &[Item] {
        &self.cycle_history[self.cycle_history.len() - self.cycle_len..]
    }

    /// Forget every earlier draw
    pub fn reset(&mut self) {
        self.regular_history.clear();
        self.cycle_history.clear();
        self.cycle_len = 0;
    }

    /// Draw one item in `mode`
    pub fn draw(&mut self, mode: DrawMode, whitelist: &Whitelist) -> Result<Item, DrawError> {
        match mode {
            DrawMode::Unconstrained => self.draw_unconstrained(whitelist),
            DrawMode::Regular => self.draw_regular(whitelist),
            DrawMode::WithoutRepetition => self.draw_without_repetition(whitelist),
        }
    }

    /// Weighted draw from the whitelist with no history kept
    pub fn draw_unconstrained(&mut self, whitelist: &Whitelist) -> Result<Item, DrawError> {
        self.check_whitelist(whitelist, 1)?;
        let item = self.weighted.sample(whitelist)?;
        debug!(item, "unconstrained draw");
        Ok(item)
    }

    /// Draw that never repeats the previous regular draw
    ///
    /// Requires at least two eligible items.
    pub fn draw_regular(&mut self, whitelist: &Whitelist) -> Result<Item, DrawError> {
        self.check_whitelist(whitelist, MIN_DRAWABLE)?;
        self.regular(whitelist.clone())
    }

    /// Draw that cycles through every eligible item before repeating any
    ///
    /// Requires at least two eligible items. When the whitelist changes mid-cycle
    /// the cycle continues over the new whitelist: items drawn earlier in the cycle
    /// stay excluded until every currently eligible item has been drawn.
    pub fn draw_without_repetition(&mut self, whitelist: &Whitelist) -> Result<Item, DrawError> {
        self.check_whitelist(whitelist, MIN_DRAWABLE)?;

        if whitelist
            .items()
            .all(|item| self.current_cycle().contains(&item))
        {
            debug!(drawn = self.cycle_len, "cycle complete, starting a new one");
            self.cycle_len = 0;
        }

        let mut filtered = whitelist.clone();
        for &item in self.current_cycle() {
            filtered.set(item, false)?;
        }
        if filtered.count() == 0 {
            return Err(DrawError::InvalidWhitelist {
                eligible: 0,
                required: 1,
            });
        }

        let item = self.regular(filtered)?;
        self.cycle_len += 1;
        self.cycle_history.push(item);
        Ok(item)
    }

    /// Apply a remote refresh: new weights, and optionally a new buffer head
    pub fn apply_refresh(&mut self, refresh: Refresh) -> Result<(), DrawError> {
        if let Some(item) = refresh.primed {
            let universe = self.universe_size();
            if item == 0 || item as usize > universe {
                return Err(DrawError::ItemOutOfRange { item, universe });
            }
        }

        self.weighted.replace_weights(refresh.weights)?;
        if let Some(item) = refresh.primed {
            self.weighted.prime(item)?;
        }
        debug!(primed = ?refresh.primed, "applied entropy refresh");
        Ok(())
    }

    fn regular(&mut self, mut eligible: Whitelist) -> Result<Item, DrawError> {
        if let Some(&last) = self.regular_history.last() {
            if eligible.contains(last) && eligible.count() > self.exclusion_floor {
                eligible.set(last, false)?;
            }
        }

        let item = if self.needs_backup(&eligible) {
            let item = self.backup.sample(&eligible)?;
            debug!(item, eligible = eligible.count(), "regular draw (unweighted)");
            item
        } else {
            let item = self.weighted.sample(&eligible)?;
            debug!(item, eligible = eligible.count(), "regular draw (weighted)");
            item
        };

        self.regular_history.push(item);
        Ok(item)
    }

    fn needs_backup(&self, eligible: &Whitelist) -> bool {
        if eligible.count() < self.backup_below {
            return true;
        }
        match (self.weighting_limit, eligible.max_item()) {
            (Some(limit), Some(max)) => max > limit,
            _ => false,
        }
    }

    fn check_whitelist(&self, whitelist: &Whitelist, required: usize) -> Result<(), DrawError> {
        if whitelist.len() != self.universe_size() {
            return Err(DrawError::UniverseMismatch {
                expected: self.universe_size(),
                actual: whitelist.len(),
            });
        }
        let eligible = whitelist.count();
        if eligible < required {
            return Err(DrawError::InvalidWhitelist { eligible, required });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sampling(seed: u64) -> SamplingConfig {
        SamplingConfig {
            seed: Some(seed),
            ..SamplingConfig::default()
        }
    }

    fn sequencer(universe: usize, seed: u64) -> DrawSequencer {
        DrawSequencer::new(WeightTable::uniform(universe).unwrap(), &sampling(seed))
    }

    #[test]
    fn test_unconstrained_returns_eligible_items() {
        let mut seq = sequencer(40, 1);
        for size in 1..=10u32 {
            let whitelist = Whitelist::from_items(40, (1..=size).map(|i| i * 4)).unwrap();
            for _ in 0..50 {
                let item = seq.draw_unconstrained(&whitelist).unwrap();
                assert!(whitelist.contains(item));
            }
        }
        assert!(seq.regular_history().is_empty());
        assert!(seq.cycle_history().is_empty());
    }

    #[test]
    fn test_unconstrained_rejects_empty_whitelist() {
        let mut seq = sequencer(10, 1);
        assert_eq!(
            seq.draw_unconstrained(&Whitelist::empty(10)),
            Err(DrawError::InvalidWhitelist { eligible: 0, required: 1 })
        );
    }

    #[test]
    fn test_unconstrained_frequencies_follow_weights() {
        let weights = WeightTable::new(6, 10)
            .unwrap()
            .with_override(2, 40)
            .unwrap()
            .with_override(5, 20)
            .unwrap();
        let mut seq = DrawSequencer::new(weights.clone(), &sampling(99));
        let whitelist = Whitelist::full(6);
        let total = weights.total(&whitelist) as f64;

        let draws = 100_000;
        let mut counts = [0u32; 6];
        for _ in 0..draws {
            counts[(seq.draw_unconstrained(&whitelist).unwrap() - 1) as usize] += 1;
        }

        for item in 1..=6u32 {
            let expected = draws as f64 * weights.weight(item) as f64 / total;
            let observed = counts[(item - 1) as usize] as f64;
            let deviation = (observed - expected).abs() / expected;
            assert!(deviation < 0.05, "item {} observed {} expected {}", item, observed, expected);
        }
    }

    #[test]
    fn test_whitelist_of_wrong_universe() {
        let mut seq = sequencer(10, 1);
        assert_eq!(
            seq.draw_regular(&Whitelist::full(11)),
            Err(DrawError::UniverseMismatch { expected: 10, actual: 11 })
        );
    }

    #[test]
    fn test_regular_never_repeats_previous() {
        let mut seq = sequencer(40, 2);
        let whitelist = Whitelist::from_items(40, 1..=29).unwrap();

        let mut previous = None;
        for _ in 0..2_000 {
            let item = seq.draw_regular(&whitelist).unwrap();
            assert!(whitelist.contains(item));
            assert_ne!(Some(item), previous);
            previous = Some(item);
        }
        assert_eq!(seq.regular_history().len(), 2_000);
    }

    #[test]
    fn test_regular_never_repeats_with_small_changing_whitelists() {
        let mut seq = sequencer(40, 3);
        let whitelists = [
            Whitelist::from_items(40, [1, 2, 3]).unwrap(),
            Whitelist::from_items(40, [2, 3, 35]).unwrap(),
            Whitelist::from_items(40, [1, 3, 30, 31, 32, 33]).unwrap(),
        ];

        let mut previous = None;
        for round in 0..3_000 {
            let whitelist = &whitelists[round % whitelists.len()];
            let item = seq.draw_regular(whitelist).unwrap();
            assert!(whitelist.contains(item));
            assert_ne!(Some(item), previous);
            previous = Some(item);
        }
    }

    #[test]
    fn test_regular_alternates_between_two_items() {
        let mut seq = sequencer(40, 4);
        let wide = Whitelist::from_items(40, 1..=20).unwrap();
        for _ in 0..10 {
            seq.draw_regular(&wide).unwrap();
        }

        let narrow = Whitelist::from_items(40, [7, 12]).unwrap();
        let first = seq.draw_regular(&narrow).unwrap();
        let mut expected = if first == 7 { 12 } else { 7 };
        for _ in 0..50 {
            let item = seq.draw_regular(&narrow).unwrap();
            assert_eq!(item, expected);
            expected = if item == 7 { 12 } else { 7 };
        }
    }

    #[test]
    fn test_constrained_modes_reject_tiny_whitelists() {
        let mut seq = sequencer(10, 5);
        for whitelist in [Whitelist::empty(10), Whitelist::from_items(10, [4]).unwrap()] {
            let eligible = whitelist.count();
            let expected = Err(DrawError::InvalidWhitelist { eligible, required: 2 });
            assert_eq!(seq.draw_regular(&whitelist), expected);
            assert_eq!(seq.draw_without_repetition(&whitelist), expected);
        }
        assert!(seq.regular_history().is_empty());
        assert!(seq.current_cycle().is_empty());
    }

    #[test]
    fn test_without_repetition_covers_whitelist_once() {
        let mut seq = sequencer(40, 6);
        let whitelist = Whitelist::from_items(40, [1, 4, 9, 16, 25, 30, 36]).unwrap();

        for _cycle in 0..20 {
            let drawn: Vec<Item> = (0..whitelist.count())
                .map(|_| seq.draw_without_repetition(&whitelist).unwrap())
                .collect();
            let unique: HashSet<Item> = drawn.iter().copied().collect();
            assert_eq!(unique.len(), whitelist.count());
            assert!(unique.iter().all(|&item| whitelist.contains(item)));
        }
    }

    #[test]
    fn test_without_repetition_five_item_scenario() {
        for seed in 0..50 {
            let mut seq = sequencer(5, seed);
            let whitelist = Whitelist::full(5);

            let mut first_cycle: Vec<Item> = (0..5)
                .map(|_| seq.draw_without_repetition(&whitelist).unwrap())
                .collect();
            let fifth = first_cycle[4];
            first_cycle.sort();
            assert_eq!(first_cycle, vec![1, 2, 3, 4, 5]);

            let sixth = seq.draw_without_repetition(&whitelist).unwrap();
            assert_ne!(sixth, fifth);
            assert_eq!(seq.current_cycle(), &[sixth]);
        }
    }

    #[test]
    fn test_without_repetition_with_shrinking_whitelist() {
        let mut seq = sequencer(10, 7);
        let full = Whitelist::full(10);
        let first = seq.draw_without_repetition(&full).unwrap();
        let second = seq.draw_without_repetition(&full).unwrap();

        // shrink to the two items already drawn plus two fresh ones
        let mut fresh = (1..=10).filter(|&i| i != first && i != second);
        let (a, b) = (fresh.next().unwrap(), fresh.next().unwrap());
        let shrunk = Whitelist::from_items(10, [first, second, a, b]).unwrap();

        let mut rest = vec![
            seq.draw_without_repetition(&shrunk).unwrap(),
            seq.draw_without_repetition(&shrunk).unwrap(),
        ];
        rest.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(rest, expected);

        // every eligible item was drawn in this cycle, so the next draw restarts it
        let next = seq.draw_without_repetition(&shrunk).unwrap();
        assert!(shrunk.contains(next));
        assert_eq!(seq.current_cycle(), &[next]);
    }

    #[test]
    fn test_without_repetition_feeds_regular_history() {
        let mut seq = sequencer(10, 8);
        let whitelist = Whitelist::full(10);
        let item = seq.draw_without_repetition(&whitelist).unwrap();
        assert_eq!(seq.regular_history(), &[item]);
        assert_eq!(seq.cycle_history(), &[item]);
    }

    #[test]
    fn test_weighting_limit_forces_backup() {
        // With the limit active, the heavy item must not dominate
        let weights = WeightTable::uniform(40).unwrap().with_override(1, 10_000).unwrap();
        let mut seq = DrawSequencer::new(weights, &sampling(10));
        let whitelist = Whitelist::from_items(40, (1..=10).chain([35])).unwrap();

        let draws = 3_000;
        let ones = (0..draws)
            .filter(|_| seq.draw_regular(&whitelist).unwrap() == 1)
            .count();
        // uniform over 10 candidates (one excluded each time) is about 10%
        assert!(ones < draws / 5, "item 1 drawn {} times", ones);
    }

    fn heavy_first_item(seed: u64) -> DrawSequencer {
        let weights = WeightTable::uniform(40).unwrap().with_override(1, 10_000).unwrap();
        let sampling = SamplingConfig {
            seed: Some(seed),
            weighting_limit: None,
            ..SamplingConfig::default()
        };
        DrawSequencer::new(weights, &sampling)
    }

    #[test]
    fn test_small_whitelist_forces_backup() {
        // A fresh sequencer has no history, so nothing is excluded on the first draw
        let four = Whitelist::from_items(40, 1..=4).unwrap();
        let five = Whitelist::from_items(40, 1..=5).unwrap();

        let seeds: u64 = 400;
        let below = (0..seeds)
            .filter(|&seed| heavy_first_item(seed).draw_regular(&four).unwrap() == 1)
            .count();
        let at = (0..seeds)
            .filter(|&seed| heavy_first_item(seed).draw_regular(&five).unwrap() == 1)
            .count();

        // 4 eligible items: uniform, about 100 of 400
        assert!((50..160).contains(&below), "item 1 won {} of {}", below, seeds);
        // 5 eligible items: weighted, nearly always
        assert!(at > 380, "item 1 won {} of {}", at, seeds);
    }

    #[test]
    fn test_heavy_item_share_across_backup_threshold() {
        let draws = 4_000;

        // 4 eligible minus the excluded previous draw leaves 3: always unweighted
        let mut seq = heavy_first_item(21);
        let four = Whitelist::from_items(40, 1..=4).unwrap();
        let ones = (0..draws).filter(|_| seq.draw_regular(&four).unwrap() == 1).count();
        let share = ones as f64 / draws as f64;
        assert!(share < 0.35, "item 1 share {} with 4 eligible", share);

        // 6 eligible minus one leaves 5: weighted, so item 1 wins whenever it is not excluded
        let mut seq = heavy_first_item(22);
        let six = Whitelist::from_items(40, 1..=6).unwrap();
        let ones = (0..draws).filter(|_| seq.draw_regular(&six).unwrap() == 1).count();
        let share = ones as f64 / draws as f64;
        assert!(share > 0.4, "item 1 share {} with 6 eligible", share);
    }

    #[test]
    fn test_draws_with_max_weights() {
        let weights = WeightTable::new(40, u32::MAX).unwrap();
        let mut seq = DrawSequencer::new(weights, &sampling(23));
        let whitelist = Whitelist::from_items(40, 1..=29).unwrap();

        for mode in [DrawMode::Unconstrained, DrawMode::Regular, DrawMode::WithoutRepetition] {
            for _ in 0..100 {
                assert!(whitelist.contains(seq.draw(mode, &whitelist).unwrap()));
            }
        }

        let refresh = Refresh {
            weights: WeightTable::new(40, u32::MAX).unwrap().with_override(5, 1).unwrap(),
            primed: None,
        };
        seq.apply_refresh(refresh).unwrap();
        assert!(whitelist.contains(seq.draw_unconstrained(&whitelist).unwrap()));
    }

    #[test]
    fn test_weighted_regular_draw_prefers_heavy_items() {
        let weights = WeightTable::uniform(40).unwrap().with_override(3, 50).unwrap();
        let mut seq = DrawSequencer::new(weights, &sampling(11));
        let whitelist = Whitelist::from_items(40, 1..=10).unwrap();

        let draws = 3_000;
        let threes = (0..draws)
            .filter(|_| seq.draw_regular(&whitelist).unwrap() == 3)
            .count();
        // item 3 wins roughly every other draw (it is excluded right after winning)
        assert!(threes > draws / 3, "item 3 drawn {} times", threes);
    }

    #[test]
    fn test_apply_refresh_primes_next_draw() {
        let mut seq = sequencer(40, 12);
        let refresh = Refresh {
            weights: WeightTable::new(40, 3).unwrap(),
            primed: Some(17),
        };
        seq.apply_refresh(refresh).unwrap();

        assert_eq!(seq.weights().weight(1), 3);
        assert_eq!(seq.prefetch().peek(), Some(17));
        assert_eq!(seq.draw_unconstrained(&Whitelist::full(40)), Ok(17));
    }

    #[test]
    fn test_apply_refresh_rejects_mismatched_tables() {
        let mut seq = sequencer(40, 13);
        let before = seq.weights().clone();

        let wrong_size = Refresh {
            weights: WeightTable::uniform(39).unwrap(),
            primed: None,
        };
        assert!(seq.apply_refresh(wrong_size).is_err());

        let bad_primed = Refresh {
            weights: WeightTable::new(40, 2).unwrap(),
            primed: Some(41),
        };
        assert_eq!(
            seq.apply_refresh(bad_primed),
            Err(DrawError::ItemOutOfRange { item: 41, universe: 40 })
        );
        assert_eq!(seq.weights(), &before);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut seq = sequencer(10, 14);
        let whitelist = Whitelist::full(10);
        for _ in 0..4 {
            seq.draw_without_repetition(&whitelist).unwrap();
        }
        seq.reset();
        assert!(seq.regular_history().is_empty());
        assert!(seq.cycle_history().is_empty());
        assert!(seq.current_cycle().is_empty());
    }

    #[test]
    fn test_seeded_sequencers_agree() {
        let mut a = sequencer(40, 77);
        let mut b = sequencer(40, 77);
        let whitelist = Whitelist::from_items(40, 1..=29).unwrap();
        for mode in [DrawMode::Unconstrained, DrawMode::Regular, DrawMode::WithoutRepetition] {
            for _ in 0..30 {
                assert_eq!(a.draw(mode, &whitelist), b.draw(mode, &whitelist));
            }
        }
    }

    #[test]
    fn test_draw_mode_display() {
        assert_eq!(DrawMode::WithoutRepetition.to_string(), "without-repetition");
        assert_eq!(DrawMode::default(), DrawMode::WithoutRepetition);
    }
}
