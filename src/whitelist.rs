//! Whitelist of items eligible for a draw
//!
//! The universe is the fixed ordered set of items `1..=N`. A [`Whitelist`] marks
//! which of them may be returned by the next draw. It is owned by the caller; the
//! sequencer clones it before excluding anything, so the caller's copy is never
//! modified by a draw.
//!
//! # Example
//!
//! ```
//! use dutydraw::whitelist::Whitelist;
//!
//! let mut whitelist = Whitelist::from_items(10, [1, 2, 3]).unwrap();
//! assert_eq!(whitelist.count(), 3);
//!
//! whitelist.toggle(2).unwrap();
//! assert!(!whitelist.contains(2));
//! assert!(whitelist.can_draw());
//! ```

use crate::error::DrawError;

/// A universe item, numbered from 1
pub type Item = u32;

/// Minimum number of eligible items for the draw trigger to be enabled
pub const MIN_DRAWABLE: usize = 2;

/// Eligibility flags for every item of the universe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Whitelist {
    slots: Vec<bool>,
}

impl Whitelist {
    /// Whitelist with no eligible item
    pub fn empty(universe: usize) -> Self {
        Self {
            slots: vec![false; universe],
        }
    }

    /// Whitelist with every item eligible
    pub fn full(universe: usize) -> Self {
        Self {
            slots: vec![true; universe],
        }
    }

    /// Build a whitelist from raw slot flags (slot 0 is item 1)
    pub fn from_slots(slots: Vec<bool>) -> Self {
        Self { slots }
    }

    /// Build a whitelist marking the given items eligible
    pub fn from_items<I>(universe: usize, items: I) -> Result<Self, DrawError>
    where
        I: IntoIterator<Item = Item>,
    {
        let mut whitelist = Self::empty(universe);
        for item in items {
            whitelist.set(item, true)?;
        }
        Ok(whitelist)
    }

    /// Size of the universe this whitelist covers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of eligible items
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|&&eligible| eligible).count()
    }

    /// Whether the draw trigger should be enabled for this whitelist
    pub fn can_draw(&self) -> bool {
        self.count() >= MIN_DRAWABLE
    }

    /// Whether `item` is eligible. Items outside the universe never are.
    pub fn contains(&self, item: Item) -> bool {
        self.slot(item).map_or(false, |index| self.slots[index])
    }

    /// Set the eligibility of a single item
    pub fn set(&mut self, item: Item, eligible: bool) -> Result<(), DrawError> {
        let index = self.checked_slot(item)?;
        self.slots[index] = eligible;
        Ok(())
    }

    /// Flip the eligibility of a single item
    pub fn toggle(&mut self, item: Item) -> Result<(), DrawError> {
        let index = self.checked_slot(item)?;
        self.slots[index] = !self.slots[index];
        Ok(())
    }

    /// Flip a contiguous run ending at `item`
    ///
    /// Every directly preceding item sharing `item`'s current state is flipped along
    /// with it; the walk stops at the first preceding item whose state differs, which
    /// is left untouched.
    pub fn toggle_run(&mut self, item: Item) -> Result<(), DrawError> {
        let index = self.checked_slot(item)?;
        let state = self.slots[index];

        let mut start = index;
        while start > 0 && self.slots[start - 1] == state {
            start -= 1;
        }
        for slot in &mut self.slots[start..=index] {
            *slot = !state;
        }
        Ok(())
    }

    /// Iterate over eligible items in ascending order
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, eligible)| **eligible)
            .map(|(index, _)| index as Item + 1)
    }

    /// Highest eligible item, if any
    pub fn max_item(&self) -> Option<Item> {
        self.slots
            .iter()
            .rposition(|&eligible| eligible)
            .map(|index| index as Item + 1)
    }

    /// Raw slot flags (slot 0 is item 1)
    pub fn as_slots(&self) -> &[bool] {
        &self.slots
    }

    fn slot(&self, item: Item) -> Option<usize> {
        let index = (item as usize).checked_sub(1)?;
        (index < self.slots.len()).then_some(index)
    }

    fn checked_slot(&self, item: Item) -> Result<usize, DrawError> {
        self.slot(item).ok_or(DrawError::ItemOutOfRange {
            item,
            universe: self.slots.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_items_and_count() {
        let whitelist = Whitelist::from_items(40, [1, 5, 40]).unwrap();
        assert_eq!(whitelist.len(), 40);
        assert_eq!(whitelist.count(), 3);
        assert_eq!(whitelist.items().collect::<Vec<_>>(), vec![1, 5, 40]);
        assert_eq!(whitelist.max_item(), Some(40));
    }

    #[test]
    fn test_out_of_range_items() {
        let mut whitelist = Whitelist::empty(5);
        assert_eq!(
            whitelist.set(0, true),
            Err(DrawError::ItemOutOfRange { item: 0, universe: 5 })
        );
        assert!(whitelist.toggle(6).is_err());
        assert!(!whitelist.contains(0));
        assert!(!whitelist.contains(6));
        assert!(Whitelist::from_items(5, [7]).is_err());
    }

    #[test]
    fn test_toggle() {
        let mut whitelist = Whitelist::full(3);
        whitelist.toggle(2).unwrap();
        assert_eq!(whitelist.as_slots(), &[true, false, true]);
        whitelist.toggle(2).unwrap();
        assert_eq!(whitelist.as_slots(), &[true, true, true]);
    }

    #[test]
    fn test_toggle_run_stops_at_differing_state() {
        // items: 1 2 3 4 5 6
        let mut whitelist = Whitelist::from_slots(vec![true, false, false, false, true, true]);
        whitelist.toggle_run(4).unwrap();
        // items 2..=4 shared item 4's state and flip; item 1 differs and stays
        assert_eq!(whitelist.as_slots(), &[true, true, true, true, true, true]);
    }

    #[test]
    fn test_toggle_run_reaches_first_item() {
        let mut whitelist = Whitelist::full(4);
        whitelist.toggle_run(3).unwrap();
        assert_eq!(whitelist.as_slots(), &[false, false, false, true]);
    }

    #[test]
    fn test_toggle_run_single_item() {
        let mut whitelist = Whitelist::from_slots(vec![false, true, false]);
        whitelist.toggle_run(3).unwrap();
        assert_eq!(whitelist.as_slots(), &[false, true, true]);
    }

    #[test]
    fn test_can_draw_needs_two_items() {
        let mut whitelist = Whitelist::empty(10);
        assert!(!whitelist.can_draw());
        whitelist.set(3, true).unwrap();
        assert!(!whitelist.can_draw());
        whitelist.set(4, true).unwrap();
        assert!(whitelist.can_draw());
    }

    #[test]
    fn test_empty_whitelist_has_no_max() {
        assert_eq!(Whitelist::empty(4).max_item(), None);
        assert!(Whitelist::empty(0).is_empty());
    }
}
