//! Lookahead buffer of raw weighted draws
//!
//! The buffer holds weighted draws over the *full universe*, not yet
//! filtered by any whitelist. Consumers take items from the head and discard the
//! ones they cannot use (see [`WeightedPool`](super::weighted::WeightedPool)).
//!
//! # Refill
//!
//! Before every dequeue the buffer is topped up to its target depth using the
//! weight table passed in at that moment. Entries already queued keep the weights
//! they were drawn with, so a weight change takes full effect only after `depth`
//! further dequeues.
//!
//! # Priming
//!
//! A remote entropy source may supply the next value to hand out. [`prime`]
//! overwrites the current head rather than queueing behind it.
//!
//! [`prime`]: PrefetchBuffer::prime

use super::weights::WeightTable;
use crate::whitelist::Item;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::VecDeque;

/// Default lookahead depth of a draw sequencer
pub const DEFAULT_PREFETCH_DEPTH: usize = 20;

/// Queue of pre-drawn raw items
pub struct PrefetchBuffer {
    queue: VecDeque<Item>,
    depth: usize,
    avoid_adjacent_repeats: bool,
    last_queued: Option<Item>,
    rng: Xoshiro256PlusPlus,
}

impl PrefetchBuffer {
    /// Create an empty buffer refilled to `depth` entries
    pub fn new(depth: usize, rng: Xoshiro256PlusPlus) -> Self {
        Self {
            queue: VecDeque::with_capacity(depth),
            depth: depth.max(1),
            avoid_adjacent_repeats: false,
            last_queued: None,
            rng,
        }
    }

    /// Never queue the same item twice in a row
    ///
    /// Used by the entropy service, whose buffer is handed out without any
    /// sequencer-side repetition check.
    pub fn with_adjacent_repeats_avoided(mut self) -> Self {
        self.avoid_adjacent_repeats = true;
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Next item to be dequeued, without consuming it
    pub fn peek(&self) -> Option<Item> {
        self.queue.front().copied()
    }

    /// Queued items, head first
    pub fn iter(&self) -> impl Iterator<Item = Item> + '_ {
        self.queue.iter().copied()
    }

    /// Top the queue up to its target depth
    pub fn reserve(&mut self, weights: &WeightTable) {
        if self.queue.len() >= self.depth {
            return;
        }

        let distinct = weights.universe_size() > 1;

        while self.queue.len() < self.depth {
            let mut item = weights.sample(&mut self.rng);
            if self.avoid_adjacent_repeats && distinct {
                while Some(item) == self.last_queued {
                    item = weights.sample(&mut self.rng);
                }
            }
            self.queue.push_back(item);
            self.last_queued = Some(item);
        }
    }

    /// Dequeue the head, refilling first if the buffer is below depth
    pub fn pop(&mut self, weights: &WeightTable) -> Option<Item> {
        self.reserve(weights);
        self.queue.pop_front()
    }

    /// Replace the head with `item`
    pub fn prime(&mut self, item: Item) {
        match self.queue.front_mut() {
            Some(head) => *head = item,
            None => {
                self.queue.push_back(item);
                self.last_queued = Some(item);
            }
        }
    }
}
