//! Identity generation for gtd records
//!
//! Each table owns a monotonic "next id" counter. Counters only move
//! forward, so an id is never handed out twice, even after an import that
//! brought in explicit ids.

use serde::{Deserialize, Serialize};

/// Per-table id counter, serialized as the next id to hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdCounter(u64);

impl Default for IdCounter {
    fn default() -> Self {
        Self(1)
    }
}

impl IdCounter {
    pub fn starting_at(next: u64) -> Self {
        Self(next.max(1))
    }

    /// The id the next call to [`IdCounter::generate`] returns
    pub fn peek(&self) -> u64 {
        self.0
    }

    /// Hand out an id and advance
    ///
    /// Returns `None` once the id space is used up: the counter stops at
    /// `u64::MAX` and never hands that value out, so an id already stored
    /// there cannot be issued again.
    pub fn generate(&mut self) -> Option<u64> {
        let id = self.0;
        self.0 = self.0.checked_add(1)?;
        Some(id)
    }

    /// Make sure every future id is greater than `max_id`
    ///
    /// `next = max(next, max_id + 1)`; never decreases.
    pub fn advance_past(&mut self, max_id: u64) {
        self.0 = self.0.max(max_id.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_sequential() {
        let mut counter = IdCounter::default();
        assert_eq!(counter.generate(), Some(1));
        assert_eq!(counter.generate(), Some(2));
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn test_exhausted_counter_hands_out_nothing() {
        let mut counter = IdCounter::default();
        counter.advance_past(u64::MAX);
        assert_eq!(counter.peek(), u64::MAX);
        assert_eq!(counter.generate(), None);
        assert_eq!(counter.generate(), None);

        let mut counter = IdCounter::starting_at(u64::MAX - 1);
        assert_eq!(counter.generate(), Some(u64::MAX - 1));
        assert_eq!(counter.generate(), None);
    }

    #[test]
    fn test_advance_past_never_decreases() {
        let mut counter = IdCounter::starting_at(10);
        counter.advance_past(4);
        assert_eq!(counter.peek(), 10);

        counter.advance_past(41);
        assert_eq!(counter.peek(), 42);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let counter = IdCounter::starting_at(5);
        assert_eq!(serde_json::to_string(&counter).unwrap(), "5");
    }
}
