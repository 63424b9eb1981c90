//! Daily order-number sequence
//!
//! Process-local counter, seeded from the store on first use and on
//! UTC-date rollover, then incremented under the intake mutex. A
//! multi-instance deployment additionally relies on the unique
//! constraint on `orders.number`: on a conflict the counter is reset
//! and reseeded from the store (see `services::intake`).

use chrono::NaiveDate;

#[derive(Debug, Default)]
pub struct OrderSequence {
    date: Option<NaiveDate>,
    counter: u32,
}

impl OrderSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the counter has never been seeded for `today`
    /// (startup or day rollover).
    pub fn needs_seed(&self, today: NaiveDate) -> bool {
        self.date != Some(today)
    }

    /// Seed the counter with the highest sequence already used today.
    pub fn seed(&mut self, today: NaiveDate, last_used: u32) {
        self.date = Some(today);
        self.counter = last_used;
    }

    /// Next sequence number for `today`; restarts at 1 on rollover.
    ///
    /// Callers must seed first when [`needs_seed`](Self::needs_seed)
    /// is true, otherwise the counter silently restarts from 1.
    pub fn next(&mut self, today: NaiveDate) -> u32 {
        if self.date != Some(today) {
            self.date = Some(today);
            self.counter = 0;
        }
        self.counter += 1;
        self.counter
    }

    /// Drop the seed so the next allocation reseeds from the store.
    pub fn reset(&mut self) {
        self.date = None;
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn test_starts_at_one_when_unseeded() {
        let mut seq = OrderSequence::new();
        assert!(seq.needs_seed(day(7)));
        seq.seed(day(7), 0);
        assert_eq!(seq.next(day(7)), 1);
        assert_eq!(seq.next(day(7)), 2);
    }

    #[test]
    fn test_seed_continues_from_persisted_count() {
        let mut seq = OrderSequence::new();
        seq.seed(day(7), 41);
        assert_eq!(seq.next(day(7)), 42);
    }

    #[test]
    fn test_day_rollover_restarts_at_one() {
        let mut seq = OrderSequence::new();
        seq.seed(day(7), 99);
        assert_eq!(seq.next(day(7)), 100);
        // next calendar day: counter restarts and needs a fresh seed
        assert!(seq.needs_seed(day(8)));
        assert_eq!(seq.next(day(8)), 1);
    }

    #[test]
    fn test_reset_forces_reseed() {
        let mut seq = OrderSequence::new();
        seq.seed(day(7), 5);
        seq.reset();
        assert!(seq.needs_seed(day(7)));
    }
}
