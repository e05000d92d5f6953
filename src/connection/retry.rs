//! Bounded reconnect budget

/// Connect attempts left for the current drop sequence.
///
/// Every failed attempt counts, including the one that opened the sequence, so a
/// capacity of five means five connector calls before giving up. Refilled whenever
/// a registration succeeds or the caller connects manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
    capacity: u32,
}

impl RetryBudget {
    pub fn new(capacity: u32) -> Self {
        Self { remaining: capacity, capacity }
    }

    /// Charge one failed attempt. Returns the attempts left when another one is
    /// allowed, or `None` once the budget is spent.
    pub fn take(&mut self) -> Option<u32> {
        self.remaining = self.remaining.saturating_sub(1);
        (self.remaining > 0).then_some(self.remaining)
    }

    pub fn refill(&mut self) {
        self.remaining = self.capacity;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fifth_failure_exhausts() {
        let mut budget = RetryBudget::new(5);
        let taken: Vec<_> = std::iter::from_fn(|| budget.take()).collect();
        assert_eq!(taken, vec![4, 3, 2, 1]);
        assert!(budget.is_exhausted());
        assert_eq!(budget.take(), None);
    }

    #[test]
    fn refill_restores_capacity() {
        let mut budget = RetryBudget::new(3);
        budget.take();
        budget.take();
        budget.refill();
        assert_eq!(budget.remaining(), 3);
    }

    #[test]
    fn single_attempt_never_retries() {
        assert_eq!(RetryBudget::new(1).take(), None);
        assert_eq!(RetryBudget::new(0).take(), None);
    }

    proptest! {
        #[test]
        fn prop_one_attempt_per_unit(capacity in 0u32..64) {
            let mut budget = RetryBudget::new(capacity);
            let retries = std::iter::from_fn(|| budget.take()).count() as u32;
            // The opening attempt plus every granted retry.
            prop_assert_eq!(retries + 1, capacity.max(1));
            prop_assert_eq!(budget.capacity(), capacity);
        }
    }
}
