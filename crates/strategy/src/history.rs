use std::collections::VecDeque;

use crate::indicators::SmaIndicator;

/// Bounded FIFO of the most recent mid-prices for one instrument.
///
/// Holds at most `capacity` entries. Pushing onto a full buffer evicts the
/// oldest entry, so the contents are always the latest `capacity`
/// observations in arrival order.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    /// `capacity` only bounds the buffer; storage grows with the prices
    /// actually pushed.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 1, "PriceHistory capacity must be >= 1");
        Self {
            prices: VecDeque::new(),
            capacity,
        }
    }

    /// Append a price, evicting the oldest one when full.
    pub fn push(&mut self, price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.prices.iter()
    }

    /// Copy of the buffer, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }

    /// Mean of the latest `period` prices, `None` if fewer are held.
    pub fn sma(&self, period: usize) -> Option<f64> {
        SmaIndicator::new(period).compute_newest_first(self.prices.iter().rev().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut h = PriceHistory::with_capacity(3);
        h.push(1.0);
        h.push(2.0);
        assert_eq!(h.len(), 2);
        assert_eq!(h.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn push_beyond_capacity_evicts_oldest() {
        let mut h = PriceHistory::with_capacity(3);
        for p in [1.0, 2.0, 3.0, 4.0, 5.0] {
            h.push(p);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn sma_over_wrapped_buffer() {
        let mut h = PriceHistory::with_capacity(3);
        for p in [1.0, 2.0, 3.0, 4.0] {
            h.push(p);
        }
        assert_eq!(h.sma(2), Some(3.5));
        assert_eq!(h.sma(3), Some(3.0));
        assert_eq!(h.sma(4), None);
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut h = PriceHistory::with_capacity(usize::MAX);
        h.push(1.0);
        h.push(2.0);
        assert_eq!(h.capacity(), usize::MAX);
        assert_eq!(h.to_vec(), vec![1.0, 2.0]);
        assert_eq!(h.sma(2), Some(1.5));
    }
}
