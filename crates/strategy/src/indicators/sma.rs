/// SMA (Simple Moving Average) indicator.
///
/// Unweighted arithmetic mean of the most recent `period` values.
/// Returns `None` until at least `period` values are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    /// Compute the SMA over the tail of `values` (oldest first).
    pub fn compute(&self, values: &[f64]) -> Option<f64> {
        self.compute_newest_first(values.iter().rev().copied())
    }

    /// Compute the SMA from values yielded newest first. Only the first
    /// `period` items are consumed, so callers can pass a reversed view of
    /// a larger buffer without copying it.
    pub fn compute_newest_first<I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let (count, sum) = values
            .into_iter()
            .take(self.period)
            .fold((0usize, 0.0), |(n, acc), v| (n + 1, acc + v));
        (count == self.period).then(|| sum / self.period as f64)
    }
}
