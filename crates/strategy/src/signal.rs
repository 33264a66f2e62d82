use serde::{Deserialize, Serialize};

use common::Side;

/// Last direction actually emitted for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastSignal {
    #[default]
    None,
    Buy,
    Sell,
}

impl From<Side> for LastSignal {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => LastSignal::Buy,
            Side::Sell => LastSignal::Sell,
        }
    }
}

/// Short and long averages computed on one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossover {
    pub short_sma: f64,
    pub long_sma: f64,
}

impl Crossover {
    /// Crossover decision with hysteresis.
    ///
    /// Bullish regime emits a buy unless a buy was the last signal or the
    /// position is already long. Bearish regime emits a sell unless a sell
    /// was the last signal or the position is already short. Equal averages
    /// never emit.
    pub fn decide(&self, last: LastSignal, position: f64) -> Option<Side> {
        if self.short_sma > self.long_sma {
            (last != LastSignal::Buy && position <= 0.0).then_some(Side::Buy)
        } else if self.short_sma < self.long_sma {
            (last != LastSignal::Sell && position >= 0.0).then_some(Side::Sell)
        } else {
            None
        }
    }
}
