use std::collections::HashMap;

use common::{Error, Result, Side};

/// Signed net quantity per instrument, driven only by fills.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<String, f64>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instrument at zero if it has not been seen yet.
    pub fn ensure(&mut self, instrument: &str) {
        if !self.positions.contains_key(instrument) {
            self.positions.insert(instrument.to_string(), 0.0);
        }
    }

    /// Apply a fill and return the resulting net position.
    ///
    /// Unknown instruments start at zero. Negative or non-finite quantities
    /// are rejected and leave the book untouched.
    pub fn apply_fill(&mut self, instrument: &str, side: Side, quantity: f64) -> Result<f64> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(Error::InvalidQuantity(quantity));
        }
        let position = self
            .positions
            .entry(instrument.to_string())
            .or_insert(0.0);
        *position += side.sign() * quantity;
        Ok(*position)
    }

    /// Net position, zero for instruments never seen.
    pub fn get(&self, instrument: &str) -> f64 {
        self.positions.get(instrument).copied().unwrap_or(0.0)
    }

    /// Owned copy; mutating it does not touch the book.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.positions.clone()
    }
}
