use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Top-of-book quote for one instrument, pushed by the host on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub bid_price: f64,
    pub ask_price: f64,
    /// Accepted for diagnostics only; signal logic runs on the mid-price.
    pub last_price: f64,
}

impl Quote {
    pub fn new(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        bid_price: f64,
        ask_price: f64,
        last_price: f64,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            bid_price,
            ask_price,
            last_price,
        }
    }

    /// Average of bid and ask.
    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }
}

/// Direction of a signal or a fill. Serialized as `BUY`/`SELL`, parsed
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    /// Case-insensitive. Anything other than `buy` or `sell` is rejected
    /// rather than guessed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(Error::UnknownSide(s.to_string())),
        }
    }
}

impl TryFrom<String> for Side {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Side> for String {
    fn from(side: Side) -> Self {
        side.to_string()
    }
}

/// Execution report delivered by the host after an order (or part of one) traded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Host-assigned order id, when the host has one.
    #[serde(default)]
    pub order_id: Option<String>,
    pub instrument: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    pub fn new(instrument: impl Into<String>, side: Side, quantity: f64, price: f64) -> Self {
        Self {
            order_id: None,
            instrument: instrument.into(),
            side,
            quantity,
            price,
            timestamp: Utc::now(),
        }
    }
}

/// A directional intent handed to the execution host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_id: String,
    pub instrument: String,
    pub side: Side,
    /// Normalized magnitude in `[0, 1]`.
    pub strength: f64,
}

/// Risk notification forwarded by the host. Opaque to the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskNotice {
    pub risk_type: String,
    pub message: String,
}

/// P&L the host attributes to one strategy, split by whether the
/// position behind it is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlReport {
    pub realized: f64,
    /// Open quantity marked at the latest price.
    pub unrealized: f64,
}

impl PnlReport {
    pub fn total(&self) -> f64 {
        self.realized + self.unrealized
    }
}

/// Everything the host can push into a strategy, as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    MarketData(Quote),
    Fill(Fill),
    Risk(RiskNotice),
}
