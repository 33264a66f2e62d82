pub mod config;
pub mod factory;
pub mod history;
pub mod indicators;
pub mod position;
pub mod signal;
pub mod sma_crossover;

pub use config::{SmaCrossoverConfig, StrategyConfig, StrategyFileConfig};
pub use factory::{build_strategy, create_sma_crossover};
pub use history::PriceHistory;
pub use position::PositionBook;
pub use signal::{Crossover, LastSignal};
pub use sma_crossover::SmaCrossover;

use std::collections::HashMap;

use serde::Serialize;

use common::{Fill, Quote, Result, RiskNotice, Signal};

/// All strategy implementations must satisfy this trait.
///
/// The host calls these entry points one at a time; none of them blocks or
/// suspends.
pub trait Strategy: Send {
    /// Identifier used towards the host and in logs.
    fn id(&self) -> &str;

    /// One-time setup hook, called before any other callback.
    fn initialize(&mut self) -> Result<()>;

    /// Record the quote and emit at most one signal.
    fn on_market_data(&mut self, quote: &Quote) -> Result<Option<Signal>>;

    /// Apply a fill and return the instrument's new net position.
    fn on_fill(&mut self, fill: &Fill) -> Result<f64>;

    /// Diagnostic pass-through, no state change.
    fn on_risk_event(&mut self, notice: &RiskNotice);

    /// Copy of the current net positions.
    fn positions(&self) -> HashMap<String, f64>;

    fn performance_summary(&self) -> Result<PerformanceSummary>;
}

/// Point-in-time report combining host P&L with strategy state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub strategy_id: String,
    pub total_pnl: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub positions: HashMap<String, f64>,
    pub parameters: serde_json::Value,
    /// Number of fills applied since construction.
    pub fill_count: u64,
}
