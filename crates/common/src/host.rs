use crate::{PnlReport, Result};

/// Outbound contract the strategy calls into: the host engine's signal sink
/// and P&L accounting.
///
/// `PaperHost` in `crates/paper` implements this for simulation. Calls are
/// fire-and-forget from the strategy's point of view, but any error is
/// returned to whoever drove the callback. The strategy never retries.
pub trait ExecutionHost: Send + Sync {
    /// Register a buy intent with normalized `strength` in `[0, 1]`.
    fn signal_buy(&self, strategy_id: &str, instrument: &str, strength: f64) -> Result<()>;

    /// Register a sell intent with normalized `strength` in `[0, 1]`.
    fn signal_sell(&self, strategy_id: &str, instrument: &str, strength: f64) -> Result<()>;

    /// Realized and unrealized P&L the host attributes to this strategy.
    fn pnl_report(&self, strategy_id: &str) -> Result<PnlReport>;

    /// Total P&L the host attributes to this strategy.
    fn strategy_pnl(&self, strategy_id: &str) -> Result<f64> {
        Ok(self.pnl_report(strategy_id)?.total())
    }
}
