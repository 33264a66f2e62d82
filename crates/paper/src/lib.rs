use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use common::{Error, ExecutionHost, Fill, PnlReport, Result, Side, Signal};

/// Fee charged on every simulated fill. Paper fills always take liquidity,
/// so only the taker rate applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionSchedule {
    /// Fraction of notional, e.g. `0.001` for 10 bps.
    pub taker_rate: f64,
    pub fixed_fee: f64,
    pub min_commission: f64,
    pub max_commission: f64,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            taker_rate: 0.0,
            fixed_fee: 0.0,
            min_commission: 0.0,
            max_commission: f64::INFINITY,
        }
    }
}

impl CommissionSchedule {
    pub fn new(
        taker_rate: f64,
        fixed_fee: f64,
        min_commission: f64,
        max_commission: f64,
    ) -> Result<Self> {
        for (name, value) in [
            ("taker_rate", taker_rate),
            ("fixed_fee", fixed_fee),
            ("min_commission", min_commission),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "commission {name} must be non-negative, got {value}"
                )));
            }
        }
        if max_commission.is_nan() || max_commission < min_commission {
            return Err(Error::Config(format!(
                "max commission {max_commission} is below min commission {min_commission}"
            )));
        }
        Ok(Self {
            taker_rate,
            fixed_fee,
            min_commission,
            max_commission,
        })
    }

    /// `quantity * price * taker_rate + fixed_fee`, clamped to
    /// `[min_commission, max_commission]`.
    pub fn commission(&self, quantity: f64, price: f64) -> f64 {
        (quantity * price * self.taker_rate + self.fixed_fee)
            .max(self.min_commission)
            .min(self.max_commission)
    }
}

/// Per (strategy, instrument) holdings as the host sees them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    /// Signed net quantity.
    pub quantity: f64,
    /// Average entry price of the open quantity.
    pub average_price: f64,
    /// Net of commission.
    pub realized_pnl: f64,
    pub commission_paid: f64,
    /// Gross P&L of every closing or reducing trade, oldest first.
    pub closed_trades: Vec<f64>,
}

impl Ledger {
    /// Book a trade. Reducing or flipping trades realize P&L against the
    /// average entry; the part that flips opens at the trade price.
    /// Returns the gross P&L closed by this trade, if it closed anything.
    fn apply(&mut self, side: Side, quantity: f64, price: f64, commission: f64) -> Option<f64> {
        if quantity == 0.0 {
            return None;
        }
        self.commission_paid += commission;
        self.realized_pnl -= commission;

        let signed = side.sign() * quantity;
        if self.quantity == 0.0 || self.quantity.signum() == signed.signum() {
            let total = self.quantity + signed;
            self.average_price =
                (self.average_price * self.quantity.abs() + price * quantity) / total.abs();
            self.quantity = total;
            return None;
        }

        let closing = quantity.min(self.quantity.abs());
        let trade_pnl = (price - self.average_price) * closing * self.quantity.signum();
        self.realized_pnl += trade_pnl;
        self.closed_trades.push(trade_pnl);
        let remaining = self.quantity + signed;
        if remaining == 0.0 {
            self.average_price = 0.0;
        } else if remaining.signum() != self.quantity.signum() {
            self.average_price = price;
        }
        self.quantity = remaining;
        Some(trade_pnl)
    }

    fn unrealized_pnl(&self, mark: f64) -> f64 {
        (mark - self.average_price) * self.quantity
    }

    pub fn trade_stats(&self, initial_equity: f64) -> TradeStats {
        TradeStats::from_trades(&self.closed_trades, initial_equity)
    }
}

/// Round-trip metrics over closed trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub closed_trades: usize,
    pub average_trade_pnl: f64,
    /// Share of closed trades with positive P&L, in `[0, 1]`.
    pub win_rate: f64,
    /// Largest peak-to-trough fall of the closed-trade equity curve, as a
    /// fraction of the peak.
    pub max_drawdown: f64,
}

impl TradeStats {
    /// `initial_equity` must be positive; the equity curve starts there.
    pub fn from_trades(trades: &[f64], initial_equity: f64) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let count = trades.len() as f64;
        let wins = trades.iter().filter(|pnl| **pnl > 0.0).count();

        let mut equity = initial_equity;
        let mut peak = initial_equity;
        let mut max_drawdown: f64 = 0.0;
        for pnl in trades {
            equity += pnl;
            peak = peak.max(equity);
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - equity) / peak);
            }
        }

        Self {
            closed_trades: trades.len(),
            average_trade_pnl: trades.iter().sum::<f64>() / count,
            win_rate: wins as f64 / count,
            max_drawdown,
        }
    }
}

/// End-of-run accounting for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperReport {
    pub pnl: PnlReport,
    pub trades: TradeStats,
    pub total_commission: f64,
}

#[derive(Debug, Default)]
struct PaperState {
    /// Latest known mid per instrument, updated via `update_price`.
    prices: HashMap<String, f64>,
    ledgers: HashMap<(String, String), Ledger>,
    /// Closed-trade P&L per strategy across all instruments, oldest first.
    trade_log: HashMap<String, Vec<f64>>,
    signals: Vec<Signal>,
    pending_fills: Vec<Fill>,
}

/// Simulated execution host for paper trading.
///
/// Every signal is filled immediately for a fixed order quantity at the
/// latest mid with configurable slippage and commission. Fills are queued
/// until the caller collects them with `drain_fills` and forwards them to
/// the strategy. No real orders are ever sent anywhere.
pub struct PaperHost {
    state: Mutex<PaperState>,
    /// Quantity traded per signal.
    order_quantity: f64,
    /// Slippage in basis points applied to all fills.
    slippage_bps: f64,
    commission: CommissionSchedule,
    /// Starting point of the equity curve used for drawdown.
    initial_equity: f64,
}

impl PaperHost {
    pub const DEFAULT_INITIAL_EQUITY: f64 = 10_000.0;

    pub fn new(order_quantity: f64, slippage_bps: f64) -> Self {
        info!(
            order_quantity = order_quantity,
            slippage_bps = slippage_bps,
            "PaperHost initialized"
        );
        Self {
            state: Mutex::new(PaperState::default()),
            order_quantity,
            slippage_bps,
            commission: CommissionSchedule::default(),
            initial_equity: Self::DEFAULT_INITIAL_EQUITY,
        }
    }

    pub fn with_commission(mut self, commission: CommissionSchedule) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_initial_equity(mut self, initial_equity: f64) -> Self {
        self.initial_equity = initial_equity;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, PaperState>> {
        self.state
            .lock()
            .map_err(|_| Error::Host("paper host state poisoned".into()))
    }

    /// Update the latest mid for an instrument (called for every quote).
    pub fn update_price(&self, instrument: &str, mid: f64) -> Result<()> {
        self.lock()?.prices.insert(instrument.to_string(), mid);
        Ok(())
    }

    /// Take all simulated fills produced since the last call, oldest first.
    pub fn drain_fills(&self) -> Result<Vec<Fill>> {
        Ok(std::mem::take(&mut self.lock()?.pending_fills))
    }

    /// Every signal received so far, in arrival order.
    pub fn signals(&self) -> Result<Vec<Signal>> {
        Ok(self.lock()?.signals.clone())
    }

    pub fn ledger(&self, strategy_id: &str, instrument: &str) -> Result<Ledger> {
        Ok(self
            .lock()?
            .ledgers
            .get(&(strategy_id.to_string(), instrument.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    /// Closed-trade metrics for a strategy across all its instruments.
    pub fn trade_stats(&self, strategy_id: &str) -> Result<TradeStats> {
        let state = self.lock()?;
        let trades = state
            .trade_log
            .get(strategy_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(TradeStats::from_trades(trades, self.initial_equity))
    }

    pub fn report(&self, strategy_id: &str) -> Result<PaperReport> {
        let pnl = self.pnl_report(strategy_id)?;
        let trades = self.trade_stats(strategy_id)?;
        let total_commission: f64 = self
            .lock()?
            .ledgers
            .iter()
            .filter(|((id, _), _)| id == strategy_id)
            .map(|(_, ledger)| ledger.commission_paid)
            .sum();
        Ok(PaperReport {
            pnl,
            trades,
            total_commission,
        })
    }

    fn execute(&self, strategy_id: &str, instrument: &str, side: Side, strength: f64) -> Result<()> {
        let mut state = self.lock()?;
        let mid = state.prices.get(instrument).copied().ok_or_else(|| {
            Error::Host(format!(
                "PaperHost has no price for '{instrument}'. Ensure market data is flowing."
            ))
        })?;

        // Buys pay more, sells receive less
        let fill_price = match side {
            Side::Buy => mid * (1.0 + self.slippage_bps / 10_000.0),
            Side::Sell => mid * (1.0 - self.slippage_bps / 10_000.0),
        };
        let commission = self.commission.commission(self.order_quantity, fill_price);

        state.signals.push(Signal {
            strategy_id: strategy_id.to_string(),
            instrument: instrument.to_string(),
            side,
            strength,
        });
        let closed = state
            .ledgers
            .entry((strategy_id.to_string(), instrument.to_string()))
            .or_default()
            .apply(side, self.order_quantity, fill_price, commission);
        if let Some(trade_pnl) = closed {
            state
                .trade_log
                .entry(strategy_id.to_string())
                .or_default()
                .push(trade_pnl);
        }
        state.pending_fills.push(Fill {
            order_id: Some(uuid::Uuid::new_v4().to_string()),
            instrument: instrument.to_string(),
            side,
            quantity: self.order_quantity,
            price: fill_price,
            timestamp: Utc::now(),
        });

        debug!(
            strategy = %strategy_id,
            instrument = %instrument,
            side = %side,
            mid = mid,
            fill = fill_price,
            qty = self.order_quantity,
            commission = commission,
            closed_pnl = ?closed,
            "Paper fill simulated"
        );
        Ok(())
    }
}

impl ExecutionHost for PaperHost {
    fn signal_buy(&self, strategy_id: &str, instrument: &str, strength: f64) -> Result<()> {
        self.execute(strategy_id, instrument, Side::Buy, strength)
    }

    fn signal_sell(&self, strategy_id: &str, instrument: &str, strength: f64) -> Result<()> {
        self.execute(strategy_id, instrument, Side::Sell, strength)
    }

    /// Open quantity is marked at the latest mid.
    fn pnl_report(&self, strategy_id: &str) -> Result<PnlReport> {
        let state = self.lock()?;
        let report = state
            .ledgers
            .iter()
            .filter(|((id, _), _)| id == strategy_id)
            .fold(PnlReport::default(), |acc, ((_, instrument), ledger)| {
                let mark = state
                    .prices
                    .get(instrument)
                    .copied()
                    .unwrap_or(ledger.average_price);
                PnlReport {
                    realized: acc.realized + ledger.realized_pnl,
                    unrealized: acc.unrealized + ledger.unrealized_pnl(mark),
                }
            });
        Ok(report)
    }
}
