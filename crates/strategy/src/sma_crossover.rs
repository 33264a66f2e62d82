use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use common::{ExecutionHost, Fill, Quote, Result, RiskNotice, Side, Signal};

use crate::config::SmaCrossoverConfig;
use crate::history::PriceHistory;
use crate::position::PositionBook;
use crate::signal::{Crossover, LastSignal};
use crate::{PerformanceSummary, Strategy};

/// Every emitted signal carries full strength.
pub const SIGNAL_STRENGTH: f64 = 1.0;

#[derive(Debug, Clone)]
struct InstrumentState {
    history: PriceHistory,
    last_signal: LastSignal,
}

/// Dual simple-moving-average crossover with position-aware hysteresis.
///
/// Keeps a bounded mid-price history and the last emitted direction per
/// instrument, plus a fill-driven position book. Entry points run to
/// completion; callers must serialize them (see `engine::Engine`).
pub struct SmaCrossover {
    id: String,
    config: SmaCrossoverConfig,
    host: Arc<dyn ExecutionHost>,
    instruments: HashMap<String, InstrumentState>,
    positions: PositionBook,
    fill_count: u64,
}

impl SmaCrossover {
    pub fn new(
        id: impl Into<String>,
        config: SmaCrossoverConfig,
        host: Arc<dyn ExecutionHost>,
    ) -> Result<Self> {
        config.validate()?;
        let id = id.into();
        info!(
            strategy = %id,
            short_period = config.short_period,
            long_period = config.long_period,
            "Initialized SMA crossover strategy"
        );
        Ok(Self {
            id,
            config,
            host,
            instruments: HashMap::new(),
            positions: PositionBook::new(),
            fill_count: 0,
        })
    }

    pub fn config(&self) -> &SmaCrossoverConfig {
        &self.config
    }

    /// Append a mid-price to the instrument's history, creating the
    /// instrument's state (empty history, flat position, no last signal) on
    /// first sight. Returns the updated history.
    pub fn record_price(&mut self, instrument: &str, mid_price: f64) -> &PriceHistory {
        let capacity = self.config.capacity();
        let positions = &mut self.positions;
        let state = self
            .instruments
            .entry(instrument.to_string())
            .or_insert_with(|| {
                positions.ensure(instrument);
                InstrumentState {
                    history: PriceHistory::with_capacity(capacity),
                    last_signal: LastSignal::None,
                }
            });
        state.history.push(mid_price);
        &state.history
    }

    /// Compute both averages once `long_period` prices are held.
    pub fn crossover(&self, instrument: &str) -> Option<Crossover> {
        let history = &self.instruments.get(instrument)?.history;
        if history.len() < self.config.long_period {
            return None;
        }
        // With short_period > long_period the fast window is not full yet
        // right after warm-up; average what is there.
        let short_sma = history.sma(self.config.short_period.min(history.len()))?;
        let long_sma = history.sma(self.config.long_period)?;
        Some(Crossover { short_sma, long_sma })
    }

    /// Decide and, if warranted, emit a signal for `instrument`.
    ///
    /// Nothing is mutated during warm-up or when the decision is to hold.
    /// The last-signal state only changes once the host accepted the signal.
    pub fn evaluate(&mut self, instrument: &str) -> Result<Option<Signal>> {
        let Some(crossover) = self.crossover(instrument) else {
            return Ok(None);
        };
        let last = self.last_signal(instrument);
        let position = self.positions.get(instrument);

        let Some(side) = crossover.decide(last, position) else {
            return Ok(None);
        };

        match side {
            Side::Buy => self.host.signal_buy(&self.id, instrument, SIGNAL_STRENGTH)?,
            Side::Sell => self.host.signal_sell(&self.id, instrument, SIGNAL_STRENGTH)?,
        }
        if let Some(state) = self.instruments.get_mut(instrument) {
            state.last_signal = side.into();
        }
        debug!(
            strategy = %self.id,
            instrument = %instrument,
            side = %side,
            short_sma = crossover.short_sma,
            long_sma = crossover.long_sma,
            "Signal emitted"
        );

        Ok(Some(Signal {
            strategy_id: self.id.clone(),
            instrument: instrument.to_string(),
            side,
            strength: SIGNAL_STRENGTH,
        }))
    }

    /// Fill entry point taking the side as text (`buy`/`sell`, any case).
    pub fn apply_fill(
        &mut self,
        instrument: &str,
        side: &str,
        quantity: f64,
        price: f64,
    ) -> Result<f64> {
        let side: Side = side.parse()?;
        self.record_fill(instrument, side, quantity, price)
    }

    fn record_fill(&mut self, instrument: &str, side: Side, quantity: f64, price: f64) -> Result<f64> {
        let position = self.positions.apply_fill(instrument, side, quantity)?;
        self.fill_count += 1;
        let pnl = self.host.pnl_report(&self.id)?;
        info!(
            strategy = %self.id,
            instrument = %instrument,
            side = %side,
            quantity = quantity,
            price = price,
            position = position,
            realized_pnl = pnl.realized,
            unrealized_pnl = pnl.unrealized,
            "Fill applied"
        );
        Ok(position)
    }

    pub fn position(&self, instrument: &str) -> f64 {
        self.positions.get(instrument)
    }

    pub fn last_signal(&self, instrument: &str) -> LastSignal {
        self.instruments
            .get(instrument)
            .map(|s| s.last_signal)
            .unwrap_or_default()
    }

    pub fn price_history(&self, instrument: &str) -> Option<&PriceHistory> {
        self.instruments.get(instrument).map(|s| &s.history)
    }
}

impl Strategy for SmaCrossover {
    fn id(&self) -> &str {
        &self.id
    }

    fn initialize(&mut self) -> Result<()> {
        info!(strategy = %self.id, "Strategy initialization complete");
        Ok(())
    }

    fn on_market_data(&mut self, quote: &Quote) -> Result<Option<Signal>> {
        self.record_price(&quote.instrument, quote.mid());
        self.evaluate(&quote.instrument)
    }

    fn on_fill(&mut self, fill: &Fill) -> Result<f64> {
        self.record_fill(&fill.instrument, fill.side, fill.quantity, fill.price)
    }

    fn on_risk_event(&mut self, notice: &RiskNotice) {
        warn!(
            strategy = %self.id,
            risk_type = %notice.risk_type,
            message = %notice.message,
            "Risk event"
        );
    }

    fn positions(&self) -> HashMap<String, f64> {
        self.positions.snapshot()
    }

    fn performance_summary(&self) -> Result<PerformanceSummary> {
        let pnl = self.host.pnl_report(&self.id)?;
        Ok(PerformanceSummary {
            strategy_id: self.id.clone(),
            total_pnl: pnl.total(),
            realized_pnl: pnl.realized,
            unrealized_pnl: pnl.unrealized,
            positions: self.positions(),
            parameters: serde_json::json!({
                "short_period": self.config.short_period,
                "long_period": self.config.long_period,
            }),
            fill_count: self.fill_count,
        })
    }
}
