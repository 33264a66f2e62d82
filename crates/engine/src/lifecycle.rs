use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use common::{EngineEvent, Error, Result};
use paper::PaperHost;
use strategy::{PerformanceSummary, Strategy};

const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Cloneable handle for pushing events into a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    event_tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    /// Queue an event. Fails once the engine has stopped.
    pub async fn send(&self, event: EngineEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| Error::Host("engine is no longer accepting events".into()))
    }
}

/// Drives one strategy instance from a single event queue.
///
/// Events are handled strictly one at a time, so the strategy never sees
/// overlapping callbacks no matter how many handles feed the queue.
pub struct Engine {
    strategy: Box<dyn Strategy>,
    host: Arc<PaperHost>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl Engine {
    pub fn new(strategy: Box<dyn Strategy>, host: Arc<PaperHost>) -> (Self, EngineHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let engine = Engine {
            strategy,
            host,
            event_rx,
        };
        (engine, EngineHandle { event_tx })
    }

    /// Run until every handle is dropped, then return the final summary.
    /// The first strategy or host error stops the loop and is returned.
    pub async fn run(mut self) -> Result<PerformanceSummary> {
        self.strategy.initialize()?;
        info!(strategy = %self.strategy.id(), "Engine running");

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.dispatch(event) {
                error!(strategy = %self.strategy.id(), error = %e, "Event dispatch failed");
                return Err(e);
            }
        }

        warn!("Event channel closed, engine stopping");
        self.strategy.performance_summary()
    }

    /// Handle one event to completion, including any fills it caused.
    pub fn dispatch(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::MarketData(quote) => {
                self.host.update_price(&quote.instrument, quote.mid())?;
                if let Some(signal) = self.strategy.on_market_data(&quote)? {
                    info!(
                        instrument = %signal.instrument,
                        side = %signal.side,
                        timestamp = %quote.timestamp,
                        "Signal sent to host"
                    );
                }
                for fill in self.host.drain_fills()? {
                    self.strategy.on_fill(&fill)?;
                }
            }
            EngineEvent::Fill(fill) => {
                self.strategy.on_fill(&fill)?;
            }
            EngineEvent::Risk(notice) => {
                self.strategy.on_risk_event(&notice);
            }
        }
        Ok(())
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }
}
