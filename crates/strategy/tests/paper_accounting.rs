use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Layer;

use common::{ExecutionHost, Quote, Side};
use paper::PaperHost;
use strategy::{SmaCrossover, SmaCrossoverConfig, Strategy};

/// One log event with its message and numeric fields.
#[derive(Debug, Default, Clone)]
struct Captured {
    message: String,
    fields: HashMap<String, f64>,
}

struct FieldVisitor<'a>(&'a mut Captured);

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.fields.insert(field.name().to_string(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0.message = format!("{value:?}");
        }
    }
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureLayer {
    fn with_message(&self, message: &str) -> Vec<Captured> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut captured = Captured::default();
        event.record(&mut FieldVisitor(&mut captured));
        self.events.lock().unwrap().push(captured);
    }
}

fn tick(strategy: &mut SmaCrossover, host: &PaperHost, mid: f64) -> Option<Side> {
    host.update_price("X", mid).unwrap();
    let quote = Quote::new("X", Utc::now(), mid, mid, mid);
    let signal = strategy.on_market_data(&quote).unwrap();
    for fill in host.drain_fills().unwrap() {
        strategy.on_fill(&fill).unwrap();
    }
    signal.map(|s| s.side)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn fill_log_and_summary_carry_host_pnl_split() {
    let capture = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        // 100 bps slippage: buys fill at 1.01x mid, sells at 0.99x.
        let host = Arc::new(PaperHost::new(1.0, 100.0));
        let cfg = SmaCrossoverConfig::new(2, 3).unwrap();
        let mut s = SmaCrossover::new("paper_sma", cfg, host.clone()).unwrap();

        let sides: Vec<Option<Side>> = [1.0, 2.0, 3.0]
            .into_iter()
            .map(|mid| tick(&mut s, &host, mid))
            .collect();
        assert_eq!(sides, vec![None, None, Some(Side::Buy)]);
        assert_eq!(s.position("X"), 1.0);

        // Long 1 @ 3.03, marked at 10.
        assert_eq!(tick(&mut s, &host, 10.0), None);
        let summary = s.performance_summary().unwrap();
        assert_close(summary.realized_pnl, 0.0);
        assert_close(summary.unrealized_pnl, 10.0 - 3.03);
        assert_close(summary.total_pnl, host.strategy_pnl("paper_sma").unwrap());

        // [3, 10, 4] stays bullish, [10, 4, 1] turns bearish and sells @ 0.99.
        assert_eq!(tick(&mut s, &host, 4.0), None);
        assert_eq!(tick(&mut s, &host, 1.0), Some(Side::Sell));
        assert_eq!(s.position("X"), 0.0);

        let report = host.pnl_report("paper_sma").unwrap();
        let summary = s.performance_summary().unwrap();
        assert_close(summary.realized_pnl, 0.99 - 3.03);
        assert_close(summary.unrealized_pnl, 0.0);
        assert_eq!(summary.realized_pnl, report.realized);
        assert_eq!(summary.unrealized_pnl, report.unrealized);
        assert_eq!(summary.fill_count, 2);
    });

    let fills = capture.with_message("Fill applied");
    assert_eq!(fills.len(), 2);

    // Right after the buy: nothing closed, entry slippage is the open loss.
    assert_close(fills[0].fields["position"], 1.0);
    assert_close(fills[0].fields["realized_pnl"], 0.0);
    assert_close(fills[0].fields["unrealized_pnl"], 3.0 - 3.03);

    // After the sell: flat, the round trip is fully realized.
    assert_close(fills[1].fields["position"], 0.0);
    assert_close(fills[1].fields["realized_pnl"], 0.99 - 3.03);
    assert_close(fills[1].fields["unrealized_pnl"], 0.0);
}
