use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{pump, Engine, JsonLinesFeed};
use paper::{CommissionSchedule, PaperHost};
use strategy::{build_strategy, StrategyFileConfig};

/// Reads JSON-lines engine events from stdin, runs them through the
/// configured strategy against a paper host and prints the final
/// performance summary and paper accounting as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    // Logs go to stderr so stdout only carries the summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("loading runtime config")?;
    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)
        .with_context(|| format!("loading {}", cfg.strategy_config_path))?;
    info!(path = %cfg.strategy_config_path, "smacross starting");

    // ── Host + strategy ───────────────────────────────────────────────────────
    let commission = CommissionSchedule::new(
        cfg.paper_commission_rate,
        cfg.paper_fixed_fee,
        cfg.paper_min_commission,
        cfg.paper_max_commission.unwrap_or(f64::INFINITY),
    )?;
    let host = Arc::new(
        PaperHost::new(cfg.paper_order_quantity, cfg.paper_slippage_bps)
            .with_commission(commission)
            .with_initial_equity(cfg.paper_initial_equity),
    );
    let strategy = build_strategy(&strategy_file.strategy, host.clone())?;

    // ── Engine ────────────────────────────────────────────────────────────────
    let (engine, handle) = Engine::new(strategy, host.clone());
    let engine_task = tokio::spawn(engine.run());

    let feed = JsonLinesFeed::new(BufReader::new(tokio::io::stdin()));
    let pumped = pump(feed, handle).await;

    // The engine's own error is the more useful one when both fail.
    let summary = engine_task.await.context("engine task panicked")??;
    let events = pumped?;

    let paper = host.report(&summary.strategy_id)?;
    info!(
        events = events,
        total_pnl = summary.total_pnl,
        closed_trades = paper.trades.closed_trades,
        win_rate = paper.trades.win_rate,
        max_drawdown = paper.trades.max_drawdown,
        "Run complete"
    );
    let report = serde_json::json!({ "summary": summary, "paper": paper });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
