use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use common::{Error, ExecutionHost, Result};

use crate::config::{SmaCrossoverConfig, StrategyConfig};
use crate::{SmaCrossover, Strategy};

/// Construct an SMA crossover from an id and named options.
/// Recognized keys: `short_period` (default 12) and `long_period` (default 26).
pub fn create_sma_crossover(
    strategy_id: &str,
    params: &HashMap<String, toml::Value>,
    host: Arc<dyn ExecutionHost>,
) -> Result<SmaCrossover> {
    let settings = SmaCrossoverConfig::from_params(params)?;
    SmaCrossover::new(strategy_id, settings, host)
}

/// Build the strategy described by a config entry.
pub fn build_strategy(
    cfg: &StrategyConfig,
    host: Arc<dyn ExecutionHost>,
) -> Result<Box<dyn Strategy>> {
    let strategy: Box<dyn Strategy> = match cfg.strategy_type.as_str() {
        "sma_crossover" => Box::new(create_sma_crossover(&cfg.id, &cfg.params, host)?),
        other => {
            return Err(Error::Config(format!("unknown strategy type '{other}'")));
        }
    };
    info!(id = %strategy.id(), kind = %cfg.strategy_type, "Built strategy");
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{PnlReport, Side};

    struct NullHost;

    impl ExecutionHost for NullHost {
        fn signal_buy(&self, _: &str, _: &str, _: f64) -> Result<()> {
            Ok(())
        }
        fn signal_sell(&self, _: &str, _: &str, _: f64) -> Result<()> {
            Ok(())
        }
        fn pnl_report(&self, _: &str) -> Result<PnlReport> {
            Ok(PnlReport::default())
        }
    }

    #[test]
    fn factory_applies_defaults() {
        let s = create_sma_crossover("s", &HashMap::new(), Arc::new(NullHost)).unwrap();
        assert_eq!(*s.config(), SmaCrossoverConfig { short_period: 12, long_period: 26 });
    }

    #[test]
    fn factory_reads_named_options() {
        let mut params = HashMap::new();
        params.insert("short_period".to_string(), toml::Value::Integer(10));
        params.insert("long_period".to_string(), toml::Value::Integer(20));
        let s = create_sma_crossover("test_sma", &params, Arc::new(NullHost)).unwrap();
        assert_eq!(s.id(), "test_sma");
        assert_eq!(s.config().short_period, 10);
        assert_eq!(s.config().long_period, 20);
    }

    #[test]
    fn factory_rejects_zero_period() {
        let mut params = HashMap::new();
        params.insert("long_period".to_string(), toml::Value::Integer(0));
        assert!(create_sma_crossover("s", &params, Arc::new(NullHost)).is_err());
    }

    #[test]
    fn build_strategy_rejects_unknown_type() {
        let cfg = StrategyConfig {
            strategy_type: "rsi".into(),
            id: "s".into(),
            params: HashMap::new(),
        };
        let err = build_strategy(&cfg, Arc::new(NullHost)).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn built_strategy_is_usable_through_the_trait() {
        let cfg = StrategyConfig {
            strategy_type: "sma_crossover".into(),
            id: "s".into(),
            params: HashMap::new(),
        };
        let mut s = build_strategy(&cfg, Arc::new(NullHost)).unwrap();
        s.initialize().unwrap();
        let fill = common::Fill::new("X", Side::Buy, 2.0, 1.0);
        assert_eq!(s.on_fill(&fill).unwrap(), 2.0);
        assert_eq!(s.positions().get("X"), Some(&2.0));
    }
}
