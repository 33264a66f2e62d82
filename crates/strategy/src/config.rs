use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result};

/// Strategy config file (TOML).
///
/// Example `config/strategy.toml`:
/// ```toml
/// [strategy]
/// type = "sma_crossover"
/// id = "sma_btc"
///
/// [strategy.params]
/// short_period = 12
/// long_period = 26
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier. Only "sma_crossover" is known.
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Strategy identifier used towards the host and in logs.
    pub id: String,
    /// Named options, passed to the factory as-is.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read strategy config at '{path}': {e}"))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Window lengths for the moving-average crossover. Fixed for the
/// lifetime of a strategy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaCrossoverConfig {
    /// Window length of the fast average.
    #[serde(default = "default_short_period")]
    pub short_period: usize,
    /// Window length of the slow average.
    #[serde(default = "default_long_period")]
    pub long_period: usize,
}

fn default_short_period() -> usize {
    12
}

fn default_long_period() -> usize {
    26
}

impl Default for SmaCrossoverConfig {
    fn default() -> Self {
        Self {
            short_period: default_short_period(),
            long_period: default_long_period(),
        }
    }
}

impl SmaCrossoverConfig {
    pub fn new(short_period: usize, long_period: usize) -> Result<Self> {
        let cfg = Self { short_period, long_period };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Both periods must be positive. `short_period < long_period` is the
    /// usual setup but is not required.
    pub fn validate(&self) -> Result<()> {
        if self.short_period == 0 || self.long_period == 0 {
            return Err(Error::Config(format!(
                "periods must be positive, got short={} long={}",
                self.short_period, self.long_period
            )));
        }
        Ok(())
    }

    /// Price buffer length needed to compute both averages.
    pub fn capacity(&self) -> usize {
        self.short_period.max(self.long_period)
    }

    /// Build from named options, falling back to defaults for missing keys.
    pub fn from_params(params: &HashMap<String, toml::Value>) -> Result<Self> {
        let cfg = Self {
            short_period: param_usize(params, "short_period", default_short_period())?,
            long_period: param_usize(params, "long_period", default_long_period())?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_integer()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                Error::Config(format!("'{key}' must be a non-negative integer, got {value}"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_twelve_and_twenty_six() {
        let cfg = SmaCrossoverConfig::default();
        assert_eq!(cfg.short_period, 12);
        assert_eq!(cfg.long_period, 26);
        assert_eq!(cfg.capacity(), 26);
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(SmaCrossoverConfig::new(0, 26).is_err());
        assert!(SmaCrossoverConfig::new(12, 0).is_err());
    }

    #[test]
    fn inverted_periods_are_allowed() {
        let cfg = SmaCrossoverConfig::new(30, 10).unwrap();
        assert_eq!(cfg.capacity(), 30);
    }

    #[test]
    fn parses_file_with_params() {
        let file = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "sma_crossover"
            id = "sma_btc"

            [strategy.params]
            short_period = 5
            "#,
        )
        .unwrap();
        assert_eq!(file.strategy.id, "sma_btc");
        let cfg = SmaCrossoverConfig::from_params(&file.strategy.params).unwrap();
        assert_eq!(cfg, SmaCrossoverConfig { short_period: 5, long_period: 26 });
    }

    #[test]
    fn wrongly_typed_param_is_rejected() {
        let file = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "sma_crossover"
            id = "s"
            params = { long_period = "slow" }
            "#,
        )
        .unwrap();
        let err = SmaCrossoverConfig::from_params(&file.strategy.params).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn negative_param_is_rejected() {
        let mut params = HashMap::new();
        params.insert("short_period".to_string(), toml::Value::Integer(-3));
        assert!(SmaCrossoverConfig::from_params(&params).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = StrategyFileConfig::load("/nonexistent/strategy.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
