use crate::{Error, Result};

/// Runtime configuration loaded from environment variables at startup.
/// Every variable is optional; malformed values are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Strategy config file path
    pub strategy_config_path: String,

    // Paper host
    pub paper_order_quantity: f64,
    pub paper_slippage_bps: f64,
    /// Taker fee as a fraction of notional.
    pub paper_commission_rate: f64,
    pub paper_fixed_fee: f64,
    pub paper_min_commission: f64,
    /// `None` leaves commission uncapped.
    pub paper_max_commission: Option<f64>,
    pub paper_initial_equity: f64,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let paper_order_quantity = parse_f64(&lookup, "PAPER_ORDER_QUANTITY")?.unwrap_or(1.0);
        if !paper_order_quantity.is_finite() || paper_order_quantity <= 0.0 {
            return Err(Error::Config(format!(
                "PAPER_ORDER_QUANTITY must be positive, got {paper_order_quantity}"
            )));
        }

        let paper_slippage_bps = parse_f64(&lookup, "PAPER_SLIPPAGE_BPS")?.unwrap_or(0.0);
        if !paper_slippage_bps.is_finite() || paper_slippage_bps < 0.0 {
            return Err(Error::Config(format!(
                "PAPER_SLIPPAGE_BPS must be non-negative, got {paper_slippage_bps}"
            )));
        }

        let paper_commission_rate = non_negative(&lookup, "PAPER_COMMISSION_RATE")?;
        let paper_fixed_fee = non_negative(&lookup, "PAPER_FIXED_FEE")?;
        let paper_min_commission = non_negative(&lookup, "PAPER_MIN_COMMISSION")?;
        let paper_max_commission = parse_f64(&lookup, "PAPER_MAX_COMMISSION")?;
        if let Some(max) = paper_max_commission {
            if max.is_nan() || max < paper_min_commission {
                return Err(Error::Config(format!(
                    "PAPER_MAX_COMMISSION ({max}) is below PAPER_MIN_COMMISSION ({paper_min_commission})"
                )));
            }
        }

        let paper_initial_equity = parse_f64(&lookup, "PAPER_INITIAL_EQUITY")?.unwrap_or(10_000.0);
        if !paper_initial_equity.is_finite() || paper_initial_equity <= 0.0 {
            return Err(Error::Config(format!(
                "PAPER_INITIAL_EQUITY must be positive, got {paper_initial_equity}"
            )));
        }

        Ok(Config {
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
            paper_order_quantity,
            paper_slippage_bps,
            paper_commission_rate,
            paper_fixed_fee,
            paper_min_commission,
            paper_max_commission,
            paper_initial_equity,
        })
    }
}

/// Optional non-negative number, 0 when unset.
fn non_negative<F>(lookup: &F, key: &str) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_f64(lookup, key)?.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config(format!("{key} must be non-negative, got {value}")));
    }
    Ok(value)
}

fn parse_f64<F>(lookup: &F, key: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} is not a number: '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.strategy_config_path, "config/strategy.toml");
        assert_eq!(cfg.paper_order_quantity, 1.0);
        assert_eq!(cfg.paper_slippage_bps, 0.0);
        assert_eq!(cfg.paper_commission_rate, 0.0);
        assert_eq!(cfg.paper_max_commission, None);
        assert_eq!(cfg.paper_initial_equity, 10_000.0);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("STRATEGY_CONFIG_PATH", "/etc/sma.toml"),
            ("PAPER_ORDER_QUANTITY", "2.5"),
            ("PAPER_SLIPPAGE_BPS", "10"),
        ]))
        .unwrap();
        assert_eq!(cfg.strategy_config_path, "/etc/sma.toml");
        assert_eq!(cfg.paper_order_quantity, 2.5);
        assert_eq!(cfg.paper_slippage_bps, 10.0);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PAPER_SLIPPAGE_BPS", "ten")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn non_positive_order_quantity_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PAPER_ORDER_QUANTITY", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("PAPER_ORDER_QUANTITY", "-1")])).is_err());
    }

    #[test]
    fn commission_settings_are_read_and_checked() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("PAPER_COMMISSION_RATE", "0.001"),
            ("PAPER_FIXED_FEE", "0.5"),
            ("PAPER_MIN_COMMISSION", "1"),
            ("PAPER_MAX_COMMISSION", "50"),
        ]))
        .unwrap();
        assert_eq!(cfg.paper_commission_rate, 0.001);
        assert_eq!(cfg.paper_fixed_fee, 0.5);
        assert_eq!(cfg.paper_min_commission, 1.0);
        assert_eq!(cfg.paper_max_commission, Some(50.0));

        assert!(Config::from_lookup(lookup_from(&[("PAPER_COMMISSION_RATE", "-0.1")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("PAPER_MIN_COMMISSION", "5"),
            ("PAPER_MAX_COMMISSION", "1"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[("PAPER_INITIAL_EQUITY", "0")])).is_err());
    }
}
