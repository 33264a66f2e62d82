use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown order side '{0}', expected 'buy' or 'sell'")]
    UnknownSide(String),

    #[error("Invalid fill quantity {0}: must be finite and non-negative")]
    InvalidQuantity(f64),

    #[error("Execution host error: {0}")]
    Host(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
