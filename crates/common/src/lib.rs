pub mod config;
pub mod error;
pub mod host;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use host::ExecutionHost;
pub use types::*;
