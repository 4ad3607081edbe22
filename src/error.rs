//! Error taxonomy for the engine.
//!
//! Most failures (transient network, parse errors, empty-liquidity
//! quotes, ABI-variant misses, threshold/cooldown misses) are swallowed
//! at their source and surfaced as `None`/`anyhow::Error` at the call
//! site — they never reach `main`. `EngineError` exists for the one
//! class of error that is fatal at startup: malformed configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigFileParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid token address for {symbol}: {reason}")]
    InvalidAddress { symbol: String, reason: String },

    #[error(transparent)]
    FixedPoint(#[from] crate::fixed_point::FixedPointError),
}
