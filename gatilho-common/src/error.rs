//! Error type shared by the gatilho crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the store, the bootstrap config or stored-value decoding
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory or reading the config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON column (report sections, driver examples) did not round-trip
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The TOML config file is not valid
    #[error("Configuration error: {0}")]
    Config(String),

    /// No analysis or child record with the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored column holds a value the model cannot represent
    /// (unknown enum label, malformed UUID or timestamp)
    #[error("Invalid stored value: {0}")]
    InvalidRecord(String),
}
