use thiserror::Error;

/// Canonical result for the restaurant.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The termination protocol was misused by the driver.
    #[error("queue invariant failed: {0}")]
    Invariant(String),
}
