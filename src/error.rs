//! Ringmaster Error Types

use thiserror::Error;

/// Result type alias for ringmaster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ringmaster error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fatal failure during startup discovery/join. The process must exit
    /// non-zero when this reaches `main`.
    #[error("failed to join cluster: {0}")]
    JoinCluster(String),

    /// A peer refused or failed a forwarded `/vote`. Recovered internally
    /// by the election engine (fall back to the starter); never expected
    /// to reach `main`.
    #[error("voting error: {0}")]
    Voting(String),
}
