//! Error types for reconciliation

use thiserror::Error;

/// Errors raised while planning or converging package state
#[derive(Debug, Error)]
pub enum Error {
    /// The requested ensure value has no implementation (`held`)
    #[error("not implemented")]
    NotImplemented,

    /// An ensure value that cannot name any state or version
    #[error("invalid ensure value: {0:?}")]
    InvalidEnsure(String),

    /// Failure reported by the package engine
    #[error(transparent)]
    Engine(#[from] pkgkit::Error),
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;
