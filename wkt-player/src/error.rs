//! Error types for wkt-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for wkt-player
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared library (store lookups, config)
    #[error(transparent)]
    Common(#[from] wkt_common::Error),

    /// No tokio runtime available to drive the tick timer
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Convenience Result type using wkt-player Error
pub type Result<T> = std::result::Result<T, Error>;
