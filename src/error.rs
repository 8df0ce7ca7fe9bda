//! Recoverable errors for the evidence-graph core.
//!
//! Contract violations (bad node index, invariant breach, mutation after
//! `finalize`) are not represented here — they are programmer errors and
//! abort via `panic!`/`assert!` at the call site instead. This enum covers
//! the smaller recoverable surface: loading read-group statistics and
//! (de)serializing a set.

use thiserror::Error;

/// Errors that can occur outside the core merge/clean/check_state contract.
#[derive(Error, Debug)]
pub enum SvGraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown read group: {0}")]
    UnknownReadGroup(String),
}

pub type Result<T> = std::result::Result<T, SvGraphError>;
