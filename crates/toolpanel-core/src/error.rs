//! Error types for domain values.

use thiserror::Error;

/// Errors raised when a domain value is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid position id: {0}")]
    InvalidPosition(String),
}

pub type Result<T> = std::result::Result<T, Error>;
