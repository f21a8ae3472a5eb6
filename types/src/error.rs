//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing the fundamental types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TfGovError {
    #[error("invalid account name '{0}': expected 1-12 chars of a-z, 1-5 and '.'")]
    InvalidAccountName(String),

    #[error("invalid treasury symbol '{0}': expected 1-7 uppercase letters")]
    InvalidSymbol(String),
}
