//! Fundamental types for the tfgov board governance engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account names, treasury symbols, ballot references, timestamps, the persisted
//! governance configuration record, and the top-level error type.

pub mod account;
pub mod ballot;
pub mod error;
pub mod params;
pub mod symbol;
pub mod time;

pub use account::AccountName;
pub use ballot::BallotId;
pub use error::TfGovError;
pub use params::{ElectionPhase, GovernanceConfig};
pub use symbol::TreasurySymbol;
pub use time::Timestamp;
