//! LMDB storage backend for the tfgov governance state.
//!
//! Implements the `tfgov-store` traits using the `heed` LMDB bindings. Each
//! keyed collection maps to one LMDB database inside a single environment, so
//! a whole [`GovernanceBatch`](tfgov_store::GovernanceBatch) commits in one
//! write transaction.

pub mod environment;
pub mod error;
pub mod governance;
pub mod integrity;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
pub use integrity::{check_integrity, IntegrityReport};
