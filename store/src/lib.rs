//! Abstract storage traits for the tfgov governance state.
//!
//! The persisted state is one [`GovernanceConfig`](tfgov_types::GovernanceConfig)
//! record plus three keyed collections (nominees, candidates, board members).
//! Every storage backend (LMDB, in-memory for testing) implements these traits.
//! The engine reads through the per-collection traits and writes only through
//! [`GovernanceStore::apply`], one atomic [`GovernanceBatch`] per operation.

pub mod batch;
pub mod board;
pub mod candidate;
pub mod config;
pub mod error;
pub mod nominee;

pub use batch::{BatchOp, GovernanceBatch};
pub use board::{BoardMemberRecord, BoardStore};
pub use candidate::{CandidateRecord, CandidateStore};
pub use config::ConfigStore;
pub use error::StoreError;
pub use nominee::{NomineeRecord, NomineeStore};

/// The complete governance store: read access to every collection plus an
/// atomic write path.
pub trait GovernanceStore: ConfigStore + NomineeStore + CandidateStore + BoardStore {
    /// Apply every operation in `batch` or none of them.
    fn apply(&self, batch: &GovernanceBatch) -> Result<(), StoreError>;
}

impl<T: GovernanceStore + ?Sized> GovernanceStore for &T {
    fn apply(&self, batch: &GovernanceBatch) -> Result<(), StoreError> {
        (**self).apply(batch)
    }
}
