//! Nullable store: thread-safe in-memory governance storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use tfgov_store::{
    BatchOp, BoardMemberRecord, BoardStore, CandidateRecord, CandidateStore, ConfigStore,
    GovernanceBatch, GovernanceStore, NomineeRecord, NomineeStore, StoreError,
};
use tfgov_types::{AccountName, GovernanceConfig};

#[derive(Clone, Debug, Default)]
struct State {
    config: Option<GovernanceConfig>,
    nominees: BTreeMap<AccountName, NomineeRecord>,
    candidates: BTreeMap<AccountName, CandidateRecord>,
    board: BTreeMap<AccountName, BoardMemberRecord>,
}

impl State {
    fn apply(&mut self, op: &BatchOp) {
        match op {
            BatchOp::PutConfig(config) => self.config = Some(config.clone()),
            BatchOp::PutNominee(record) => {
                self.nominees.insert(record.name.clone(), record.clone());
            }
            BatchOp::DeleteNominee(name) => {
                self.nominees.remove(name);
            }
            BatchOp::PutCandidate(record) => {
                self.candidates.insert(record.name.clone(), record.clone());
            }
            BatchOp::DeleteCandidate(name) => {
                self.candidates.remove(name);
            }
            BatchOp::ClearCandidates => self.candidates.clear(),
            BatchOp::PutMember(record) => {
                self.board.insert(record.name.clone(), record.clone());
            }
            BatchOp::DeleteMember(name) => {
                self.board.remove(name);
            }
        }
    }
}

/// An in-memory governance store for testing.
///
/// A batch is applied to a copy of the state which replaces the original only
/// when every op went through, mirroring one LMDB write transaction.
#[derive(Debug, Default)]
pub struct NullGovernanceStore {
    state: Mutex<State>,
    fail_next_apply: AtomicBool,
    applied: AtomicUsize,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `config`.
    pub fn with_config(config: GovernanceConfig) -> Self {
        let store = Self::new();
        store.lock().config = Some(config);
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next [`GovernanceStore::apply`] without writing anything.
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    /// Number of batches applied successfully.
    pub fn applied_batches(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

impl ConfigStore for NullGovernanceStore {
    fn get_config(&self) -> Result<Option<GovernanceConfig>, StoreError> {
        Ok(self.lock().config.clone())
    }
}

impl NomineeStore for NullGovernanceStore {
    fn get_nominee(&self, name: &AccountName) -> Result<Option<NomineeRecord>, StoreError> {
        Ok(self.lock().nominees.get(name).cloned())
    }

    fn iter_nominees(&self) -> Result<Vec<NomineeRecord>, StoreError> {
        Ok(self.lock().nominees.values().cloned().collect())
    }
}

impl CandidateStore for NullGovernanceStore {
    fn get_candidate(&self, name: &AccountName) -> Result<Option<CandidateRecord>, StoreError> {
        Ok(self.lock().candidates.get(name).cloned())
    }

    fn iter_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError> {
        Ok(self.lock().candidates.values().cloned().collect())
    }
}

impl BoardStore for NullGovernanceStore {
    fn get_member(&self, name: &AccountName) -> Result<Option<BoardMemberRecord>, StoreError> {
        Ok(self.lock().board.get(name).cloned())
    }

    fn iter_members(&self) -> Result<Vec<BoardMemberRecord>, StoreError> {
        Ok(self.lock().board.values().cloned().collect())
    }
}

impl GovernanceStore for NullGovernanceStore {
    fn apply(&self, batch: &GovernanceBatch) -> Result<(), StoreError> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            debug!(ops = batch.len(), "injected apply failure");
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        let mut state = self.lock();
        let mut next = state.clone();
        for op in batch.ops() {
            next.apply(op);
        }
        *state = next;
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
