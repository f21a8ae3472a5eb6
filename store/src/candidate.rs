use crate::StoreError;
use serde::{Deserialize, Serialize};
use tfgov_types::{AccountName, Timestamp};

/// A vetted nominee registered as an option on the open ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: AccountName,
    pub registered_at: Timestamp,
}

pub trait CandidateStore {
    fn get_candidate(&self, name: &AccountName) -> Result<Option<CandidateRecord>, StoreError>;
    fn iter_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError>;

    fn is_candidate(&self, name: &AccountName) -> Result<bool, StoreError> {
        Ok(self.get_candidate(name)?.is_some())
    }
}

impl<T: CandidateStore + ?Sized> CandidateStore for &T {
    fn get_candidate(&self, name: &AccountName) -> Result<Option<CandidateRecord>, StoreError> {
        (**self).get_candidate(name)
    }

    fn iter_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError> {
        (**self).iter_candidates()
    }
}
