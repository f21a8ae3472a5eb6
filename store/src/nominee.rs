use crate::StoreError;
use serde::{Deserialize, Serialize};
use tfgov_types::{AccountName, Timestamp};

/// A proposed future board candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomineeRecord {
    pub name: AccountName,
    pub nominated_by: AccountName,
    pub nominated_at: Timestamp,
}

pub trait NomineeStore {
    fn get_nominee(&self, name: &AccountName) -> Result<Option<NomineeRecord>, StoreError>;
    fn iter_nominees(&self) -> Result<Vec<NomineeRecord>, StoreError>;

    fn is_nominee(&self, name: &AccountName) -> Result<bool, StoreError> {
        Ok(self.get_nominee(name)?.is_some())
    }
}

impl<T: NomineeStore + ?Sized> NomineeStore for &T {
    fn get_nominee(&self, name: &AccountName) -> Result<Option<NomineeRecord>, StoreError> {
        (**self).get_nominee(name)
    }

    fn iter_nominees(&self) -> Result<Vec<NomineeRecord>, StoreError> {
        (**self).iter_nominees()
    }
}
