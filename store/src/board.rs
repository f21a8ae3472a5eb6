use crate::StoreError;
use serde::{Deserialize, Serialize};
use tfgov_types::{AccountName, Timestamp};

/// A seated trustee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMemberRecord {
    pub name: AccountName,
    pub seated_at: Timestamp,
}

/// Trait for reading the current board. The board is the source of truth for
/// the authority pushed to the host.
pub trait BoardStore {
    fn get_member(&self, name: &AccountName) -> Result<Option<BoardMemberRecord>, StoreError>;
    fn iter_members(&self) -> Result<Vec<BoardMemberRecord>, StoreError>;

    fn is_member(&self, name: &AccountName) -> Result<bool, StoreError> {
        Ok(self.get_member(name)?.is_some())
    }

    fn member_count(&self) -> Result<u32, StoreError> {
        Ok(self.iter_members()?.len() as u32)
    }
}

impl<T: BoardStore + ?Sized> BoardStore for &T {
    fn get_member(&self, name: &AccountName) -> Result<Option<BoardMemberRecord>, StoreError> {
        (**self).get_member(name)
    }

    fn iter_members(&self) -> Result<Vec<BoardMemberRecord>, StoreError> {
        (**self).iter_members()
    }

    fn member_count(&self) -> Result<u32, StoreError> {
        (**self).member_count()
    }
}
