//! The host execution environment the engine runs inside.
//!
//! The host owns the clock, signature checks, account existence and the
//! primitive that rewrites an account's signing authority. None of that is
//! implemented here.

use thiserror::Error;

use tfgov_types::{AccountName, Timestamp};

use crate::authority::Authority;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("missing authority of {0}")]
    MissingAuthority(AccountName),

    #[error("authority update for {account} rejected: {reason}")]
    AuthorityRejected { account: AccountName, reason: String },

    #[error("{0}")]
    Other(String),
}

pub trait Host {
    /// Current host time.
    fn now(&self) -> Timestamp;

    /// Fails unless the current call carries `account`'s authority.
    fn require_authorization(&self, account: &AccountName) -> Result<(), HostError>;

    fn account_exists(&self, account: &AccountName) -> bool;

    /// Replace the signing authority of `account`.
    fn set_account_authority(
        &self,
        account: &AccountName,
        authority: &Authority,
    ) -> Result<(), HostError>;
}

impl<T: Host + ?Sized> Host for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn require_authorization(&self, account: &AccountName) -> Result<(), HostError> {
        (**self).require_authorization(account)
    }

    fn account_exists(&self, account: &AccountName) -> bool {
        (**self).account_exists(account)
    }

    fn set_account_authority(
        &self,
        account: &AccountName,
        authority: &Authority,
    ) -> Result<(), HostError> {
        (**self).set_account_authority(account, authority)
    }
}
