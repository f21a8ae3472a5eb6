//! Nullable host: accounts, signatures and authority pushes held in memory.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use tfgov_governance::{Authority, Host, HostError};
use tfgov_types::{AccountName, Timestamp};

use crate::clock::NullClock;

/// A deterministic host for testing.
///
/// The current call "carries" the authority of every account passed to
/// [`NullHost::sign_as`]. Authority pushes are recorded and can be made to
/// fail once with [`NullHost::fail_next_push`].
#[derive(Debug, Default)]
pub struct NullHost {
    clock: NullClock,
    accounts: RefCell<BTreeSet<AccountName>>,
    signers: RefCell<BTreeSet<AccountName>>,
    authorities: RefCell<BTreeMap<AccountName, Authority>>,
    pushes: RefCell<Vec<(AccountName, Authority)>>,
    fail_next_push: Cell<bool>,
}

impl NullHost {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            clock: NullClock::new(initial_secs),
            ..Self::default()
        }
    }

    pub fn clock(&self) -> &NullClock {
        &self.clock
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }

    pub fn add_account(&self, account: &AccountName) {
        self.accounts.borrow_mut().insert(account.clone());
    }

    pub fn add_accounts<'a>(&self, accounts: impl IntoIterator<Item = &'a AccountName>) {
        let mut known = self.accounts.borrow_mut();
        known.extend(accounts.into_iter().cloned());
    }

    /// Replace the set of accounts whose authority the current call carries.
    pub fn sign_as(&self, accounts: &[&AccountName]) {
        *self.signers.borrow_mut() = accounts.iter().map(|a| (*a).clone()).collect();
    }

    pub fn clear_signers(&self) {
        self.signers.borrow_mut().clear();
    }

    /// Reject the next authority push.
    pub fn fail_next_push(&self) {
        self.fail_next_push.set(true);
    }

    /// The authority last accepted for `account`.
    pub fn authority_of(&self, account: &AccountName) -> Option<Authority> {
        self.authorities.borrow().get(account).cloned()
    }

    /// Every accepted push, in order.
    pub fn pushes(&self) -> Vec<(AccountName, Authority)> {
        self.pushes.borrow().clone()
    }
}

impl Host for NullHost {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn require_authorization(&self, account: &AccountName) -> Result<(), HostError> {
        if self.signers.borrow().contains(account) {
            Ok(())
        } else {
            Err(HostError::MissingAuthority(account.clone()))
        }
    }

    fn account_exists(&self, account: &AccountName) -> bool {
        self.accounts.borrow().contains(account)
    }

    fn set_account_authority(
        &self,
        account: &AccountName,
        authority: &Authority,
    ) -> Result<(), HostError> {
        if self.fail_next_push.replace(false) {
            return Err(HostError::AuthorityRejected {
                account: account.clone(),
                reason: "injected failure".to_string(),
            });
        }
        if !authority.is_satisfiable() {
            return Err(HostError::AuthorityRejected {
                account: account.clone(),
                reason: "threshold cannot be met".to_string(),
            });
        }
        self.authorities
            .borrow_mut()
            .insert(account.clone(), authority.clone());
        self.pushes
            .borrow_mut()
            .push((account.clone(), authority.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfgov_governance::{AuthorityBuilder, ThresholdRule};

    fn name(raw: &str) -> AccountName {
        AccountName::parse(raw).unwrap()
    }

    #[test]
    fn authorization_follows_signers() {
        let host = NullHost::new(0);
        let alice = name("alice");
        assert!(host.require_authorization(&alice).is_err());
        host.sign_as(&[&alice]);
        assert!(host.require_authorization(&alice).is_ok());
        host.clear_signers();
        assert_eq!(
            host.require_authorization(&alice),
            Err(HostError::MissingAuthority(alice))
        );
    }

    #[test]
    fn injected_failure_applies_once() {
        let host = NullHost::new(0);
        let tf = name("tf");
        let authority =
            AuthorityBuilder::new(ThresholdRule::SimpleMajority, tf.clone()).build([&name("bob")]);
        host.fail_next_push();
        assert!(host.set_account_authority(&tf, &authority).is_err());
        assert!(host.authority_of(&tf).is_none());
        host.set_account_authority(&tf, &authority).unwrap();
        assert_eq!(host.authority_of(&tf), Some(authority));
        assert_eq!(host.pushes().len(), 1);
    }
}
