//! Board membership and its coupling to the host authority.
//!
//! [`Board`] is the in-memory roster an operation edits. A
//! [`PermissionUpdate`] carries the edit to the store and the host as one
//! unit:
//!
//! 1. **prepare**: diff the roster into storage ops and build the authority
//!    for the new roster.
//! 2. **commit**: push the authority to the host; only if the host accepts,
//!    apply the storage batch. If the store then fails, the previous authority
//!    is pushed back, so the store and the host never disagree on the signer
//!    set.

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use tfgov_store::{BoardMemberRecord, BoardStore, GovernanceBatch, GovernanceStore};
use tfgov_types::{AccountName, Timestamp};

use crate::authority::{Authority, AuthorityBuilder};
use crate::error::{EntryKind, GovernanceError};
use crate::host::Host;

/// The seated board, bounded by `max_seats`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    members: BTreeSet<AccountName>,
    max_seats: u32,
}

impl Board {
    pub fn new(max_seats: u32) -> Self {
        Self {
            members: BTreeSet::new(),
            max_seats,
        }
    }

    /// Read the persisted roster.
    pub fn load<S: BoardStore + ?Sized>(store: &S, max_seats: u32) -> Result<Self, GovernanceError> {
        let members = store
            .iter_members()?
            .into_iter()
            .map(|record| record.name)
            .collect();
        Ok(Self { members, max_seats })
    }

    /// Seat `nominee`.
    pub fn add_to_tfboard(&mut self, nominee: &AccountName) -> Result<(), GovernanceError> {
        if self.members.contains(nominee) {
            return Err(GovernanceError::duplicate(EntryKind::BoardMember, nominee));
        }
        let requested = self.len() + 1;
        if requested > self.max_seats {
            return Err(GovernanceError::CapacityExceeded {
                max: self.max_seats,
                requested,
            });
        }
        self.members.insert(nominee.clone());
        Ok(())
    }

    /// Unseat `member`.
    pub fn rmv_from_tfboard(&mut self, member: &AccountName) -> Result<(), GovernanceError> {
        if !self.members.remove(member) {
            return Err(GovernanceError::not_found(EntryKind::BoardMember, member));
        }
        Ok(())
    }

    /// Unseat everyone, returning the former members.
    pub fn clear(&mut self) -> Vec<AccountName> {
        std::mem::take(&mut self.members).into_iter().collect()
    }

    pub fn contains(&self, name: &AccountName) -> bool {
        self.members.contains(name)
    }

    pub fn members(&self) -> impl Iterator<Item = &AccountName> {
        self.members.iter()
    }

    pub fn len(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Seats still free on this roster.
    pub fn vacancies(&self) -> u32 {
        self.max_seats.saturating_sub(self.len())
    }
}

/// Push `authority` as the signing authority of `account`.
pub fn set_permissions<H: Host + ?Sized>(
    host: &H,
    account: &AccountName,
    authority: &Authority,
) -> Result<(), GovernanceError> {
    host.set_account_authority(account, authority)?;
    info!(
        account = %account,
        signers = authority.accounts.len(),
        threshold = authority.threshold,
        "board authority updated"
    );
    Ok(())
}

/// A prepared roster change, ready to be committed to host and store together.
#[derive(Debug)]
pub struct PermissionUpdate {
    account: AccountName,
    previous: Authority,
    next: Authority,
    seated: Vec<AccountName>,
    unseated: Vec<AccountName>,
    batch: GovernanceBatch,
}

impl PermissionUpdate {
    /// Diff `before` into `after`. `batch` holds the operation's other writes;
    /// the membership writes are appended to it.
    pub fn prepare(
        account: &AccountName,
        builder: &AuthorityBuilder,
        before: &Board,
        after: &Board,
        mut batch: GovernanceBatch,
        now: Timestamp,
    ) -> Self {
        let unseated: Vec<AccountName> = before
            .members()
            .filter(|m| !after.contains(m))
            .cloned()
            .collect();
        let seated: Vec<AccountName> = after
            .members()
            .filter(|m| !before.contains(m))
            .cloned()
            .collect();

        for name in &unseated {
            batch.delete_member(name);
        }
        for name in &seated {
            batch.put_member(BoardMemberRecord {
                name: name.clone(),
                seated_at: now,
            });
        }

        Self {
            account: account.clone(),
            previous: builder.build(before.members()),
            next: builder.build(after.members()),
            seated,
            unseated,
            batch,
        }
    }

    pub fn is_membership_change(&self) -> bool {
        !self.seated.is_empty() || !self.unseated.is_empty()
    }

    pub fn seated(&self) -> &[AccountName] {
        &self.seated
    }

    pub fn unseated(&self) -> &[AccountName] {
        &self.unseated
    }

    /// Push the new authority, then persist. Nothing is persisted when the
    /// push fails; the old authority is restored when persisting fails.
    pub fn commit<S, H>(self, store: &S, host: &H) -> Result<CommittedUpdate, GovernanceError>
    where
        S: GovernanceStore + ?Sized,
        H: Host + ?Sized,
    {
        let changed = self.is_membership_change();
        if changed {
            if let Err(e) = set_permissions(host, &self.account, &self.next) {
                warn!(account = %self.account, error = %e, "authority push rejected, membership unchanged");
                return Err(e);
            }
        }

        if let Err(e) = store.apply(&self.batch) {
            if changed {
                warn!(account = %self.account, error = %e, "store write failed, restoring previous authority");
                if let Err(restore) = set_permissions(host, &self.account, &self.previous) {
                    error!(
                        account = %self.account,
                        error = %restore,
                        "failed to restore previous authority"
                    );
                }
            }
            return Err(e.into());
        }

        Ok(CommittedUpdate {
            seated: self.seated,
            unseated: self.unseated,
            authority: self.next,
        })
    }
}

/// What a committed [`PermissionUpdate`] changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedUpdate {
    pub seated: Vec<AccountName>,
    pub unseated: Vec<AccountName>,
    pub authority: Authority,
}
