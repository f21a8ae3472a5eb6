//! Candidacy registry: the nominee and candidate sets.
//!
//! Checks run against the persisted collections and stage their writes into
//! the caller's [`GovernanceBatch`]; nothing is written here.

use tracing::debug;

use tfgov_store::{
    BoardStore, CandidateRecord, CandidateStore, GovernanceBatch, NomineeRecord, NomineeStore,
};
use tfgov_types::{AccountName, Timestamp};

use crate::error::{EntryKind, GovernanceError, InvalidState};

pub struct CandidacyRegistry<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> CandidacyRegistry<'a, S>
where
    S: NomineeStore + CandidateStore + BoardStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Sitting members are only accepted when `incumbents_eligible`, i.e.
    /// once their term has run out.
    pub fn stage_nomination(
        &self,
        nominee: &AccountName,
        nominator: &AccountName,
        now: Timestamp,
        incumbents_eligible: bool,
        batch: &mut GovernanceBatch,
    ) -> Result<(), GovernanceError> {
        if self.store.is_nominee(nominee)? {
            return Err(GovernanceError::duplicate(EntryKind::Nominee, nominee));
        }
        if !incumbents_eligible && self.store.is_member(nominee)? {
            return Err(GovernanceError::duplicate(EntryKind::BoardMember, nominee));
        }
        batch.put_nominee(NomineeRecord {
            name: nominee.clone(),
            nominated_by: nominator.clone(),
            nominated_at: now,
        });
        Ok(())
    }

    pub fn stage_unnomination(
        &self,
        nominee: &AccountName,
        batch: &mut GovernanceBatch,
    ) -> Result<NomineeRecord, GovernanceError> {
        let record = self
            .store
            .get_nominee(nominee)?
            .ok_or_else(|| GovernanceError::not_found(EntryKind::Nominee, nominee))?;
        if self.store.is_candidate(nominee)? {
            return Err(InvalidState::CandidateRegistered {
                name: nominee.clone(),
            }
            .into());
        }
        batch.delete_nominee(nominee);
        Ok(record)
    }

    /// Promote a nominee, bounded by `max_candidates` registrations.
    pub fn stage_candidacy(
        &self,
        candidate: &AccountName,
        now: Timestamp,
        max_candidates: u32,
        batch: &mut GovernanceBatch,
    ) -> Result<(), GovernanceError> {
        if !self.store.is_nominee(candidate)? {
            return Err(GovernanceError::not_found(EntryKind::Nominee, candidate));
        }
        if self.store.is_candidate(candidate)? {
            return Err(GovernanceError::duplicate(EntryKind::Candidate, candidate));
        }
        let requested = self.store.iter_candidates()?.len() as u32 + 1;
        if requested > max_candidates {
            return Err(GovernanceError::CapacityExceeded {
                max: max_candidates,
                requested,
            });
        }
        batch.put_candidate(CandidateRecord {
            name: candidate.clone(),
            registered_at: now,
        });
        debug!(candidate = %candidate, registered = requested, "candidacy staged");
        Ok(())
    }

    pub fn stage_withdrawal(
        &self,
        candidate: &AccountName,
        batch: &mut GovernanceBatch,
    ) -> Result<(), GovernanceError> {
        if !self.store.is_candidate(candidate)? {
            return Err(GovernanceError::not_found(EntryKind::Candidate, candidate));
        }
        batch.delete_candidate(candidate);
        Ok(())
    }

    /// Registered candidates in name order.
    pub fn candidates(&self) -> Result<Vec<AccountName>, GovernanceError> {
        let mut names: Vec<AccountName> = self
            .store
            .iter_candidates()?
            .into_iter()
            .map(|record| record.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Drop every candidate, and their nominee records, at resolution.
    pub fn stage_resolution(&self, candidates: &[AccountName], batch: &mut GovernanceBatch) {
        batch.clear_candidates();
        for name in candidates {
            batch.delete_nominee(name);
        }
    }
}
