//! Nullable ballot service: ballots and tallies held in memory.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use tfgov_governance::{BallotError, BallotService, Tally};
use tfgov_types::{AccountName, BallotId, Timestamp, TreasurySymbol};

/// One ballot as the service recorded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NullBallot {
    pub name: String,
    pub treasury: TreasurySymbol,
    pub options: BTreeSet<AccountName>,
    pub begin: Timestamp,
    pub end: Timestamp,
    pub voting_open: bool,
    pub tally: Option<Tally>,
}

/// A deterministic ballot service for testing.
///
/// Ballot ids are handed out sequentially from 1. Tallies are whatever the
/// test sets with [`NullBallotService::set_tally`]; an unset tally reads as
/// empty.
#[derive(Debug, Default)]
pub struct NullBallotService {
    last_id: Cell<u64>,
    ballots: RefCell<BTreeMap<BallotId, NullBallot>>,
    fail_next_call: Cell<bool>,
}

impl NullBallotService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ballot(&self, id: BallotId) -> Option<NullBallot> {
        self.ballots.borrow().get(&id).cloned()
    }

    /// The most recently opened ballot.
    pub fn latest(&self) -> Option<BallotId> {
        self.ballots.borrow().keys().next_back().copied()
    }

    pub fn set_tally(&self, id: BallotId, tally: Tally) {
        if let Some(ballot) = self.ballots.borrow_mut().get_mut(&id) {
            ballot.tally = Some(tally);
        }
    }

    /// Fail the next call of any kind.
    pub fn fail_next_call(&self) {
        self.fail_next_call.set(true);
    }

    fn injected_failure(&self) -> Result<(), BallotError> {
        if self.fail_next_call.replace(false) {
            return Err(BallotError::Other("injected failure".to_string()));
        }
        Ok(())
    }

    fn with_ballot<T>(
        &self,
        id: BallotId,
        f: impl FnOnce(&mut NullBallot) -> Result<T, BallotError>,
    ) -> Result<T, BallotError> {
        self.injected_failure()?;
        let mut ballots = self.ballots.borrow_mut();
        let ballot = ballots.get_mut(&id).ok_or(BallotError::NotFound(id))?;
        f(ballot)
    }
}

fn rejected(ballot: BallotId, reason: &str) -> BallotError {
    BallotError::Rejected {
        ballot,
        reason: reason.to_string(),
    }
}

impl BallotService for NullBallotService {
    fn open_ballot(
        &self,
        name: &str,
        treasury: &TreasurySymbol,
        options: &[AccountName],
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<BallotId, BallotError> {
        self.injected_failure()?;
        let id = BallotId::new(self.last_id.get() + 1);
        self.last_id.set(id.as_u64());
        self.ballots.borrow_mut().insert(
            id,
            NullBallot {
                name: name.to_string(),
                treasury: treasury.clone(),
                options: options.iter().cloned().collect(),
                begin,
                end,
                voting_open: false,
                tally: None,
            },
        );
        Ok(id)
    }

    fn add_option(&self, id: BallotId, option: &AccountName) -> Result<(), BallotError> {
        self.with_ballot(id, |ballot| {
            if ballot.voting_open {
                return Err(rejected(id, "voting already open"));
            }
            if !ballot.options.insert(option.clone()) {
                return Err(rejected(id, "duplicate option"));
            }
            Ok(())
        })
    }

    fn remove_option(&self, id: BallotId, option: &AccountName) -> Result<(), BallotError> {
        self.with_ballot(id, |ballot| {
            if ballot.voting_open {
                return Err(rejected(id, "voting already open"));
            }
            if !ballot.options.remove(option) {
                return Err(rejected(id, "unknown option"));
            }
            Ok(())
        })
    }

    fn open_voting(&self, id: BallotId) -> Result<(), BallotError> {
        self.with_ballot(id, |ballot| {
            ballot.voting_open = true;
            Ok(())
        })
    }

    fn get_tally(&self, id: BallotId) -> Result<Tally, BallotError> {
        self.with_ballot(id, |ballot| Ok(ballot.tally.clone().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> AccountName {
        AccountName::parse(raw).unwrap()
    }

    #[test]
    fn options_freeze_once_voting_opens() {
        let service = NullBallotService::new();
        let treasury = TreasurySymbol::parse("TFVT").unwrap();
        let id = service
            .open_ballot("tfboard.1", &treasury, &[], Timestamp::new(10), Timestamp::new(20))
            .unwrap();
        assert_eq!(id, BallotId::new(1));
        service.add_option(id, &name("alice")).unwrap();
        assert!(service.add_option(id, &name("alice")).is_err());
        service.open_voting(id).unwrap();
        service.open_voting(id).unwrap();
        assert!(service.ballot(id).unwrap().voting_open);
        assert!(service.remove_option(id, &name("alice")).is_err());
        assert_eq!(service.latest(), Some(id));
    }

    #[test]
    fn unset_tally_is_empty() {
        let service = NullBallotService::new();
        let treasury = TreasurySymbol::parse("TFVT").unwrap();
        let id = service
            .open_ballot("b", &treasury, &[], Timestamp::new(0), Timestamp::new(1))
            .unwrap();
        assert_eq!(service.get_tally(id).unwrap(), Tally::default());
        assert!(matches!(
            service.get_tally(BallotId::new(9)),
            Err(BallotError::NotFound(_))
        ));
    }
}
