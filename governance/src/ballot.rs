//! The external token-weighted ballot service.
//!
//! The engine opens ballots, edits their option set and reads back final
//! tallies. Vote casting and tally arithmetic belong to the service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tfgov_types::{AccountName, BallotId, Timestamp, TreasurySymbol};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BallotError {
    #[error("{0} not found")]
    NotFound(BallotId),

    #[error("{ballot} is still open until {ends_at}")]
    NotClosed { ballot: BallotId, ends_at: Timestamp },

    #[error("{ballot} rejected the request: {reason}")]
    Rejected { ballot: BallotId, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Final result of a closed ballot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Weighted votes per option.
    #[serde(default)]
    pub per_option_weight: BTreeMap<AccountName, u128>,

    /// All eligible weight in the treasury; the quorum denominator.
    pub total_raw_weight: u128,

    /// Number of distinct voters.
    #[serde(default)]
    pub total_voters: u32,
}

impl Tally {
    /// Weight cast for `option`, zero when it received no votes.
    pub fn weight_of(&self, option: &AccountName) -> u128 {
        self.per_option_weight.get(option).copied().unwrap_or(0)
    }
}

pub trait BallotService {
    /// Create a ballot over `options`, weighted by `treasury`, accepting votes
    /// in `[begin, end]`.
    fn open_ballot(
        &self,
        name: &str,
        treasury: &TreasurySymbol,
        options: &[AccountName],
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<BallotId, BallotError>;

    fn add_option(&self, ballot: BallotId, option: &AccountName) -> Result<(), BallotError>;

    fn remove_option(&self, ballot: BallotId, option: &AccountName) -> Result<(), BallotError>;

    /// Mark the ballot open for vote casting. Opening a ballot that is
    /// already open succeeds, so a failed `startelect` can be retried.
    fn open_voting(&self, ballot: BallotId) -> Result<(), BallotError>;

    /// Final tally. Only valid once the ballot's end time has passed.
    fn get_tally(&self, ballot: BallotId) -> Result<Tally, BallotError>;
}

impl<T: BallotService + ?Sized> BallotService for &T {
    fn open_ballot(
        &self,
        name: &str,
        treasury: &TreasurySymbol,
        options: &[AccountName],
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<BallotId, BallotError> {
        (**self).open_ballot(name, treasury, options, begin, end)
    }

    fn add_option(&self, ballot: BallotId, option: &AccountName) -> Result<(), BallotError> {
        (**self).add_option(ballot, option)
    }

    fn remove_option(&self, ballot: BallotId, option: &AccountName) -> Result<(), BallotError> {
        (**self).remove_option(ballot, option)
    }

    fn open_voting(&self, ballot: BallotId) -> Result<(), BallotError> {
        (**self).open_voting(ballot)
    }

    fn get_tally(&self, ballot: BallotId) -> Result<Tally, BallotError> {
        (**self).get_tally(ballot)
    }
}
