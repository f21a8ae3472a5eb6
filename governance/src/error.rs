use std::fmt;

use thiserror::Error;

use tfgov_store::StoreError;
use tfgov_types::{AccountName, BallotId, ElectionPhase, Timestamp};

use crate::ballot::BallotError;
use crate::host::HostError;

/// Which keyed collection an entry lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Account,
    Nominee,
    Candidate,
    BoardMember,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Account => "account",
            Self::Nominee => "nominee",
            Self::Candidate => "candidate",
            Self::BoardMember => "board member",
        };
        f.write_str(s)
    }
}

/// Phase and window checks that can reject an operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("governance config has not been set")]
    NotConfigured,

    #[error("too early: window opens at {opens_at}, now is {now}")]
    TooEarly { now: Timestamp, opens_at: Timestamp },

    #[error("an election is already active ({ballot})")]
    AlreadyActive { ballot: BallotId },

    #[error("no election is active")]
    NoActiveElection,

    #[error("election is in phase {actual}, expected {expected}")]
    WrongPhase {
        expected: ElectionPhase,
        actual: ElectionPhase,
    },

    #[error("candidacy closed at {closed_at}")]
    CandidacyClosed { closed_at: Timestamp },

    #[error("voting closed at {closed_at}")]
    VotingClosed { closed_at: Timestamp },

    #[error("no election due: term runs until {due_at} and no seat is open")]
    ElectionNotDue { due_at: Timestamp },

    #[error("operation not allowed while an election is in progress")]
    ElectionInProgress,

    #[error("{name} is registered as a candidate in the open election")]
    CandidateRegistered { name: AccountName },

    #[error("board already has {members} members")]
    BoardNotEmpty { members: u32 },
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("unauthorized: requires the authority of {required}")]
    Unauthorized { required: AccountName },

    #[error("{kind} {name} not found")]
    NotFound { kind: EntryKind, name: AccountName },

    #[error("{name} is already a {kind}")]
    DuplicateEntry { kind: EntryKind, name: AccountName },

    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidState),

    #[error("capacity exceeded: {requested} requested, limit is {max}")]
    CapacityExceeded { max: u32, requested: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ballot service error: {0}")]
    Ballot(#[from] BallotError),

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// The coarse failure classes callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    DuplicateEntry,
    InvalidState,
    CapacityExceeded,
    /// The store, the ballot service or the host failed.
    Collaborator,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Self::InvalidState(_) | Self::InvalidConfig(_) => ErrorKind::InvalidState,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::Store(_) | Self::Ballot(_) => ErrorKind::Collaborator,
            Self::Host(HostError::MissingAuthority(_)) => ErrorKind::Unauthorized,
            Self::Host(_) => ErrorKind::Collaborator,
        }
    }

    pub(crate) fn not_found(kind: EntryKind, name: &AccountName) -> Self {
        Self::NotFound {
            kind,
            name: name.clone(),
        }
    }

    pub(crate) fn duplicate(kind: EntryKind, name: &AccountName) -> Self {
        Self::DuplicateEntry {
            kind,
            name: name.clone(),
        }
    }
}
