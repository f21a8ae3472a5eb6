//! The persisted governance configuration singleton.
//!
//! Seat counts, quorum divisors and the timing constants consumed by the
//! election state machine, together with the bookkeeping of the election
//! currently in flight.

use crate::{AccountName, BallotId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the board election cycle.
///
/// `Resolving` is transient: it only exists inside `endelect` and is never
/// persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionPhase {
    /// No election open. Initial state and the end of every cycle.
    #[default]
    Idle,
    /// Ballot created, candidates may register until the voting window opens.
    Nominating,
    /// Ballot open for vote casting.
    Voting,
    /// Final tally being applied.
    Resolving,
}

impl fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Nominating => "nominating",
            Self::Voting => "voting",
            Self::Resolving => "resolving",
        };
        f.write_str(s)
    }
}

/// The governance configuration record. One instance per governance deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Identity allowed to change this configuration and seed the board.
    pub publisher: AccountName,

    // ── Seats ────────────────────────────────────────────────────────────
    /// Upper bound on the number of seated board members.
    pub max_board_seats: u32,

    /// Seats currently vacant and up for election.
    pub open_seats: u32,

    // ── Quorum ───────────────────────────────────────────────────────────
    /// Required quorum weight = total eligible weight / this divisor.
    pub holder_quorum_divisor: u32,

    /// Board-level quorum divisor, carried for board-side decisions.
    pub board_quorum_divisor: u32,

    // ── Timing (seconds) ─────────────────────────────────────────────────
    /// Length of the voting window.
    pub issue_duration: u64,

    /// Delay between opening an election and the start of voting.
    pub start_delay: u64,

    /// Retention of the leaderboard on the ballot service.
    pub leaderboard_duration: u64,

    /// Board term length: minimum spacing between scheduled elections.
    pub election_frequency: u64,

    // ── Election bookkeeping ─────────────────────────────────────────────
    /// When the last board election resolved.
    pub last_board_election_time: Timestamp,

    /// Earliest time voting may start on the open election.
    pub active_election_min_start_time: Timestamp,

    /// Ballot currently in flight, if any.
    pub open_election_id: Option<BallotId>,

    /// True exactly when `open_election_id` is set.
    pub is_active_election: bool,

    /// Current phase of the election cycle.
    pub phase: ElectionPhase,

    /// Whether the open election contests the whole board (term expiry).
    pub is_term_election: bool,

    /// Number of elections opened so far; used to name ballots.
    pub elections_held: u64,
}

impl GovernanceConfig {
    pub const DEFAULT_MAX_BOARD_SEATS: u32 = 12;
    pub const DEFAULT_HOLDER_QUORUM_DIVISOR: u32 = 5;
    pub const DEFAULT_BOARD_QUORUM_DIVISOR: u32 = 2;
    pub const DEFAULT_ISSUE_DURATION: u64 = 2_000_000; // ~23 days
    pub const DEFAULT_START_DELAY: u64 = 1_200; // 20 minutes
    pub const DEFAULT_LEADERBOARD_DURATION: u64 = 2_000_000;
    pub const DEFAULT_ELECTION_FREQUENCY: u64 = 14_515_200; // 24 weeks

    /// A fresh configuration owned by `publisher`: empty board, every seat open,
    /// no election ever held.
    pub fn genesis(publisher: AccountName) -> Self {
        Self {
            publisher,
            max_board_seats: Self::DEFAULT_MAX_BOARD_SEATS,
            open_seats: Self::DEFAULT_MAX_BOARD_SEATS,
            holder_quorum_divisor: Self::DEFAULT_HOLDER_QUORUM_DIVISOR,
            board_quorum_divisor: Self::DEFAULT_BOARD_QUORUM_DIVISOR,
            issue_duration: Self::DEFAULT_ISSUE_DURATION,
            start_delay: Self::DEFAULT_START_DELAY,
            leaderboard_duration: Self::DEFAULT_LEADERBOARD_DURATION,
            election_frequency: Self::DEFAULT_ELECTION_FREQUENCY,
            last_board_election_time: Timestamp::EPOCH,
            active_election_min_start_time: Timestamp::EPOCH,
            open_election_id: None,
            is_active_election: false,
            phase: ElectionPhase::Idle,
            is_term_election: false,
            elections_held: 0,
        }
    }

    /// End of the voting window of the open election.
    pub fn voting_closes_at(&self) -> Timestamp {
        self.active_election_min_start_time.plus(self.issue_duration)
    }

    /// When the current board term runs out.
    pub fn term_expires_at(&self) -> Timestamp {
        self.last_board_election_time.plus(self.election_frequency)
    }

    /// True once the board term has run out.
    pub fn is_term_expired(&self, now: Timestamp) -> bool {
        self.last_board_election_time
            .has_expired(self.election_frequency, now)
    }

    /// Whether the record satisfies its own invariants.
    pub fn is_consistent(&self) -> bool {
        self.open_seats <= self.max_board_seats
            && self.is_active_election == self.open_election_id.is_some()
            && (self.phase == ElectionPhase::Idle) != self.is_active_election
    }
}
