//! Election state machine: the `Idle → Nominating → Voting → Resolving → Idle`
//! cycle over the persisted [`GovernanceConfig`].
//!
//! Every transition validates phase and time window before touching the
//! record, so a rejected call leaves the config exactly as it was loaded.
//! Callers persist the record afterwards.

use serde::Serialize;
use tracing::info;

use tfgov_types::{AccountName, BallotId, ElectionPhase, GovernanceConfig, Timestamp};

use crate::error::{GovernanceError, InvalidState};
use crate::outcome::Outcome;

/// Why an election is being held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionKind {
    /// The board term ran out; every seat is contested.
    Term,
    /// Seats are vacant mid-term; only those are contested.
    Vacancy,
}

/// What `makeelection` is about to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionPlan {
    pub kind: ElectionKind,
    pub seats: u32,
    pub voting_opens_at: Timestamp,
    pub voting_closes_at: Timestamp,
}

/// Result of a completed `endelect`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionReport {
    pub ballot: BallotId,
    pub kind: ElectionKind,
    pub outcome: Outcome,
    pub seated: Vec<AccountName>,
    pub unseated: Vec<AccountName>,
    pub open_seats: u32,
}

/// Phase transitions over a borrowed config record.
pub struct ElectionStateMachine<'a> {
    config: &'a mut GovernanceConfig,
}

impl<'a> ElectionStateMachine<'a> {
    pub fn new(config: &'a mut GovernanceConfig) -> Self {
        Self { config }
    }

    pub fn phase(&self) -> ElectionPhase {
        self.config.phase
    }

    pub fn kind(&self) -> ElectionKind {
        if self.config.is_term_election {
            ElectionKind::Term
        } else {
            ElectionKind::Vacancy
        }
    }

    fn active_ballot(&self) -> Result<BallotId, GovernanceError> {
        match (self.config.is_active_election, self.config.open_election_id) {
            (true, Some(ballot)) => Ok(ballot),
            _ => Err(InvalidState::NoActiveElection.into()),
        }
    }

    fn expect_phase(&self, expected: ElectionPhase) -> Result<(), GovernanceError> {
        if self.config.phase != expected {
            return Err(InvalidState::WrongPhase {
                expected,
                actual: self.config.phase,
            }
            .into());
        }
        Ok(())
    }

    /// Decide whether an election may open now and what it contests.
    ///
    /// Allowed from `Idle` only, once the term has expired or while a seat is
    /// vacant. Term expiry takes precedence.
    pub fn plan(&self, now: Timestamp) -> Result<ElectionPlan, GovernanceError> {
        if let Some(ballot) = self.config.open_election_id {
            return Err(InvalidState::AlreadyActive { ballot }.into());
        }
        self.expect_phase(ElectionPhase::Idle)?;

        let (kind, seats) = if self.config.is_term_expired(now) {
            (ElectionKind::Term, self.config.max_board_seats)
        } else if self.config.open_seats > 0 {
            (ElectionKind::Vacancy, self.config.open_seats)
        } else {
            return Err(InvalidState::ElectionNotDue {
                due_at: self.config.term_expires_at(),
            }
            .into());
        };

        let voting_opens_at = now.plus(self.config.start_delay);
        Ok(ElectionPlan {
            kind,
            seats,
            voting_opens_at,
            voting_closes_at: voting_opens_at.plus(self.config.issue_duration),
        })
    }

    /// `Idle → Nominating`.
    pub fn open(&mut self, plan: &ElectionPlan, ballot: BallotId) {
        let config = &mut *self.config;
        config.active_election_min_start_time = plan.voting_opens_at;
        config.open_election_id = Some(ballot);
        config.is_active_election = true;
        config.phase = ElectionPhase::Nominating;
        config.is_term_election = plan.kind == ElectionKind::Term;
        config.open_seats = plan.seats;
        config.elections_held += 1;
        info!(
            %ballot,
            kind = ?plan.kind,
            seats = plan.seats,
            opens_at = %plan.voting_opens_at,
            closes_at = %plan.voting_closes_at,
            "election opened"
        );
    }

    /// Candidates may register while nominating and before voting may start.
    pub fn ensure_candidacy_open(&self, now: Timestamp) -> Result<BallotId, GovernanceError> {
        let ballot = self.active_ballot()?;
        self.expect_phase(ElectionPhase::Nominating)?;
        let closed_at = self.config.active_election_min_start_time;
        if now >= closed_at {
            return Err(InvalidState::CandidacyClosed { closed_at }.into());
        }
        Ok(ballot)
    }

    /// Candidates may withdraw until the voting window closes.
    pub fn ensure_not_closed(&self, now: Timestamp) -> Result<BallotId, GovernanceError> {
        let ballot = self.active_ballot()?;
        let closed_at = self.config.voting_closes_at();
        if now >= closed_at {
            return Err(InvalidState::VotingClosed { closed_at }.into());
        }
        Ok(ballot)
    }

    /// `Nominating → Voting`, at or after the window start.
    pub fn begin_voting(&mut self, now: Timestamp) -> Result<BallotId, GovernanceError> {
        let ballot = self.active_ballot()?;
        self.expect_phase(ElectionPhase::Nominating)?;
        let opens_at = self.config.active_election_min_start_time;
        if now < opens_at {
            return Err(InvalidState::TooEarly { now, opens_at }.into());
        }
        self.config.phase = ElectionPhase::Voting;
        info!(%ballot, "voting started");
        Ok(ballot)
    }

    /// `Voting → Resolving`, at or after the window end.
    pub fn begin_resolving(&mut self, now: Timestamp) -> Result<BallotId, GovernanceError> {
        let ballot = self.active_ballot()?;
        self.expect_phase(ElectionPhase::Voting)?;
        let opens_at = self.config.voting_closes_at();
        if now < opens_at {
            return Err(InvalidState::TooEarly { now, opens_at }.into());
        }
        self.config.phase = ElectionPhase::Resolving;
        Ok(ballot)
    }

    /// `Resolving → Idle`. `board_size` is the roster after winners are seated.
    pub fn finish(&mut self, now: Timestamp, seated: u32, board_size: u32) {
        let config = &mut *self.config;
        config.open_seats = if config.is_term_election {
            config.max_board_seats.saturating_sub(board_size)
        } else {
            config
                .open_seats
                .saturating_sub(seated)
                .min(config.max_board_seats.saturating_sub(board_size))
        };
        config.last_board_election_time = now;
        config.open_election_id = None;
        config.is_active_election = false;
        config.is_term_election = false;
        config.phase = ElectionPhase::Idle;
        info!(open_seats = config.open_seats, "election closed");
    }
}

/// Record a vacancy after a member leaves mid-term.
pub fn note_vacancy(config: &mut GovernanceConfig) {
    config.open_seats = (config.open_seats + 1).min(config.max_board_seats);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GovernanceConfig {
        let mut c = GovernanceConfig::genesis(AccountName::parse("tf").unwrap());
        c.max_board_seats = 5;
        c.open_seats = 0;
        c.start_delay = 100;
        c.issue_duration = 1_000;
        c.election_frequency = 10_000;
        c.last_board_election_time = Timestamp::new(50_000);
        c
    }

    fn open_at(c: &mut GovernanceConfig, now: u64) -> ElectionPlan {
        let mut machine = ElectionStateMachine::new(c);
        let plan = machine.plan(Timestamp::new(now)).unwrap();
        machine.open(&plan, BallotId::new(1));
        plan
    }

    #[test]
    fn not_due_without_vacancy_or_expiry() {
        let mut c = config();
        let machine = ElectionStateMachine::new(&mut c);
        let err = machine.plan(Timestamp::new(55_000)).unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::InvalidState(InvalidState::ElectionNotDue { due_at })
                if due_at == Timestamp::new(60_000)
        ));
    }

    #[test]
    fn vacancy_override_allows_out_of_cycle_election() {
        let mut c = config();
        c.open_seats = 2;
        let plan = open_at(&mut c, 55_000);
        assert_eq!(plan.kind, ElectionKind::Vacancy);
        assert_eq!(plan.seats, 2);
        assert_eq!(plan.voting_opens_at, Timestamp::new(55_100));
        assert_eq!(plan.voting_closes_at, Timestamp::new(56_100));
        assert!(c.is_consistent());
        assert_eq!(c.phase, ElectionPhase::Nominating);
    }

    #[test]
    fn term_expiry_contests_every_seat() {
        let mut c = config();
        c.open_seats = 1;
        let plan = open_at(&mut c, 60_000);
        assert_eq!(plan.kind, ElectionKind::Term);
        assert_eq!(c.open_seats, 5);
        assert!(c.is_term_election);
    }

    #[test]
    fn second_open_is_already_active() {
        let mut c = config();
        c.open_seats = 1;
        open_at(&mut c, 55_000);
        let machine = ElectionStateMachine::new(&mut c);
        assert!(matches!(
            machine.plan(Timestamp::new(55_001)),
            Err(GovernanceError::InvalidState(InvalidState::AlreadyActive { .. }))
        ));
    }

    #[test]
    fn windows_are_enforced_in_order() {
        let mut c = config();
        c.open_seats = 1;
        open_at(&mut c, 55_000);
        let mut machine = ElectionStateMachine::new(&mut c);

        assert!(machine.ensure_candidacy_open(Timestamp::new(55_099)).is_ok());
        assert!(matches!(
            machine.ensure_candidacy_open(Timestamp::new(55_100)),
            Err(GovernanceError::InvalidState(InvalidState::CandidacyClosed { .. }))
        ));
        assert!(matches!(
            machine.begin_resolving(Timestamp::new(60_000)),
            Err(GovernanceError::InvalidState(InvalidState::WrongPhase { .. }))
        ));
        assert!(matches!(
            machine.begin_voting(Timestamp::new(55_099)),
            Err(GovernanceError::InvalidState(InvalidState::TooEarly { .. }))
        ));
        machine.begin_voting(Timestamp::new(55_100)).unwrap();
        assert!(matches!(
            machine.begin_resolving(Timestamp::new(56_099)),
            Err(GovernanceError::InvalidState(InvalidState::TooEarly { .. }))
        ));
        assert!(machine.ensure_not_closed(Timestamp::new(56_099)).is_ok());
        assert!(machine.ensure_not_closed(Timestamp::new(56_100)).is_err());
        machine.begin_resolving(Timestamp::new(56_100)).unwrap();
        assert_eq!(machine.phase(), ElectionPhase::Resolving);
    }

    #[test]
    fn finish_carries_unfilled_vacancies_forward() {
        let mut c = config();
        c.open_seats = 3;
        open_at(&mut c, 55_000);
        let mut machine = ElectionStateMachine::new(&mut c);
        machine.begin_voting(Timestamp::new(55_100)).unwrap();
        machine.begin_resolving(Timestamp::new(56_100)).unwrap();
        machine.finish(Timestamp::new(56_200), 1, 3);
        assert_eq!(c.open_seats, 2);
        assert_eq!(c.last_board_election_time, Timestamp::new(56_200));
        assert_eq!(c.phase, ElectionPhase::Idle);
        assert!(c.is_consistent());
    }

    #[test]
    fn finish_after_term_election_recomputes_vacancies() {
        let mut c = config();
        open_at(&mut c, 60_000);
        let mut machine = ElectionStateMachine::new(&mut c);
        machine.begin_voting(Timestamp::new(60_100)).unwrap();
        machine.begin_resolving(Timestamp::new(61_100)).unwrap();
        machine.finish(Timestamp::new(61_100), 3, 3);
        assert_eq!(c.open_seats, 2);
        assert!(!c.is_term_election);
    }

    #[test]
    fn vacancy_is_capped_by_board_size() {
        let mut c = config();
        c.open_seats = 5;
        note_vacancy(&mut c);
        assert_eq!(c.open_seats, 5);
    }
}
