//! The governance engine: the externally invoked operations.
//!
//! Every operation follows the same shape:
//!
//! 1. re-read the persisted state it needs (no cached copies),
//! 2. check authorization, phase and window,
//! 3. call the external collaborators,
//! 4. persist one [`GovernanceBatch`] (or commit a [`PermissionUpdate`] when
//!    the board changes).
//!
//! A failure at any step leaves the store untouched. Collaborator calls made
//! before a failed store write are compensated where the collaborator allows.

use tracing::{info, warn};

use tfgov_store::{
    BoardMemberRecord, CandidateRecord, GovernanceBatch, GovernanceStore, NomineeRecord,
};
use tfgov_types::{AccountName, BallotId, ElectionPhase, GovernanceConfig, Timestamp};

use crate::authority::{Authority, AuthorityBuilder};
use crate::ballot::BallotService;
use crate::board::{Board, CommittedUpdate, PermissionUpdate};
use crate::election::{note_vacancy, ElectionKind, ElectionReport, ElectionStateMachine};
use crate::error::{EntryKind, GovernanceError, InvalidState};
use crate::host::{Host, HostError};
use crate::outcome::{resolve, ResolverInput};
use crate::params::ConfigUpdate;
use crate::registry::CandidacyRegistry;
use crate::settings::EngineConfig;

fn rejected(op: &'static str, e: &GovernanceError) {
    warn!(op, kind = ?e.kind(), error = %e, "operation rejected");
}

pub struct GovernanceEngine<S, H, B> {
    store: S,
    host: H,
    ballots: B,
    settings: EngineConfig,
}

impl<S, H, B> GovernanceEngine<S, H, B>
where
    S: GovernanceStore,
    H: Host,
    B: BallotService,
{
    pub fn new(store: S, host: H, ballots: B, settings: EngineConfig) -> Self {
        Self {
            store,
            host,
            ballots,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn load_config(&self) -> Result<GovernanceConfig, GovernanceError> {
        self.store
            .get_config()?
            .ok_or_else(|| InvalidState::NotConfigured.into())
    }

    fn authorize(&self, account: &AccountName) -> Result<(), GovernanceError> {
        match self.host.require_authorization(account) {
            Ok(()) => Ok(()),
            Err(HostError::MissingAuthority(_)) => Err(GovernanceError::Unauthorized {
                required: account.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Succeeds if the call carries the authority of any of `accounts`.
    fn authorize_any(&self, accounts: &[&AccountName]) -> Result<(), GovernanceError> {
        for account in accounts {
            match self.host.require_authorization(account) {
                Ok(()) => return Ok(()),
                Err(HostError::MissingAuthority(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(GovernanceError::Unauthorized {
            required: accounts
                .first()
                .map(|a| (*a).clone())
                .unwrap_or_else(|| self.settings.governed_account.clone()),
        })
    }

    fn authority_builder(&self, config: &GovernanceConfig) -> AuthorityBuilder {
        AuthorityBuilder::new(self.settings.threshold_rule, config.publisher.clone())
    }

    fn apply(&self, batch: &GovernanceBatch) -> Result<(), GovernanceError> {
        self.store.apply(batch)?;
        Ok(())
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Set the governance parameters. The first call creates the record and
    /// makes `caller` its publisher; later calls must come from the publisher.
    pub fn setconfig(
        &self,
        caller: &AccountName,
        update: &ConfigUpdate,
    ) -> Result<GovernanceConfig, GovernanceError> {
        self.setconfig_inner(caller, update)
            .inspect_err(|e| rejected("setconfig", e))
    }

    fn setconfig_inner(
        &self,
        caller: &AccountName,
        update: &ConfigUpdate,
    ) -> Result<GovernanceConfig, GovernanceError> {
        let mut config = match self.store.get_config()? {
            Some(config) => {
                if &config.publisher != caller {
                    return Err(GovernanceError::Unauthorized {
                        required: config.publisher,
                    });
                }
                config
            }
            None => GovernanceConfig::genesis(caller.clone()),
        };
        self.authorize(caller)?;
        if config.is_active_election {
            return Err(InvalidState::ElectionInProgress.into());
        }

        let board_size = self.store.member_count()?;
        update.validate(board_size)?;
        update.apply_to(&mut config, board_size);

        let mut batch = GovernanceBatch::new();
        batch.put_config(config.clone());
        self.apply(&batch)?;
        info!(
            publisher = %config.publisher,
            max_board_seats = config.max_board_seats,
            open_seats = config.open_seats,
            "governance config set"
        );
        Ok(config)
    }

    // ── Candidacy ───────────────────────────────────────────────────────

    pub fn nominate(
        &self,
        nominee: &AccountName,
        nominator: &AccountName,
    ) -> Result<(), GovernanceError> {
        self.nominate_inner(nominee, nominator)
            .inspect_err(|e| rejected("nominate", e))
    }

    fn nominate_inner(
        &self,
        nominee: &AccountName,
        nominator: &AccountName,
    ) -> Result<(), GovernanceError> {
        self.authorize(nominator)?;
        if !self.host.account_exists(nominee) {
            return Err(GovernanceError::not_found(EntryKind::Account, nominee));
        }
        let now = self.host.now();
        let incumbents_eligible = self
            .store
            .get_config()?
            .is_some_and(|config| config.is_term_expired(now));
        let mut batch = GovernanceBatch::new();
        CandidacyRegistry::new(&self.store).stage_nomination(
            nominee,
            nominator,
            now,
            incumbents_eligible,
            &mut batch,
        )?;
        self.apply(&batch)?;
        info!(nominee = %nominee, nominator = %nominator, "nominated");
        Ok(())
    }

    /// Drop a nominee. Authorised by the nominee or the publisher; only the
    /// nominee before the first `setconfig`.
    pub fn unnominate(&self, nominee: &AccountName) -> Result<NomineeRecord, GovernanceError> {
        self.unnominate_inner(nominee)
            .inspect_err(|e| rejected("unnominate", e))
    }

    fn unnominate_inner(&self, nominee: &AccountName) -> Result<NomineeRecord, GovernanceError> {
        match self.store.get_config()? {
            Some(config) => self.authorize_any(&[nominee, &config.publisher])?,
            None => self.authorize(nominee)?,
        }
        let mut batch = GovernanceBatch::new();
        let record = CandidacyRegistry::new(&self.store).stage_unnomination(nominee, &mut batch)?;
        self.apply(&batch)?;
        info!(nominee = %nominee, "nomination dropped");
        Ok(record)
    }

    /// Register a nominee as an option on the open ballot.
    pub fn addcand(&self, candidate: &AccountName) -> Result<(), GovernanceError> {
        self.addcand_inner(candidate)
            .inspect_err(|e| rejected("addcand", e))
    }

    fn addcand_inner(&self, candidate: &AccountName) -> Result<(), GovernanceError> {
        self.authorize(candidate)?;
        let mut config = self.load_config()?;
        let now = self.host.now();
        let ballot = ElectionStateMachine::new(&mut config).ensure_candidacy_open(now)?;

        let mut batch = GovernanceBatch::new();
        CandidacyRegistry::new(&self.store).stage_candidacy(
            candidate,
            now,
            self.settings.max_candidates,
            &mut batch,
        )?;

        self.ballots.add_option(ballot, candidate)?;
        if let Err(e) = self.apply(&batch) {
            if let Err(undo) = self.ballots.remove_option(ballot, candidate) {
                warn!(%ballot, candidate = %candidate, error = %undo, "failed to withdraw ballot option");
            }
            return Err(e);
        }
        info!(%ballot, candidate = %candidate, "candidate registered");
        Ok(())
    }

    /// Withdraw a candidate before voting closes. Authorised by the candidate
    /// or the publisher.
    pub fn removecand(&self, candidate: &AccountName) -> Result<(), GovernanceError> {
        self.removecand_inner(candidate)
            .inspect_err(|e| rejected("removecand", e))
    }

    fn removecand_inner(&self, candidate: &AccountName) -> Result<(), GovernanceError> {
        let mut config = self.load_config()?;
        self.authorize_any(&[candidate, &config.publisher])?;
        let now = self.host.now();
        let ballot = ElectionStateMachine::new(&mut config).ensure_not_closed(now)?;

        let mut batch = GovernanceBatch::new();
        CandidacyRegistry::new(&self.store).stage_withdrawal(candidate, &mut batch)?;

        // Once voting started the option stays on the ballot; its votes are
        // ignored at resolution.
        let deregister = config.phase == ElectionPhase::Nominating;
        if deregister {
            self.ballots.remove_option(ballot, candidate)?;
        }
        if let Err(e) = self.apply(&batch) {
            if deregister {
                if let Err(undo) = self.ballots.add_option(ballot, candidate) {
                    warn!(%ballot, candidate = %candidate, error = %undo, "failed to restore ballot option");
                }
            }
            return Err(e);
        }
        info!(%ballot, candidate = %candidate, deregistered = deregister, "candidate withdrawn");
        Ok(())
    }

    // ── Election cycle ──────────────────────────────────────────────────

    /// Open an election when the term has expired or a seat is vacant.
    pub fn makeelection(&self, holder: &AccountName) -> Result<BallotId, GovernanceError> {
        self.makeelection_inner(holder)
            .inspect_err(|e| rejected("makeelection", e))
    }

    fn makeelection_inner(&self, holder: &AccountName) -> Result<BallotId, GovernanceError> {
        self.authorize(holder)?;
        let mut config = self.load_config()?;
        let now = self.host.now();
        let plan = ElectionStateMachine::new(&mut config).plan(now)?;

        let name = self.settings.ballot_name(config.elections_held + 1);
        let ballot = self.ballots.open_ballot(
            &name,
            &self.settings.treasury_symbol,
            &[],
            plan.voting_opens_at,
            plan.voting_closes_at,
        )?;
        ElectionStateMachine::new(&mut config).open(&plan, ballot);

        let mut batch = GovernanceBatch::new();
        batch.clear_candidates().put_config(config);
        if let Err(e) = self.apply(&batch) {
            warn!(%ballot, ballot_name = %name, "ballot opened but election was not persisted");
            return Err(e);
        }
        Ok(ballot)
    }

    /// Open the ballot for vote casting.
    pub fn startelect(&self, holder: &AccountName) -> Result<BallotId, GovernanceError> {
        self.startelect_inner(holder)
            .inspect_err(|e| rejected("startelect", e))
    }

    fn startelect_inner(&self, holder: &AccountName) -> Result<BallotId, GovernanceError> {
        self.authorize(holder)?;
        let mut config = self.load_config()?;
        let ballot = ElectionStateMachine::new(&mut config).begin_voting(self.host.now())?;
        self.ballots.open_voting(ballot)?;

        let mut batch = GovernanceBatch::new();
        batch.put_config(config);
        self.apply(&batch)?;
        Ok(ballot)
    }

    /// Close the election: resolve the final tally, seat the winners, push the
    /// new board authority and return to `Idle`.
    pub fn endelect(&self, holder: &AccountName) -> Result<ElectionReport, GovernanceError> {
        self.endelect_inner(holder)
            .inspect_err(|e| rejected("endelect", e))
    }

    fn endelect_inner(&self, holder: &AccountName) -> Result<ElectionReport, GovernanceError> {
        self.authorize(holder)?;
        let mut config = self.load_config()?;
        let now = self.host.now();
        let ballot = ElectionStateMachine::new(&mut config).begin_resolving(now)?;
        let kind = ElectionStateMachine::new(&mut config).kind();

        let tally = self.ballots.get_tally(ballot)?;
        let registry = CandidacyRegistry::new(&self.store);
        let candidates = registry.candidates()?;
        let outcome = resolve(&ResolverInput {
            tally: &tally,
            candidates: &candidates,
            open_seats: config.open_seats,
            holder_quorum_divisor: config.holder_quorum_divisor,
            tie_policy: self.settings.tie_policy,
        });
        info!(
            %ballot,
            outcome = %outcome.tag(),
            winners = outcome.winners().len(),
            voters = tally.total_voters,
            "election resolved"
        );

        let before = Board::load(&self.store, config.max_board_seats)?;
        let mut after = before.clone();
        let winners = outcome.winners();
        if kind == ElectionKind::Term && !winners.is_empty() {
            after.clear();
        }
        for winner in winners {
            if after.contains(winner) {
                continue;
            }
            if after.vacancies() == 0 {
                warn!(%ballot, winner = %winner, "no seat left for winner");
                break;
            }
            after.add_to_tfboard(winner)?;
        }

        let mut batch = GovernanceBatch::new();
        registry.stage_resolution(&candidates, &mut batch);
        let seated = after.members().filter(|m| !before.contains(m)).count() as u32;
        ElectionStateMachine::new(&mut config).finish(now, seated, after.len());
        let open_seats = config.open_seats;
        batch.put_config(config.clone());

        let update = PermissionUpdate::prepare(
            &self.settings.governed_account,
            &self.authority_builder(&config),
            &before,
            &after,
            batch,
            now,
        );
        let committed = update.commit(&self.store, &self.host)?;

        Ok(ElectionReport {
            ballot,
            kind,
            outcome,
            seated: committed.seated,
            unseated: committed.unseated,
            open_seats,
        })
    }

    // ── Board membership ────────────────────────────────────────────────

    /// Forced removal, authorised by the board's own authority.
    pub fn removemember(&self, member: &AccountName) -> Result<CommittedUpdate, GovernanceError> {
        self.removemember_inner(member)
            .inspect_err(|e| rejected("removemember", e))
    }

    fn removemember_inner(&self, member: &AccountName) -> Result<CommittedUpdate, GovernanceError> {
        self.authorize(&self.settings.governed_account)?;
        let committed = self.unseat(member)?;
        info!(member = %member, "board member removed");
        Ok(committed)
    }

    /// Self-service removal, authorised by `member`.
    pub fn resign(&self, member: &AccountName) -> Result<CommittedUpdate, GovernanceError> {
        self.resign_inner(member)
            .inspect_err(|e| rejected("resign", e))
    }

    fn resign_inner(&self, member: &AccountName) -> Result<CommittedUpdate, GovernanceError> {
        self.authorize(member)?;
        let committed = self.unseat(member)?;
        info!(member = %member, "board member resigned");
        Ok(committed)
    }

    fn unseat(&self, member: &AccountName) -> Result<CommittedUpdate, GovernanceError> {
        let mut config = self.load_config()?;
        let before = Board::load(&self.store, config.max_board_seats)?;
        let mut after = before.clone();
        after.rmv_from_tfboard(member)?;
        note_vacancy(&mut config);

        let mut batch = GovernanceBatch::new();
        batch.put_config(config.clone());
        PermissionUpdate::prepare(
            &self.settings.governed_account,
            &self.authority_builder(&config),
            &before,
            &after,
            batch,
            self.host.now(),
        )
        .commit(&self.store, &self.host)
    }

    /// Seat an initial board. Publisher only, on an empty board, outside an
    /// election. Starts a new term.
    pub fn seatboard(&self, members: &[AccountName]) -> Result<CommittedUpdate, GovernanceError> {
        self.seatboard_inner(members)
            .inspect_err(|e| rejected("seatboard", e))
    }

    fn seatboard_inner(&self, members: &[AccountName]) -> Result<CommittedUpdate, GovernanceError> {
        let mut config = self.load_config()?;
        self.authorize(&config.publisher)?;
        if config.is_active_election {
            return Err(InvalidState::ElectionInProgress.into());
        }
        let before = Board::load(&self.store, config.max_board_seats)?;
        if !before.is_empty() {
            return Err(InvalidState::BoardNotEmpty {
                members: before.len(),
            }
            .into());
        }

        let mut after = before.clone();
        let mut batch = GovernanceBatch::new();
        for member in members {
            if !self.host.account_exists(member) {
                return Err(GovernanceError::not_found(EntryKind::Account, member));
            }
            after.add_to_tfboard(member)?;
            if self.store.is_nominee(member)? {
                batch.delete_nominee(member);
            }
        }

        let now = self.host.now();
        config.open_seats = after.vacancies();
        config.last_board_election_time = now;
        batch.put_config(config.clone());

        let committed = PermissionUpdate::prepare(
            &self.settings.governed_account,
            &self.authority_builder(&config),
            &before,
            &after,
            batch,
            now,
        )
        .commit(&self.store, &self.host)?;
        info!(members = committed.seated.len(), "board seated");
        Ok(committed)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> Result<GovernanceConfig, GovernanceError> {
        self.load_config()
    }

    pub fn nominees(&self) -> Result<Vec<NomineeRecord>, GovernanceError> {
        Ok(self.store.iter_nominees()?)
    }

    pub fn candidates(&self) -> Result<Vec<CandidateRecord>, GovernanceError> {
        Ok(self.store.iter_candidates()?)
    }

    pub fn board(&self) -> Result<Vec<BoardMemberRecord>, GovernanceError> {
        Ok(self.store.iter_members()?)
    }

    /// `Idle` until the first `setconfig`.
    pub fn phase(&self) -> Result<ElectionPhase, GovernanceError> {
        Ok(self
            .store
            .get_config()?
            .map(|config| config.phase)
            .unwrap_or_default())
    }

    pub fn is_term_expired(&self) -> Result<bool, GovernanceError> {
        Ok(self.load_config()?.is_term_expired(self.host.now()))
    }

    /// The authority the current board implies.
    pub fn authority(&self) -> Result<Authority, GovernanceError> {
        let config = self.load_config()?;
        let board = Board::load(&self.store, config.max_board_seats)?;
        Ok(self.authority_builder(&config).build(board.members()))
    }

    pub fn now(&self) -> Timestamp {
        self.host.now()
    }
}
