//! Board election and governance engine.
//!
//! A fixed-size board of trustees is elected by token-weighted ballot and the
//! seated board is mirrored into the weighted multi-signature authority of a
//! governed account.
//!
//! Election cycle: `Idle → Nominating → Voting → Resolving → Idle`.
//! Nominees are proposed at any time, promoted to candidates while an election
//! is nominating, and resolved against the ballot's final tally by quorum and
//! tie policy. Every board change pushes a new authority to the host before
//! the change is persisted.
//!
//! Vote casting, signature checks and the authority primitive itself belong to
//! the [`BallotService`] and [`Host`] collaborators.

pub mod authority;
pub mod ballot;
pub mod board;
pub mod election;
pub mod engine;
pub mod error;
pub mod host;
pub mod outcome;
pub mod params;
pub mod registry;
pub mod settings;

pub use authority::{Authority, AuthorityBuilder, PermissionLevelWeight, ThresholdRule};
pub use ballot::{BallotError, BallotService, Tally};
pub use board::{set_permissions, Board, CommittedUpdate, PermissionUpdate};
pub use election::{ElectionKind, ElectionPlan, ElectionReport, ElectionStateMachine};
pub use engine::GovernanceEngine;
pub use error::{EntryKind, ErrorKind, GovernanceError, InvalidState};
pub use host::{Host, HostError};
pub use outcome::{required_quorum, resolve, Outcome, OutcomeTag, ResolverInput, TiePolicy};
pub use params::ConfigUpdate;
pub use registry::CandidacyRegistry;
pub use settings::{EngineConfig, SettingsError};
