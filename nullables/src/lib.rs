//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the governance engine (clock, host, ballot service,
//! storage) has a test-friendly implementation here that:
//! - returns deterministic values,
//! - can be steered programmatically (advance time, grant signatures, inject
//!   failures),
//! - never touches the filesystem.
//!
//! Usage: swap the real implementations for nullables in tests.

pub mod ballot;
pub mod clock;
pub mod host;
pub mod store;

pub use ballot::{NullBallot, NullBallotService};
pub use clock::NullClock;
pub use host::NullHost;
pub use store::NullGovernanceStore;
