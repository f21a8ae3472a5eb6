//! Reference to a ballot owned by the external ballot service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier handed out by the ballot service when a ballot is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallotId(u64);

impl BallotId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ballot#{}", self.0)
    }
}
