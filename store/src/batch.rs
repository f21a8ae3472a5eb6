//! Write sets: every mutation an operation makes, applied in one shot.
//!
//! Operations build a [`GovernanceBatch`] while validating, then hand it to
//! [`GovernanceStore::apply`](crate::GovernanceStore::apply). A batch that is
//! never applied leaves no trace, which is how a failed operation rolls back.

use crate::{BoardMemberRecord, CandidateRecord, NomineeRecord};
use tfgov_types::{AccountName, GovernanceConfig};

/// One storage mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    PutConfig(GovernanceConfig),
    PutNominee(NomineeRecord),
    DeleteNominee(AccountName),
    PutCandidate(CandidateRecord),
    DeleteCandidate(AccountName),
    ClearCandidates,
    PutMember(BoardMemberRecord),
    DeleteMember(AccountName),
}

/// An ordered list of mutations applied atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GovernanceBatch {
    ops: Vec<BatchOp>,
}

impl GovernanceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_config(&mut self, config: GovernanceConfig) -> &mut Self {
        self.ops.push(BatchOp::PutConfig(config));
        self
    }

    pub fn put_nominee(&mut self, record: NomineeRecord) -> &mut Self {
        self.ops.push(BatchOp::PutNominee(record));
        self
    }

    pub fn delete_nominee(&mut self, name: &AccountName) -> &mut Self {
        self.ops.push(BatchOp::DeleteNominee(name.clone()));
        self
    }

    pub fn put_candidate(&mut self, record: CandidateRecord) -> &mut Self {
        self.ops.push(BatchOp::PutCandidate(record));
        self
    }

    pub fn delete_candidate(&mut self, name: &AccountName) -> &mut Self {
        self.ops.push(BatchOp::DeleteCandidate(name.clone()));
        self
    }

    pub fn clear_candidates(&mut self) -> &mut Self {
        self.ops.push(BatchOp::ClearCandidates);
        self
    }

    pub fn put_member(&mut self, record: BoardMemberRecord) -> &mut Self {
        self.ops.push(BatchOp::PutMember(record));
        self
    }

    pub fn delete_member(&mut self, name: &AccountName) -> &mut Self {
        self.ops.push(BatchOp::DeleteMember(name.clone()));
        self
    }

    /// Append every operation of `other`, preserving order.
    pub fn extend(&mut self, other: GovernanceBatch) -> &mut Self {
        self.ops.extend(other.ops);
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
