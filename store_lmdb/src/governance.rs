//! LMDB implementation of the governance store traits.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use tfgov_store::{
    BatchOp, BoardMemberRecord, BoardStore, CandidateRecord, CandidateStore, ConfigStore,
    GovernanceBatch, GovernanceStore, NomineeRecord, NomineeStore, StoreError,
};
use tfgov_types::{AccountName, GovernanceConfig};

use crate::LmdbError;

const CONFIG_KEY: &[u8] = b"config";

/// Governance state stored in four LMDB databases of one environment.
///
/// Obtained from [`LmdbEnvironment::governance_store`](crate::LmdbEnvironment::governance_store).
pub struct LmdbGovernanceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) config_db: Database<Bytes, Bytes>,
    pub(crate) nominees_db: Database<Bytes, Bytes>,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) board_db: Database<Bytes, Bytes>,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

fn get_record<T: DeserializeOwned>(
    rtxn: &RoTxn,
    db: &Database<Bytes, Bytes>,
    key: &[u8],
) -> Result<Option<T>, LmdbError> {
    db.get(rtxn, key)?.map(decode).transpose()
}

fn iter_records<T: DeserializeOwned>(
    rtxn: &RoTxn,
    db: &Database<Bytes, Bytes>,
) -> Result<Vec<T>, LmdbError> {
    let mut records = Vec::new();
    for entry in db.iter(rtxn)? {
        let (_, value) = entry?;
        records.push(decode(value)?);
    }
    Ok(records)
}

impl LmdbGovernanceStore {
    fn read<T, F>(&self, db: &Database<Bytes, Bytes>, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&RoTxn, &Database<Bytes, Bytes>) -> Result<T, LmdbError>,
    {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(f(&rtxn, db)?)
    }
}

impl ConfigStore for LmdbGovernanceStore {
    fn get_config(&self) -> Result<Option<GovernanceConfig>, StoreError> {
        self.read(&self.config_db, |rtxn, db| get_record(rtxn, db, CONFIG_KEY))
    }
}

impl NomineeStore for LmdbGovernanceStore {
    fn get_nominee(&self, name: &AccountName) -> Result<Option<NomineeRecord>, StoreError> {
        self.read(&self.nominees_db, |rtxn, db| {
            get_record(rtxn, db, name.as_bytes())
        })
    }

    fn iter_nominees(&self) -> Result<Vec<NomineeRecord>, StoreError> {
        self.read(&self.nominees_db, iter_records)
    }
}

impl CandidateStore for LmdbGovernanceStore {
    fn get_candidate(&self, name: &AccountName) -> Result<Option<CandidateRecord>, StoreError> {
        self.read(&self.candidates_db, |rtxn, db| {
            get_record(rtxn, db, name.as_bytes())
        })
    }

    fn iter_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError> {
        self.read(&self.candidates_db, iter_records)
    }
}

impl BoardStore for LmdbGovernanceStore {
    fn get_member(&self, name: &AccountName) -> Result<Option<BoardMemberRecord>, StoreError> {
        self.read(&self.board_db, |rtxn, db| get_record(rtxn, db, name.as_bytes()))
    }

    fn iter_members(&self) -> Result<Vec<BoardMemberRecord>, StoreError> {
        self.read(&self.board_db, iter_records)
    }

    fn member_count(&self) -> Result<u32, StoreError> {
        self.read(&self.board_db, |rtxn, db| Ok(db.len(rtxn)? as u32))
    }
}

impl GovernanceStore for LmdbGovernanceStore {
    /// Applies the batch inside a single write transaction. Any failure drops
    /// the transaction, which aborts it.
    fn apply(&self, batch: &GovernanceBatch) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.ops() {
            match op {
                BatchOp::PutConfig(config) => {
                    self.config_db
                        .put(&mut wtxn, CONFIG_KEY, &encode(config)?)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::PutNominee(record) => {
                    self.nominees_db
                        .put(&mut wtxn, record.name.as_bytes(), &encode(record)?)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::DeleteNominee(name) => {
                    self.nominees_db
                        .delete(&mut wtxn, name.as_bytes())
                        .map_err(LmdbError::from)?;
                }
                BatchOp::PutCandidate(record) => {
                    self.candidates_db
                        .put(&mut wtxn, record.name.as_bytes(), &encode(record)?)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::DeleteCandidate(name) => {
                    self.candidates_db
                        .delete(&mut wtxn, name.as_bytes())
                        .map_err(LmdbError::from)?;
                }
                BatchOp::ClearCandidates => {
                    self.candidates_db
                        .clear(&mut wtxn)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::PutMember(record) => {
                    self.board_db
                        .put(&mut wtxn, record.name.as_bytes(), &encode(record)?)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::DeleteMember(name) => {
                    self.board_db
                        .delete(&mut wtxn, name.as_bytes())
                        .map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        trace!(ops = batch.len(), "governance batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
    use tfgov_types::Timestamp;

    fn name(raw: &str) -> AccountName {
        AccountName::parse(raw).unwrap()
    }

    fn open() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        (dir, env)
    }

    #[test]
    fn empty_store_has_no_config() {
        let (_dir, env) = open();
        let store = env.governance_store();
        assert!(store.get_config().unwrap().is_none());
        assert_eq!(store.member_count().unwrap(), 0);
    }

    #[test]
    fn batch_writes_every_collection() {
        let (_dir, env) = open();
        let store = env.governance_store();
        let config = GovernanceConfig::genesis(name("tf"));

        let mut batch = GovernanceBatch::new();
        batch
            .put_config(config.clone())
            .put_nominee(NomineeRecord {
                name: name("alice"),
                nominated_by: name("bob"),
                nominated_at: Timestamp::new(5),
            })
            .put_candidate(CandidateRecord {
                name: name("alice"),
                registered_at: Timestamp::new(6),
            })
            .put_member(BoardMemberRecord {
                name: name("carol"),
                seated_at: Timestamp::new(7),
            });
        store.apply(&batch).unwrap();

        assert_eq!(store.get_config().unwrap(), Some(config));
        assert!(store.is_nominee(&name("alice")).unwrap());
        assert!(store.is_candidate(&name("alice")).unwrap());
        assert!(store.is_member(&name("carol")).unwrap());
        assert_eq!(store.member_count().unwrap(), 1);
    }

    #[test]
    fn clear_and_delete_remove_records() {
        let (_dir, env) = open();
        let store = env.governance_store();

        let mut seed = GovernanceBatch::new();
        for raw in ["alice", "bob"] {
            seed.put_candidate(CandidateRecord {
                name: name(raw),
                registered_at: Timestamp::new(1),
            });
        }
        seed.put_member(BoardMemberRecord {
            name: name("carol"),
            seated_at: Timestamp::new(1),
        });
        store.apply(&seed).unwrap();

        let mut wipe = GovernanceBatch::new();
        wipe.clear_candidates().delete_member(&name("carol"));
        store.apply(&wipe).unwrap();

        assert!(store.iter_candidates().unwrap().is_empty());
        assert!(store.iter_members().unwrap().is_empty());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
            let mut batch = GovernanceBatch::new();
            batch.put_member(BoardMemberRecord {
                name: name("dave"),
                seated_at: Timestamp::new(9),
            });
            env.governance_store().apply(&batch).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        let members = env.governance_store().iter_members().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, name("dave"));
    }
}
