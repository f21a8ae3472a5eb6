//! LMDB database integrity checks.
//!
//! Run before the store is trusted: detects missing databases and records that
//! no longer decode, so an operator sees corruption before an operation trips
//! over it.

use heed::types::Bytes;
use heed::Database;
use serde::Serialize;

use tfgov_store::{BoardMemberRecord, CandidateRecord, NomineeRecord};
use tfgov_types::GovernanceConfig;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default, Serialize)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid governance environment.
const EXPECTED_DATABASES: &[&str] = &["config", "nominees", "candidates", "board", "meta"];

/// Check LMDB database integrity.
///
/// Opens each expected database, counts entries and decodes every governance
/// record. Read or decode failures are recorded in the report rather than
/// causing a hard error.
pub fn check_integrity(lmdb: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let env = lmdb.env();
    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    check_records::<GovernanceConfig>(&rtxn, &lmdb.config_db, "config", &mut report);
    check_records::<NomineeRecord>(&rtxn, &lmdb.nominees_db, "nominees", &mut report);
    check_records::<CandidateRecord>(&rtxn, &lmdb.candidates_db, "candidates", &mut report);
    check_records::<BoardMemberRecord>(&rtxn, &lmdb.board_db, "board", &mut report);

    Ok(report)
}

fn check_records<T: serde::de::DeserializeOwned>(
    rtxn: &heed::RoTxn,
    db: &Database<Bytes, Bytes>,
    db_name: &str,
    report: &mut IntegrityReport,
) {
    let iter = match db.iter(rtxn) {
        Ok(iter) => iter,
        Err(e) => {
            report
                .errors
                .push(format!("failed to iterate '{}': {}", db_name, e));
            return;
        }
    };
    for entry in iter {
        match entry {
            Ok((key, value)) => {
                if bincode::deserialize::<T>(value).is_err() {
                    report.errors.push(format!(
                        "undecodable record in '{}' under key '{}'",
                        db_name,
                        String::from_utf8_lossy(key)
                    ));
                }
            }
            Err(e) => report
                .errors
                .push(format!("failed to read entry in '{}': {}", db_name, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DEFAULT_MAP_SIZE;

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, EXPECTED_DATABASES.len() as u32);
        // schema version stamp
        assert_eq!(report.total_entries, 1);
    }

    #[test]
    fn garbage_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        {
            let mut wtxn = env.env().write_txn().unwrap();
            env.board_db.put(&mut wtxn, b"alice", &[0xffu8]).unwrap();
            wtxn.commit().unwrap();
        }
        let report = check_integrity(&env).unwrap();
        assert!(!report.is_healthy());
        assert!(report.errors[0].contains("board"));
    }
}
