//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::{debug, info};

use crate::governance::LmdbGovernanceStore;
use crate::LmdbError;

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Number of named databases in the environment.
const MAX_DBS: u32 = 8;

/// Default map size: 64 MiB.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) config_db: Database<Bytes, Bytes>,
    pub(crate) nominees_db: Database<Bytes, Bytes>,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) board_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory and every database on first use and stamps the
    /// schema version; refuses to open an environment written by a different
    /// schema.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and the
        // directory is not shared with another LMDB user in a different mode.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let config_db = env.create_database(&mut wtxn, Some("config"))?;
        let nominees_db = env.create_database(&mut wtxn, Some("nominees"))?;
        let candidates_db = env.create_database(&mut wtxn, Some("candidates"))?;
        let board_db = env.create_database(&mut wtxn, Some("board"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        let stamped = meta_db
            .get(&wtxn, SCHEMA_VERSION_KEY)?
            .map(decode_version)
            .transpose()?;
        match stamped {
            Some(found) if found != SCHEMA_VERSION => {
                return Err(LmdbError::SchemaMismatch {
                    found,
                    expected: SCHEMA_VERSION,
                });
            }
            Some(found) => debug!(version = found, "schema version verified"),
            None => {
                meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())?;
                info!(path = %path.display(), "initialised new governance store");
            }
        }
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            config_db,
            nominees_db,
            candidates_db,
            board_db,
            meta_db,
        })
    }

    /// The underlying heed environment.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Schema version stamped in the meta database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => decode_version(bytes),
            None => Ok(0),
        }
    }

    /// A governance store backed by this environment.
    pub fn governance_store(&self) -> LmdbGovernanceStore {
        LmdbGovernanceStore {
            env: Arc::clone(&self.env),
            config_db: self.config_db,
            nominees_db: self.nominees_db,
            candidates_db: self.candidates_db,
            board_db: self.board_db,
        }
    }
}

fn decode_version(bytes: &[u8]) -> Result<u32, LmdbError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| {
        LmdbError::Serialization("schema_version has unexpected byte length".to_string())
    })?;
    Ok(u32::from_le_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_environment_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        assert_eq!(env.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn reopening_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        assert_eq!(env.schema_version().unwrap(), SCHEMA_VERSION);
    }
}
