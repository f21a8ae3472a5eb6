//! Engine settings with TOML file support.
//!
//! These are deployment settings of the process hosting the engine. The
//! governance parameters themselves live in the persisted
//! [`GovernanceConfig`](tfgov_types::GovernanceConfig) and change only
//! through `setconfig`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tfgov_types::{AccountName, TreasurySymbol};

use crate::authority::ThresholdRule;
use crate::outcome::TiePolicy;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Settings of a governance engine deployment.
///
/// Loaded from a TOML file via [`EngineConfig::from_toml_file`] or built with
/// [`Default`] in tests. Every field has a default, so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory of the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Account whose signing authority mirrors the board.
    #[serde(default = "default_governed_account")]
    pub governed_account: AccountName,

    /// Treasury whose holdings weight the ballots.
    #[serde(default = "default_treasury_symbol")]
    pub treasury_symbol: TreasurySymbol,

    /// Ballot names are `<prefix>.<n>`.
    #[serde(default = "default_ballot_prefix")]
    pub ballot_prefix: String,

    #[serde(default)]
    pub tie_policy: TiePolicy,

    /// Threshold of the board authority.
    #[serde(default)]
    pub threshold_rule: ThresholdRule,

    /// Upper bound on registered candidates per election.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: u32,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tfgov_data")
}

fn default_governed_account() -> AccountName {
    AccountName::parse("tf").unwrap_or_else(|_| unreachable!("literal account name is valid"))
}

fn default_treasury_symbol() -> TreasurySymbol {
    TreasurySymbol::parse("TFVT").unwrap_or_else(|_| unreachable!("literal symbol is valid"))
}

fn default_ballot_prefix() -> String {
    "tfboard".to_string()
}

fn default_max_candidates() -> u32 {
    64
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size_mb() -> usize {
    64
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            governed_account: default_governed_account(),
            treasury_symbol: default_treasury_symbol(),
            ballot_prefix: default_ballot_prefix(),
            tie_policy: TiePolicy::default(),
            threshold_rule: ThresholdRule::default(),
            max_candidates: default_max_candidates(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            map_size_mb: default_map_size_mb(),
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ballot_prefix.is_empty() {
            return Err(SettingsError::Invalid("ballot_prefix must not be empty".into()));
        }
        if self.max_candidates == 0 {
            return Err(SettingsError::Invalid("max_candidates must be positive".into()));
        }
        if self.map_size_mb == 0 {
            return Err(SettingsError::Invalid("map_size_mb must be positive".into()));
        }
        if !matches!(self.log_format.as_str(), "human" | "json") {
            return Err(SettingsError::Invalid(format!(
                "unknown log_format {:?}, expected \"human\" or \"json\"",
                self.log_format
            )));
        }
        Ok(())
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Name of the ballot for the `n`th election.
    pub fn ballot_name(&self, n: u64) -> String {
        format!("{}.{}", self.ballot_prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.governed_account.as_str(), "tf");
        assert_eq!(config.treasury_symbol.as_str(), "TFVT");
        assert_eq!(config.tie_policy, TiePolicy::ExcludeTied);
        assert_eq!(config.map_size_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = EngineConfig::from_toml_str(
            r#"
            governed_account = "tf.board"
            treasury_symbol = "VOTE"
            tie_policy = "boundary_only"
            log_format = "json"
            max_candidates = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.governed_account.as_str(), "tf.board");
        assert_eq!(config.tie_policy, TiePolicy::BoundaryOnly);
        assert_eq!(config.max_candidates, 8);
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(EngineConfig::from_toml_str(r#"governed_account = "Not Valid""#).is_err());
        assert!(EngineConfig::from_toml_str(r#"treasury_symbol = "lower""#).is_err());
        assert!(EngineConfig::from_toml_str(r#"log_format = "xml""#).is_err());
        assert!(EngineConfig::from_toml_str("max_candidates = 0").is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn ballot_names_are_numbered() {
        assert_eq!(EngineConfig::default().ballot_name(3), "tfboard.3");
    }
}
