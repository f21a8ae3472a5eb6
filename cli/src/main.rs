//! tfgov: operator tool for a board governance deployment.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use tfgov_governance::{
    required_quorum, resolve, EngineConfig, Outcome, ResolverInput, Tally, TiePolicy,
};
use tfgov_store::{
    BoardMemberRecord, BoardStore, CandidateRecord, CandidateStore, ConfigStore, NomineeRecord,
    NomineeStore,
};
use tfgov_store_lmdb::{check_integrity, LmdbEnvironment};
use tfgov_types::{AccountName, ElectionPhase, GovernanceConfig, Timestamp};
use tfgov_utils::{format_duration, init_tracing, LogFormat};

#[derive(Parser)]
#[command(name = "tfgov", about = "Board election and governance operator tool")]
struct Cli {
    /// Path to a TOML settings file. Flags and env vars override it.
    #[arg(long, env = "TFGOV_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of the LMDB environment.
    #[arg(long, env = "TFGOV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TFGOV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TFGOV_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the persisted governance state as JSON.
    Status,

    /// Run the store integrity check.
    Check,

    /// Dry-run the outcome resolver on a JSON tally.
    Resolve {
        /// JSON file with `per_option_weight`, `total_raw_weight` and
        /// optionally `total_voters`.
        #[arg(long)]
        tally: PathBuf,

        /// Seats up for election.
        #[arg(long)]
        seats: u32,

        /// Holder quorum divisor.
        #[arg(long, default_value_t = GovernanceConfig::DEFAULT_HOLDER_QUORUM_DIVISOR)]
        divisor: u32,

        /// "exclude_tied" or "boundary_only"; defaults to the settings file.
        #[arg(long)]
        tie_policy: Option<String>,
    },

    /// Print the default settings file.
    DefaultConfig,
}

#[derive(Serialize)]
struct StatusReport {
    phase: ElectionPhase,
    term_expired: Option<bool>,
    term_remaining: Option<String>,
    config: Option<GovernanceConfig>,
    board: Vec<BoardMemberRecord>,
    candidates: Vec<CandidateRecord>,
    nominees: Vec<NomineeRecord>,
}

#[derive(Serialize)]
struct ResolveReport {
    quorum: u128,
    outcome: Outcome,
}

fn load_settings(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut settings = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        settings.log_format = format.clone();
    }
    Ok(settings)
}

fn parse_tie_policy(raw: &str) -> anyhow::Result<TiePolicy> {
    match raw {
        "exclude_tied" => Ok(TiePolicy::ExcludeTied),
        "boundary_only" => Ok(TiePolicy::BoundaryOnly),
        other => bail!("unknown tie policy {other:?}, expected \"exclude_tied\" or \"boundary_only\""),
    }
}

fn open_env(settings: &EngineConfig) -> anyhow::Result<LmdbEnvironment> {
    let env = LmdbEnvironment::open(&settings.data_dir, settings.map_size_bytes())
        .with_context(|| format!("opening store at {}", settings.data_dir.display()))?;
    Ok(env)
}

fn status(env: &LmdbEnvironment, now: Timestamp) -> anyhow::Result<StatusReport> {
    let store = env.governance_store();
    let config = store.get_config()?;
    let term_expired = config.as_ref().map(|c| c.is_term_expired(now));
    let term_remaining = config
        .as_ref()
        .map(|c| format_duration(now.elapsed_since(c.term_expires_at())));
    Ok(StatusReport {
        phase: config.as_ref().map(|c| c.phase).unwrap_or_default(),
        term_expired,
        term_remaining,
        config,
        board: store.iter_members()?,
        candidates: store.iter_candidates()?,
        nominees: store.iter_nominees()?,
    })
}

/// Every option in the tally is treated as a registered candidate.
fn resolve_tally(
    tally: &Tally,
    seats: u32,
    divisor: u32,
    tie_policy: TiePolicy,
) -> ResolveReport {
    let candidates: Vec<AccountName> = tally.per_option_weight.keys().cloned().collect();
    let outcome = resolve(&ResolverInput {
        tally,
        candidates: &candidates,
        open_seats: seats,
        holder_quorum_divisor: divisor,
        tie_policy,
    });
    ResolveReport {
        quorum: required_quorum(tally.total_raw_weight, divisor),
        outcome,
    }
}

fn read_tally(path: &Path) -> anyhow::Result<Tally> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading tally {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing tally {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let format: LogFormat = settings.log_format.parse()?;
    init_tracing(format, &settings.log_level)?;

    match cli.command {
        Command::Status => {
            let env = open_env(&settings)?;
            let report = status(&env, Timestamp::now())?;
            if report.config.is_none() {
                tracing::warn!(data_dir = %settings.data_dir.display(), "governance config not set");
            }
            print_json(&report)?;
        }
        Command::Check => {
            let env = open_env(&settings)?;
            let report = check_integrity(&env)?;
            print_json(&report)?;
            if !report.is_healthy() {
                bail!("integrity check found {} problem(s)", report.errors.len());
            }
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                "store is healthy"
            );
        }
        Command::Resolve {
            tally,
            seats,
            divisor,
            tie_policy,
        } => {
            let tie_policy = match tie_policy {
                Some(raw) => parse_tie_policy(&raw)?,
                None => settings.tie_policy,
            };
            let tally = read_tally(&tally)?;
            let report = resolve_tally(&tally, seats, divisor, tie_policy);
            tracing::info!(outcome = %report.outcome.tag(), seats, "dry run resolved");
            print_json(&report)?;
        }
        Command::DefaultConfig => {
            print!("{}", EngineConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfgov_governance::OutcomeTag;

    #[test]
    fn tie_policy_names() {
        assert_eq!(parse_tie_policy("exclude_tied").unwrap(), TiePolicy::ExcludeTied);
        assert_eq!(parse_tie_policy("boundary_only").unwrap(), TiePolicy::BoundaryOnly);
        assert!(parse_tie_policy("coin_flip").is_err());
    }

    #[test]
    fn dry_run_reads_json_tally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.json");
        std::fs::write(
            &path,
            r#"{"per_option_weight": {"alice": 100, "bob": 100, "carol": 50}, "total_raw_weight": 250}"#,
        )
        .unwrap();
        let tally = read_tally(&path).unwrap();
        let report = resolve_tally(&tally, 2, 5, TiePolicy::ExcludeTied);
        assert_eq!(report.quorum, 50);
        assert_eq!(report.outcome.tag(), OutcomeTag::Tie);
        assert!(report.outcome.winners().is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "TIE");
    }

    #[test]
    fn status_of_fresh_store_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let report = status(&env, Timestamp::new(0)).unwrap();
        assert_eq!(report.phase, ElectionPhase::Idle);
        assert!(report.config.is_none());
        assert!(report.board.is_empty());
    }

    #[test]
    fn status_reports_remaining_term() {
        use tfgov_store::{GovernanceBatch, GovernanceStore};

        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let config = GovernanceConfig::genesis(AccountName::parse("publisher").unwrap());
        let mut batch = GovernanceBatch::new();
        batch.put_config(config);
        env.governance_store().apply(&batch).unwrap();

        let report = status(&env, Timestamp::new(604_800)).unwrap();
        assert_eq!(report.term_expired, Some(false));
        assert_eq!(report.term_remaining.as_deref(), Some("23w 0d"));

        let late = Timestamp::new(GovernanceConfig::DEFAULT_ELECTION_FREQUENCY + 1);
        let report = status(&env, late).unwrap();
        assert_eq!(report.term_expired, Some(true));
        assert_eq!(report.term_remaining, Some(format_duration(0)));
    }
}
