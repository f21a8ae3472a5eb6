//! Parameters accepted by `setconfig`.
//!
//! Everything in [`GovernanceConfig`] that is not election bookkeeping can be
//! changed here, between elections, by the publisher.

use serde::{Deserialize, Serialize};

use tfgov_types::GovernanceConfig;

use crate::error::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub max_board_seats: u32,
    pub holder_quorum_divisor: u32,
    pub board_quorum_divisor: u32,
    pub issue_duration: u64,
    pub start_delay: u64,
    pub leaderboard_duration: u64,
    pub election_frequency: u64,
}

impl Default for ConfigUpdate {
    fn default() -> Self {
        Self {
            max_board_seats: GovernanceConfig::DEFAULT_MAX_BOARD_SEATS,
            holder_quorum_divisor: GovernanceConfig::DEFAULT_HOLDER_QUORUM_DIVISOR,
            board_quorum_divisor: GovernanceConfig::DEFAULT_BOARD_QUORUM_DIVISOR,
            issue_duration: GovernanceConfig::DEFAULT_ISSUE_DURATION,
            start_delay: GovernanceConfig::DEFAULT_START_DELAY,
            leaderboard_duration: GovernanceConfig::DEFAULT_LEADERBOARD_DURATION,
            election_frequency: GovernanceConfig::DEFAULT_ELECTION_FREQUENCY,
        }
    }
}

impl ConfigUpdate {
    /// Check the update against itself and the seated board.
    pub fn validate(&self, board_size: u32) -> Result<(), GovernanceError> {
        let invalid = |msg: &str| Err(GovernanceError::InvalidConfig(msg.to_string()));
        if self.max_board_seats == 0 {
            return invalid("max_board_seats must be positive");
        }
        if self.max_board_seats < board_size {
            return Err(GovernanceError::InvalidConfig(format!(
                "max_board_seats {} is below the {} seated members",
                self.max_board_seats, board_size
            )));
        }
        if self.holder_quorum_divisor == 0 {
            return invalid("holder_quorum_divisor must be positive");
        }
        if self.board_quorum_divisor == 0 {
            return invalid("board_quorum_divisor must be positive");
        }
        if self.issue_duration == 0 {
            return invalid("issue_duration must be positive");
        }
        if self.election_frequency == 0 {
            return invalid("election_frequency must be positive");
        }
        Ok(())
    }

    /// Write the update into `config` and recompute the vacancy count.
    pub fn apply_to(&self, config: &mut GovernanceConfig, board_size: u32) {
        config.max_board_seats = self.max_board_seats;
        config.holder_quorum_divisor = self.holder_quorum_divisor;
        config.board_quorum_divisor = self.board_quorum_divisor;
        config.issue_duration = self.issue_duration;
        config.start_delay = self.start_delay;
        config.leaderboard_duration = self.leaderboard_duration;
        config.election_frequency = self.election_frequency;
        config.open_seats = self.max_board_seats.saturating_sub(board_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfgov_types::AccountName;

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigUpdate::default().validate(0).is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let cases: [fn(&mut ConfigUpdate); 5] = [
            |u| u.max_board_seats = 0,
            |u| u.holder_quorum_divisor = 0,
            |u| u.board_quorum_divisor = 0,
            |u| u.issue_duration = 0,
            |u| u.election_frequency = 0,
        ];
        for mutate in cases {
            let mut update = ConfigUpdate::default();
            mutate(&mut update);
            assert!(matches!(
                update.validate(0),
                Err(GovernanceError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn cannot_shrink_below_seated_board() {
        let update = ConfigUpdate {
            max_board_seats: 3,
            ..ConfigUpdate::default()
        };
        assert!(update.validate(3).is_ok());
        assert!(update.validate(4).is_err());
    }

    #[test]
    fn apply_recomputes_open_seats() {
        let mut config = GovernanceConfig::genesis(AccountName::parse("tf").unwrap());
        let update = ConfigUpdate {
            max_board_seats: 9,
            ..ConfigUpdate::default()
        };
        update.apply_to(&mut config, 4);
        assert_eq!(config.max_board_seats, 9);
        assert_eq!(config.open_seats, 5);
        assert!(config.is_consistent());
    }
}
