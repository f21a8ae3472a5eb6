//! Outcome resolver: turns a closed ballot's tally into seated winners.
//!
//! Order of checks:
//! 1. No candidates, or no weight cast for any of them: [`Outcome::Count`].
//! 2. Weight cast below `total_raw_weight / holder_quorum_divisor`:
//!    [`Outcome::Fail`], nobody seated.
//! 3. Candidates with zero votes are dropped, the rest ranked by weight.
//!    Tie groups reaching into the seated ranks are handled by the
//!    [`TiePolicy`]; any exclusion turns the result into [`Outcome::Tie`].
//! 4. Otherwise [`Outcome::Pass`] with up to `open_seats` winners.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tfgov_types::AccountName;

use crate::ballot::Tally;

/// How equal tallies competing for seats are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Every tie group that reaches into the seated ranks is excluded; its
    /// ranks are consumed without seating anyone.
    #[default]
    ExcludeTied,
    /// Only a tie group straddling the last open seat is excluded. Groups that
    /// fit entirely within the open seats are seated.
    BoundaryOnly,
}

/// Result of resolving an election. The winner list may be empty in every case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Quorum met; winners listed in rank order.
    Pass { winners: Vec<AccountName> },
    /// Quorum not met.
    Fail { turnout: u128, quorum: u128 },
    /// Quorum met but some contenders were excluded by the tie policy.
    Tie {
        winners: Vec<AccountName>,
        tied: Vec<AccountName>,
    },
    /// Nothing to count: no candidates or no votes.
    Count,
}

/// Bare status of an [`Outcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeTag {
    Pass,
    Fail,
    Tie,
    Count,
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Tie => "TIE",
            Self::Count => "COUNT",
        };
        f.write_str(s)
    }
}

impl Outcome {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            Self::Pass { .. } => OutcomeTag::Pass,
            Self::Fail { .. } => OutcomeTag::Fail,
            Self::Tie { .. } => OutcomeTag::Tie,
            Self::Count => OutcomeTag::Count,
        }
    }

    /// Seated candidates in rank order.
    pub fn winners(&self) -> &[AccountName] {
        match self {
            Self::Pass { winners } | Self::Tie { winners, .. } => winners,
            Self::Fail { .. } | Self::Count => &[],
        }
    }
}

/// Everything the resolver needs from a closed election.
#[derive(Clone, Debug)]
pub struct ResolverInput<'a> {
    pub tally: &'a Tally,
    /// Registered candidates. Tally entries for anyone else are ignored.
    pub candidates: &'a [AccountName],
    pub open_seats: u32,
    pub holder_quorum_divisor: u32,
    pub tie_policy: TiePolicy,
}

/// Weight needed for quorum. A zero divisor demands the whole supply.
pub fn required_quorum(total_raw_weight: u128, holder_quorum_divisor: u32) -> u128 {
    total_raw_weight
        .checked_div(holder_quorum_divisor as u128)
        .unwrap_or(total_raw_weight)
}

pub fn resolve(input: &ResolverInput<'_>) -> Outcome {
    let mut ranked: Vec<(&AccountName, u128)> = input
        .candidates
        .iter()
        .map(|c| (c, input.tally.weight_of(c)))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(b.0));
    ranked.dedup_by(|a, b| a.0 == b.0);

    let turnout = ranked
        .iter()
        .fold(0u128, |acc, (_, w)| acc.saturating_add(*w));
    if ranked.is_empty() || turnout == 0 {
        debug!(candidates = ranked.len(), "nothing to count");
        return Outcome::Count;
    }

    let quorum = required_quorum(input.tally.total_raw_weight, input.holder_quorum_divisor);
    if turnout < quorum {
        debug!(turnout, quorum, "quorum not met");
        return Outcome::Fail { turnout, quorum };
    }

    ranked.retain(|(_, w)| *w > 0);
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let seats = input.open_seats as usize;
    let mut winners = Vec::new();
    let mut tied = Vec::new();
    let mut rank = 0usize;

    for group in ranked.chunk_by(|a, b| a.1 == b.1) {
        if rank >= seats {
            break;
        }
        let group_end = rank + group.len();
        let names = group.iter().map(|(name, _)| (*name).clone());
        let excluded = group.len() > 1
            && match input.tie_policy {
                TiePolicy::ExcludeTied => true,
                TiePolicy::BoundaryOnly => group_end > seats,
            };
        if excluded {
            tied.extend(names);
        } else {
            winners.extend(names);
        }
        rank = group_end;
    }

    if tied.is_empty() {
        Outcome::Pass { winners }
    } else {
        debug!(tied = tied.len(), seated = winners.len(), "tie excluded contenders");
        Outcome::Tie { winners, tied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> AccountName {
        AccountName::parse(raw).unwrap()
    }

    fn tally(entries: &[(&str, u128)], total_raw_weight: u128) -> Tally {
        Tally {
            per_option_weight: entries.iter().map(|(n, w)| (name(n), *w)).collect(),
            total_raw_weight,
            total_voters: entries.len() as u32,
        }
    }

    fn run(tally: &Tally, candidates: &[&str], seats: u32, divisor: u32, policy: TiePolicy) -> Outcome {
        let candidates: Vec<AccountName> = candidates.iter().map(|c| name(c)).collect();
        resolve(&ResolverInput {
            tally,
            candidates: &candidates,
            open_seats: seats,
            holder_quorum_divisor: divisor,
            tie_policy: policy,
        })
    }

    #[test]
    fn top_tie_fills_no_seat() {
        let t = tally(&[("a", 100), ("b", 100), ("c", 50)], 250);
        let outcome = run(&t, &["a", "b", "c"], 2, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome.tag(), OutcomeTag::Tie);
        assert!(outcome.winners().is_empty());
        assert_eq!(
            outcome,
            Outcome::Tie {
                winners: vec![],
                tied: vec![name("a"), name("b")],
            }
        );
    }

    #[test]
    fn lower_candidate_wins_seat_left_after_tie() {
        let t = tally(&[("a", 100), ("b", 100), ("c", 50)], 250);
        let outcome = run(&t, &["a", "b", "c"], 3, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome.tag(), OutcomeTag::Tie);
        assert_eq!(outcome.winners(), &[name("c")]);
    }

    #[test]
    fn boundary_only_seats_inner_tie() {
        let t = tally(&[("a", 100), ("b", 100), ("c", 50)], 250);
        let outcome = run(&t, &["a", "b", "c"], 2, 5, TiePolicy::BoundaryOnly);
        assert_eq!(
            outcome,
            Outcome::Pass {
                winners: vec![name("a"), name("b")]
            }
        );
    }

    #[test]
    fn boundary_only_excludes_straddling_tie() {
        let t = tally(&[("a", 100), ("b", 90), ("c", 90)], 280);
        let outcome = run(&t, &["a", "b", "c"], 2, 5, TiePolicy::BoundaryOnly);
        assert_eq!(
            outcome,
            Outcome::Tie {
                winners: vec![name("a")],
                tied: vec![name("b"), name("c")],
            }
        );
    }

    #[test]
    fn under_quorum_fails_despite_votes() {
        let t = tally(&[("a", 10)], 1000);
        let outcome = run(&t, &["a"], 3, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome, Outcome::Fail { turnout: 10, quorum: 200 });
        assert!(outcome.winners().is_empty());
    }

    #[test]
    fn empty_candidate_set_is_count() {
        let t = tally(&[], 1000);
        assert_eq!(run(&t, &[], 3, 5, TiePolicy::ExcludeTied), Outcome::Count);
    }

    #[test]
    fn no_votes_is_count() {
        let t = tally(&[], 1000);
        assert_eq!(run(&t, &["a", "b"], 3, 5, TiePolicy::ExcludeTied), Outcome::Count);
    }

    #[test]
    fn zero_vote_candidates_never_win() {
        let t = tally(&[("a", 300), ("b", 0)], 1000);
        let outcome = run(&t, &["a", "b"], 3, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome, Outcome::Pass { winners: vec![name("a")] });
    }

    #[test]
    fn seats_cap_winners_in_rank_order() {
        let t = tally(&[("a", 50), ("b", 300), ("c", 200), ("d", 100)], 1000);
        let outcome = run(&t, &["a", "b", "c", "d"], 2, 5, TiePolicy::ExcludeTied);
        assert_eq!(
            outcome,
            Outcome::Pass {
                winners: vec![name("b"), name("c")]
            }
        );
    }

    #[test]
    fn tie_below_cutoff_does_not_matter() {
        let t = tally(&[("a", 300), ("b", 50), ("c", 50)], 400);
        let outcome = run(&t, &["a", "b", "c"], 1, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome, Outcome::Pass { winners: vec![name("a")] });
    }

    #[test]
    fn votes_for_non_candidates_are_ignored() {
        let t = tally(&[("a", 30), ("gone", 500)], 1000);
        let outcome = run(&t, &["a"], 1, 5, TiePolicy::ExcludeTied);
        assert_eq!(outcome, Outcome::Fail { turnout: 30, quorum: 200 });
    }

    #[test]
    fn turnout_saturates_instead_of_wrapping() {
        let t = tally(&[("a", u128::MAX / 2 + 2), ("b", u128::MAX / 2 + 1)], u128::MAX);
        let outcome = run(&t, &["a", "b"], 1, 1, TiePolicy::ExcludeTied);
        assert_eq!(outcome, Outcome::Pass { winners: vec![name("a")] });
    }

    #[test]
    fn quorum_is_floor_of_weight_over_divisor() {
        assert_eq!(required_quorum(1000, 5), 200);
        assert_eq!(required_quorum(1000, 2), 500);
        assert_eq!(required_quorum(999, 5), 199);
        assert_eq!(required_quorum(1000, 0), 1000);
    }
}
