use std::collections::BTreeSet;

use proptest::prelude::*;

use tfgov_governance::{
    resolve, AuthorityBuilder, Board, Outcome, OutcomeTag, ResolverInput, Tally, ThresholdRule,
    TiePolicy,
};
use tfgov_types::AccountName;

fn account(i: usize) -> AccountName {
    let name = format!("cand{}{}", i % 5 + 1, "a".repeat(i / 5 % 8));
    AccountName::parse(&name).unwrap()
}

fn policy() -> impl Strategy<Value = TiePolicy> {
    prop_oneof![Just(TiePolicy::ExcludeTied), Just(TiePolicy::BoundaryOnly)]
}

fn ballot() -> impl Strategy<Value = (Vec<AccountName>, Tally)> {
    prop::collection::vec(0u128..50, 0..12)
        .prop_flat_map(|weights| {
            let candidates: Vec<AccountName> = (0..weights.len()).map(account).collect();
            let cast: u128 = weights.iter().sum();
            (Just(candidates), Just(weights), cast..cast * 4 + 1)
        })
        .prop_map(|(candidates, weights, total_raw_weight)| {
            let tally = Tally {
                per_option_weight: candidates.iter().cloned().zip(weights).collect(),
                total_raw_weight,
                total_voters: 0,
            };
            (candidates, tally)
        })
}

proptest! {
    /// Never more winners than open seats, and every winner is a distinct
    /// candidate with positive weight.
    #[test]
    fn winners_are_bounded_and_valid(
        (candidates, tally) in ballot(),
        seats in 0u32..6,
        divisor in 1u32..10,
        tie_policy in policy(),
    ) {
        let outcome = resolve(&ResolverInput {
            tally: &tally,
            candidates: &candidates,
            open_seats: seats,
            holder_quorum_divisor: divisor,
            tie_policy,
        });
        let winners = outcome.winners();
        prop_assert!(winners.len() <= seats as usize);
        let distinct: BTreeSet<_> = winners.iter().collect();
        prop_assert_eq!(distinct.len(), winners.len());
        for w in winners {
            prop_assert!(candidates.contains(w));
            prop_assert!(tally.weight_of(w) > 0);
        }
    }

    /// Winners never have fewer votes than a non-winning, non-tied candidate.
    #[test]
    fn winners_outrank_plain_losers(
        (candidates, tally) in ballot(),
        seats in 1u32..6,
        tie_policy in policy(),
    ) {
        let outcome = resolve(&ResolverInput {
            tally: &tally,
            candidates: &candidates,
            open_seats: seats,
            holder_quorum_divisor: 1_000,
            tie_policy,
        });
        let tied: Vec<AccountName> = match &outcome {
            Outcome::Tie { tied, .. } => tied.clone(),
            _ => Vec::new(),
        };
        let winners = outcome.winners();
        let min_winner = winners.iter().map(|w| tally.weight_of(w)).min();
        if let Some(min_winner) = min_winner {
            for c in &candidates {
                if !winners.contains(c) && !tied.contains(c) {
                    prop_assert!(tally.weight_of(c) <= min_winner);
                }
            }
        }
    }

    /// FAIL exactly when something was cast but less than the quorum.
    #[test]
    fn fail_tracks_quorum(
        (candidates, tally) in ballot(),
        divisor in 1u32..10,
    ) {
        let outcome = resolve(&ResolverInput {
            tally: &tally,
            candidates: &candidates,
            open_seats: 3,
            holder_quorum_divisor: divisor,
            tie_policy: TiePolicy::default(),
        });
        let cast: u128 = candidates.iter().map(|c| tally.weight_of(c)).sum();
        let quorum = tally.total_raw_weight / divisor as u128;
        let expect_fail = cast > 0 && cast < quorum;
        prop_assert_eq!(outcome.tag() == OutcomeTag::Fail, expect_fail);
        if cast == 0 {
            prop_assert_eq!(outcome.tag(), OutcomeTag::Count);
        }
    }

    /// Seating and unseating in any order never exceeds capacity, and the
    /// built authority always lists exactly the board.
    #[test]
    fn membership_stays_within_capacity(
        max_seats in 1u32..6,
        ops in prop::collection::vec((any::<bool>(), 0usize..10), 0..40),
    ) {
        let builder = AuthorityBuilder::new(
            ThresholdRule::SimpleMajority,
            AccountName::parse("tf").unwrap(),
        );
        let mut board = Board::new(max_seats);
        for (add, i) in ops {
            let who = account(i);
            let _ = if add { board.add_to_tfboard(&who) } else { board.rmv_from_tfboard(&who) };
            prop_assert!(board.len() <= max_seats);

            let authority = builder.build(board.members());
            if board.is_empty() {
                prop_assert_eq!(authority.threshold, 1);
            } else {
                let members: Vec<&AccountName> = board.members().collect();
                prop_assert_eq!(authority.signers(), members);
                prop_assert_eq!(authority.threshold, board.len() / 2 + 1);
                prop_assert!(authority.is_satisfiable());
            }
        }
    }
}
