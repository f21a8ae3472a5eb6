//! Authority builder: turns a board roster into a weighted multi-signature
//! authority descriptor.
//!
//! Every signer carries weight 1 on its `active` permission. Signers are
//! listed in account-name order with duplicates collapsed, which is the
//! canonical form the host accepts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tfgov_types::AccountName;

/// Permission of each signer that satisfies the authority.
pub const ACTIVE_PERMISSION: &str = "active";

/// One signer entry of an authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    pub actor: AccountName,
    pub permission: String,
    pub weight: u16,
}

/// A weighted multi-signature authority: satisfied once the weights of the
/// co-signing actors reach `threshold`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub threshold: u32,
    pub accounts: Vec<PermissionLevelWeight>,
}

impl Authority {
    /// The actors listed in this authority, in order.
    pub fn signers(&self) -> Vec<&AccountName> {
        self.accounts.iter().map(|a| &a.actor).collect()
    }

    /// Total weight available if every listed actor signs.
    pub fn total_weight(&self) -> u32 {
        self.accounts.iter().map(|a| a.weight as u32).sum()
    }

    /// Whether the listed actors can reach the threshold at all.
    pub fn is_satisfiable(&self) -> bool {
        self.threshold > 0 && self.total_weight() >= self.threshold
    }

    /// Whether the given set of co-signers satisfies the authority.
    pub fn is_satisfied_by(&self, signers: &[AccountName]) -> bool {
        let weight: u32 = self
            .accounts
            .iter()
            .filter(|a| signers.contains(&a.actor))
            .map(|a| a.weight as u32)
            .sum();
        weight >= self.threshold
    }
}

/// How many of `n` equal-weight signers must co-sign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdRule {
    /// More than half of the listed signers.
    #[default]
    SimpleMajority,
    /// Every listed signer.
    Unanimous,
    /// A fixed count, clamped to the number of signers.
    AtLeast(u32),
}

impl ThresholdRule {
    pub fn threshold_for(&self, signers: usize) -> u32 {
        let n = signers as u32;
        match self {
            Self::SimpleMajority => n / 2 + 1,
            Self::Unanimous => n.max(1),
            Self::AtLeast(k) => (*k).clamp(1, n.max(1)),
        }
    }
}

/// Builds authorities for a board roster.
#[derive(Clone, Debug)]
pub struct AuthorityBuilder {
    rule: ThresholdRule,
    fallback: AccountName,
}

impl AuthorityBuilder {
    /// `fallback` becomes the sole signer whenever the roster is empty, so the
    /// governed account always keeps a satisfiable authority.
    pub fn new(rule: ThresholdRule, fallback: AccountName) -> Self {
        Self { rule, fallback }
    }

    pub fn build<'a, I>(&self, members: I) -> Authority
    where
        I: IntoIterator<Item = &'a AccountName>,
    {
        let roster: BTreeSet<&AccountName> = members.into_iter().collect();
        if roster.is_empty() {
            return Authority {
                threshold: 1,
                accounts: vec![signer(&self.fallback)],
            };
        }
        Authority {
            threshold: self.rule.threshold_for(roster.len()),
            accounts: roster.into_iter().map(signer).collect(),
        }
    }
}

fn signer(actor: &AccountName) -> PermissionLevelWeight {
    PermissionLevelWeight {
        actor: actor.clone(),
        permission: ACTIVE_PERMISSION.to_string(),
        weight: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<AccountName> {
        raw.iter().map(|r| AccountName::parse(r).unwrap()).collect()
    }

    fn builder() -> AuthorityBuilder {
        AuthorityBuilder::new(ThresholdRule::SimpleMajority, AccountName::parse("tf").unwrap())
    }

    #[test]
    fn majority_of_seated_members() {
        for (n, expected) in [(1, 1), (2, 2), (3, 2), (4, 3), (5, 3), (12, 7)] {
            assert_eq!(ThresholdRule::SimpleMajority.threshold_for(n), expected, "n = {n}");
        }
    }

    #[test]
    fn signers_are_sorted_and_deduplicated() {
        let members = names(&["carol", "alice", "bob", "alice"]);
        let authority = builder().build(&members);
        let signers: Vec<&str> = authority.signers().iter().map(|a| a.as_str()).collect();
        assert_eq!(signers, vec!["alice", "bob", "carol"]);
        assert_eq!(authority.threshold, 2);
        assert!(authority.accounts.iter().all(|a| a.weight == 1));
        assert!(authority.accounts.iter().all(|a| a.permission == ACTIVE_PERMISSION));
    }

    #[test]
    fn empty_roster_falls_back() {
        let authority = builder().build(&Vec::new());
        assert_eq!(authority.threshold, 1);
        assert_eq!(authority.signers(), vec![&AccountName::parse("tf").unwrap()]);
        assert!(authority.is_satisfiable());
    }

    #[test]
    fn satisfaction_requires_majority() {
        let members = names(&["alice", "bob", "carol"]);
        let authority = builder().build(&members);
        assert!(!authority.is_satisfied_by(&names(&["alice"])));
        assert!(authority.is_satisfied_by(&names(&["alice", "carol"])));
        assert!(!authority.is_satisfied_by(&names(&["mallory", "alice"])));
    }

    #[test]
    fn fixed_threshold_is_clamped() {
        assert_eq!(ThresholdRule::AtLeast(10).threshold_for(3), 3);
        assert_eq!(ThresholdRule::AtLeast(0).threshold_for(3), 1);
        assert_eq!(ThresholdRule::Unanimous.threshold_for(4), 4);
    }
}
