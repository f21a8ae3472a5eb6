//! Account names identifying nominees, candidates, board members and publishers.

use crate::error::TfGovError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A host account name.
///
/// Names are 1 to 12 characters drawn from `a-z`, `1-5` and `.`, and may not
/// end with a dot. Ordering is lexicographic, which is the order signer lists
/// are pushed to the host in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    /// Maximum length of an account name.
    pub const MAX_LEN: usize = 12;

    /// Parse and validate an account name.
    pub fn parse(raw: &str) -> Result<Self, TfGovError> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TfGovError::InvalidAccountName(raw.to_string()))
        }
    }

    /// Whether `raw` is a well-formed account name.
    pub fn is_valid(raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && !raw.ends_with('.')
            && raw
                .bytes()
                .all(|b| matches!(b, b'a'..=b'z' | b'1'..=b'5' | b'.'))
    }

    /// Return the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key bytes used by the storage backends.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountName {
    type Err = TfGovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = TfGovError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(TfGovError::InvalidAccountName(s))
        }
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for raw in ["tf", "alice", "bob.tf", "board1234512", "a.b.c"] {
            assert!(AccountName::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for raw in ["", "Alice", "toolongname123", "bad6", "trailing.", "with space"] {
            assert_eq!(
                AccountName::parse(raw),
                Err(TfGovError::InvalidAccountName(raw.to_string()))
            );
        }
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = AccountName::parse("alice").unwrap();
        let b = AccountName::parse("bob").unwrap();
        assert!(a < b);
    }
}
