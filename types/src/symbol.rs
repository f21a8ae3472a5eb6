//! Symbol of the token-weighted treasury that ballots are scoped to.

use crate::error::TfGovError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A treasury symbol code such as `TFVT`: 1 to 7 uppercase ASCII letters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreasurySymbol(String);

impl TreasurySymbol {
    pub const MAX_LEN: usize = 7;

    pub fn parse(raw: &str) -> Result<Self, TfGovError> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw.bytes().all(|b| b.is_ascii_uppercase());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(TfGovError::InvalidSymbol(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreasurySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TreasurySymbol {
    type Err = TfGovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TreasurySymbol {
    type Error = TfGovError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TreasurySymbol> for String {
    fn from(symbol: TreasurySymbol) -> Self {
        symbol.0
    }
}
