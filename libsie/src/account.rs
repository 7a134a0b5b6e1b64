use crate::amount::Decimal;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::fmt;

/// Account identifier as written in the file, e.g. `1930` or `K-100`.
///
/// Identifiers order naturally: all-digit identifiers compare by numeric
/// value and come before any identifier holding other characters, which
/// compare as plain text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four leading digits, which place a BAS account in its class
    /// (`1930` for both `1930` and `193010`).
    pub fn class_number(&self) -> Option<u32> {
        let head = self.0.get(..4)?;
        if !head.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        head.parse().ok()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId::new(s)
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric-aware identifier ordering, shared by accounts and entries.
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());

    match (numeric(a), numeric(b)) {
        (true, true) => {
            let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            ta.len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, description: impl Into<String>) -> Self {
        Account {
            id,
            kind: String::new(),
            description: description.into(),
            opening_balance: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
        }
    }

    pub fn class_number(&self) -> Option<u32> {
        self.id.class_number()
    }
}
