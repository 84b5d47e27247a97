use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Snapshot of every account, keyed by user id
pub type Accounts = BTreeMap<String, Account>;

/// Non-negative monetary amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);
    pub const ONE: Amount = Amount(Decimal::ONE);
    pub const HALF: Amount = Amount(Decimal::from_parts(5, 0, 0, false, 1));

    /// Returns `None` for negative values
    pub fn new(value: Decimal) -> Option<Self> {
        if value < Decimal::ZERO {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Add a credit, saturating at the decimal maximum
    pub fn credit(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e| e.to_string())?;
        Amount::new(value).ok_or_else(|| format!("negative amount: {}", s))
    }
}

// Persisted as a plain JSON number so existing snapshots stay readable.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;
        Amount::new(value).ok_or_else(|| D::Error::custom("amount must not be negative"))
    }
}

/// Per-user ledger record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Map key in the snapshot, not stored inside the record
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default, rename = "bonus")]
    pub bonus_claimed: bool,
    #[serde(default)]
    pub referred_by: Option<String>,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            balance: Amount::ZERO,
            bonus_claimed: false,
            referred_by: None,
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referred_by = Some(referrer.into());
        self
    }

    pub fn is_referred_by(&self, id: &str) -> bool {
        self.referred_by.as_deref() == Some(id)
    }
}

/// Number of accounts whose referrer is `id`
pub fn count_referrals(accounts: &Accounts, id: &str) -> usize {
    accounts.values().filter(|a| a.is_referred_by(id)).count()
}
