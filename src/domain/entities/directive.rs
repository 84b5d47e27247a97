use serde::{Deserialize, Serialize};

use super::Amount;

/// A group the user must belong to before using the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredGroup {
    pub name: String,
    /// Public handle, e.g. `@my_channel`
    pub username: String,
}

impl RequiredGroup {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
        }
    }

    /// Handle without the leading `@`, as used in t.me links
    pub fn handle(&self) -> &str {
        self.username.trim_start_matches('@')
    }
}

/// Returned instead of an action result while membership is unsatisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceJoinDirective {
    pub groups: Vec<RequiredGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusClaim {
    pub granted: bool,
    /// Zero when the bonus had already been claimed
    pub credited: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawResult {
    ThresholdNotMet { referrals: usize, required: usize },
    /// Threshold reached; fulfilment happens outside the bot
    Eligible { referrals: usize },
}

/// Structured outcome of a dispatched action, rendered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Welcome { verified: bool },
    ForceJoin(ForceJoinDirective),
    NotStarted,
    Balance { balance: Amount, referrals: usize, required: usize },
    ReferralLink { payload: String, referrals: usize, required: usize },
    Bonus(BonusClaim),
    Withdraw(WithdrawResult),
    Settings,
    Support { contact: String },
}
