use std::fmt;

/// Logical command, independent of the user who issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    ConfirmJoin,
    Balance,
    ReferralLink,
    Bonus,
    Withdraw,
    Settings,
    Support,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Start => "start",
            ActionKind::ConfirmJoin => "confirm_join",
            ActionKind::Balance => "balance",
            ActionKind::ReferralLink => "refer",
            ActionKind::Bonus => "bonus",
            ActionKind::Withdraw => "withdraw",
            ActionKind::Settings => "settings",
            ActionKind::Support => "support",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound user action handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start { user_id: String, referrer: Option<String> },
    ConfirmJoin { user_id: String },
    GetBalance { user_id: String },
    GetReferralLink { user_id: String },
    ClaimBonus { user_id: String },
    RequestWithdraw { user_id: String },
    Settings { user_id: String },
    Support { user_id: String },
}

impl Action {
    /// Build an action from its kind. `payload` is only meaningful for `Start`.
    pub fn new(kind: ActionKind, user_id: impl Into<String>, payload: Option<String>) -> Self {
        let user_id = user_id.into();
        match kind {
            ActionKind::Start => Action::Start { user_id, referrer: payload },
            ActionKind::ConfirmJoin => Action::ConfirmJoin { user_id },
            ActionKind::Balance => Action::GetBalance { user_id },
            ActionKind::ReferralLink => Action::GetReferralLink { user_id },
            ActionKind::Bonus => Action::ClaimBonus { user_id },
            ActionKind::Withdraw => Action::RequestWithdraw { user_id },
            ActionKind::Settings => Action::Settings { user_id },
            ActionKind::Support => Action::Support { user_id },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Start { .. } => ActionKind::Start,
            Action::ConfirmJoin { .. } => ActionKind::ConfirmJoin,
            Action::GetBalance { .. } => ActionKind::Balance,
            Action::GetReferralLink { .. } => ActionKind::ReferralLink,
            Action::ClaimBonus { .. } => ActionKind::Bonus,
            Action::RequestWithdraw { .. } => ActionKind::Withdraw,
            Action::Settings { .. } => ActionKind::Settings,
            Action::Support { .. } => ActionKind::Support,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Action::Start { user_id, .. }
            | Action::ConfirmJoin { user_id }
            | Action::GetBalance { user_id }
            | Action::GetReferralLink { user_id }
            | Action::ClaimBonus { user_id }
            | Action::RequestWithdraw { user_id }
            | Action::Settings { user_id }
            | Action::Support { user_id } => user_id,
        }
    }
}
