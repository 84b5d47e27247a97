//! Command dispatcher - Routes actions through the session gate to the ledger

use std::future::{self, Future};
use std::sync::Arc;

use crate::application::errors::LedgerError;
use crate::application::services::gate::{GateState, Gated, SessionGate};
use crate::application::services::ledger::Ledger;
use crate::domain::entities::{Action, Directive};

/// Dispatch result. Errors are persistence failures only; everything the user
/// can cause is a `Directive`.
pub type DispatchResult = Result<Directive, LedgerError>;

pub struct CommandDispatcher {
    ledger: Arc<Ledger>,
    gate: SessionGate,
    support_contact: String,
}

impl CommandDispatcher {
    pub fn new(ledger: Arc<Ledger>, gate: SessionGate, support_contact: impl Into<String>) -> Self {
        Self {
            ledger,
            gate,
            support_contact: support_contact.into(),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub async fn dispatch(&self, action: Action) -> DispatchResult {
        tracing::debug!("Dispatching {} for {}", action.kind(), action.user_id());

        match &action {
            // Accounts are created before the membership check so a referral
            // is recorded even if the new user has not joined yet.
            Action::Start { user_id, referrer } => {
                self.ledger.ensure_account(user_id, referrer.as_deref()).await?;
                Ok(self.welcome(user_id, false).await)
            }
            Action::ConfirmJoin { user_id } => {
                self.ledger.ensure_account(user_id, None).await?;
                Ok(self.welcome(user_id, true).await)
            }
            Action::GetBalance { user_id } => self.gated(user_id, || self.balance(user_id)).await,
            Action::GetReferralLink { user_id } => self.gated(user_id, || self.referral_link(user_id)).await,
            Action::ClaimBonus { user_id } => {
                self.gated(user_id, || async move { self.ledger.claim_bonus(user_id).await.map(Directive::Bonus) })
                    .await
            }
            Action::RequestWithdraw { user_id } => {
                self.gated(user_id, || async move { self.ledger.withdraw(user_id).await.map(Directive::Withdraw) })
                    .await
            }
            Action::Settings { user_id } => {
                self.gated(user_id, || future::ready(DispatchResult::Ok(Directive::Settings))).await
            }
            Action::Support { user_id } => {
                let contact = self.support_contact.clone();
                self.gated(user_id, || future::ready(DispatchResult::Ok(Directive::Support { contact })))
                    .await
            }
        }
    }

    async fn welcome(&self, user_id: &str, verified: bool) -> Directive {
        match self.gate.evaluate(user_id).await {
            GateState::Allowed => Directive::Welcome { verified },
            GateState::Blocked => Directive::ForceJoin(self.gate.force_join()),
        }
    }

    /// Menu actions need a started account and a passing gate before `op` runs
    async fn gated<F, Fut>(&self, user_id: &str, op: F) -> DispatchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DispatchResult>,
    {
        if !self.ledger.contains(user_id).await {
            return Ok(Directive::NotStarted);
        }

        match self.gate.guard(user_id, op).await? {
            Gated::Allowed(directive) => Ok(directive),
            Gated::ForceJoin(force_join) => Ok(Directive::ForceJoin(force_join)),
        }
    }

    async fn balance(&self, user_id: &str) -> DispatchResult {
        let balance = self.ledger.get_balance(user_id).await?;
        let referrals = self.ledger.count_referrals(user_id).await;
        Ok(Directive::Balance {
            balance,
            referrals,
            required: self.ledger.policy().withdraw_threshold,
        })
    }

    async fn referral_link(&self, user_id: &str) -> DispatchResult {
        let referrals = self.ledger.count_referrals(user_id).await;
        Ok(Directive::ReferralLink {
            payload: user_id.to_string(),
            referrals,
            required: self.ledger.policy().withdraw_threshold,
        })
    }
}
