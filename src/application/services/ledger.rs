//! Ledger engine - account creation, referral credit, bonus and withdrawal rules
//!
//! Every mutation runs under one lock and is copy-on-write: the next snapshot
//! is persisted first and only then becomes the in-memory state, so a failed
//! save never leaves memory and disk disagreeing.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::{LedgerError, StorageError};
use crate::domain::entities::account::count_referrals;
use crate::domain::entities::{Account, Accounts, Amount, BonusClaim, WithdrawResult};
use crate::domain::traits::Store;

/// Amounts and thresholds applied by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPolicy {
    pub referral_credit: Amount,
    pub bonus_amount: Amount,
    pub withdraw_threshold: usize,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            referral_credit: Amount::ONE,
            bonus_amount: Amount::HALF,
            withdraw_threshold: 20,
        }
    }
}

pub struct Ledger {
    store: Arc<dyn Store>,
    policy: LedgerPolicy,
    accounts: Mutex<Accounts>,
}

impl Ledger {
    /// Load the persisted snapshot. A corrupt snapshot is returned as an error, never dropped.
    pub async fn open(store: Arc<dyn Store>, policy: LedgerPolicy) -> Result<Self, StorageError> {
        let accounts = store.load().await?;
        tracing::info!("Ledger loaded with {} accounts", accounts.len());
        Ok(Self {
            store,
            policy,
            accounts: Mutex::new(accounts),
        })
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Return the account for `id`, creating it on first contact.
    ///
    /// `referrer` is only honoured when the account is new, the referrer differs
    /// from `id` and already exists. The referrer's credit and the new account
    /// are persisted in the same snapshot.
    pub async fn ensure_account(&self, id: &str, referrer: Option<&str>) -> Result<Account, LedgerError> {
        let mut accounts = self.accounts.lock().await;
        if let Some(existing) = accounts.get(id) {
            return Ok(existing.clone());
        }

        let mut next = accounts.clone();
        let mut account = Account::new(id);

        match referrer.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) if r == id => {
                tracing::warn!("Ignoring self-referral for {}", id);
            }
            Some(r) => match next.get_mut(r) {
                Some(referrer_account) => {
                    referrer_account.balance = referrer_account.balance.credit(self.policy.referral_credit);
                    account.referred_by = Some(r.to_string());
                }
                None => {
                    tracing::warn!("Ignoring unknown referrer {} for {}", r, id);
                }
            },
            None => {}
        }

        next.insert(id.to_string(), account.clone());
        self.commit(&mut accounts, next).await?;

        match &account.referred_by {
            Some(r) => tracing::info!("Account {} created, referred by {}", id, r),
            None => tracing::info!("Account {} created", id),
        }
        Ok(account)
    }

    pub async fn get_balance(&self, id: &str) -> Result<Amount, LedgerError> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(id)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::UnknownAccount(id.to_string()))
    }

    /// Linear scan over all accounts
    pub async fn count_referrals(&self, id: &str) -> usize {
        let accounts = self.accounts.lock().await;
        count_referrals(&accounts, id)
    }

    /// Grant the one-time bonus. A second claim returns `granted: false` and changes nothing.
    pub async fn claim_bonus(&self, id: &str) -> Result<BonusClaim, LedgerError> {
        let mut accounts = self.accounts.lock().await;
        let current = accounts
            .get(id)
            .ok_or_else(|| LedgerError::UnknownAccount(id.to_string()))?;

        if current.bonus_claimed {
            return Ok(BonusClaim {
                granted: false,
                credited: Amount::ZERO,
                new_balance: current.balance,
            });
        }

        let mut next = accounts.clone();
        let new_balance = match next.get_mut(id) {
            Some(account) => {
                account.bonus_claimed = true;
                account.balance = account.balance.credit(self.policy.bonus_amount);
                account.balance
            }
            None => return Err(LedgerError::UnknownAccount(id.to_string())),
        };
        self.commit(&mut accounts, next).await?;

        tracing::info!("Bonus granted to {}, balance now {}", id, new_balance);
        Ok(BonusClaim {
            granted: true,
            credited: self.policy.bonus_amount,
            new_balance,
        })
    }

    /// Withdrawal gate. Nothing is paid out here; the result only reports eligibility.
    pub async fn withdraw(&self, id: &str) -> Result<WithdrawResult, LedgerError> {
        let accounts = self.accounts.lock().await;
        if !accounts.contains_key(id) {
            return Err(LedgerError::UnknownAccount(id.to_string()));
        }

        let referrals = count_referrals(&accounts, id);
        if self.unlocks_withdrawal(referrals) {
            Ok(WithdrawResult::Eligible { referrals })
        } else {
            Ok(WithdrawResult::ThresholdNotMet {
                referrals,
                required: self.policy.withdraw_threshold,
            })
        }
    }

    pub async fn withdrawal_unlocked(&self, id: &str) -> bool {
        let referrals = self.count_referrals(id).await;
        self.unlocks_withdrawal(referrals)
    }

    fn unlocks_withdrawal(&self, referrals: usize) -> bool {
        referrals >= self.policy.withdraw_threshold
    }

    pub async fn account(&self, id: &str) -> Option<Account> {
        self.accounts.lock().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.accounts.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    async fn commit(&self, current: &mut Accounts, next: Accounts) -> Result<(), LedgerError> {
        if let Err(e) = self.store.save(&next).await {
            tracing::error!("Failed to persist ledger snapshot: {}", e);
            return Err(LedgerError::Persistence(e));
        }
        *current = next;
        Ok(())
    }
}
