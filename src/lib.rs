//! Referral bot: membership-gated referral ledger with a Telegram front end

pub mod application;
pub mod domain;
pub mod infrastructure;
