//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod membership;
pub mod store;

pub use bot::{Bot, BotInfo, KeyboardButton};
pub use membership::MembershipOracle;
pub use store::Store;
