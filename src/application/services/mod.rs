//! Application services - Business logic orchestration

pub mod gate;
pub mod ledger;
pub mod message_service;

pub use gate::{GateState, Gated, SessionGate};
pub use ledger::{Ledger, LedgerPolicy};
pub use message_service::MessageService;
