//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Ledger engine, session gate, message processing
//! - Errors: Layered error taxonomy
//! - Messaging: Message parsing, dispatching, rendering

pub mod errors;
pub mod services;
pub mod messaging;
