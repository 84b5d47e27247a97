//! Domain layer - Core business objects with no external dependencies
//!
//! This layer contains:
//! - Entities: Accounts, actions, directives, inbound messages
//! - Traits: Abstractions for infrastructure (Store, MembershipOracle, Bot)

pub mod entities;
pub mod traits;
