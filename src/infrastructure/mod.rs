//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Snapshot persistence
//! - Adapters: Platform integrations (Telegram, console)
//! - Health: Liveness endpoint

pub mod adapters;
pub mod config;
pub mod health;
pub mod storage;
