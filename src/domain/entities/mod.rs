//! Domain entities - Core business objects with no external dependencies

pub mod account;
pub mod action;
pub mod command;
pub mod directive;
pub mod message;

pub use account::{Account, Accounts, Amount};
pub use action::{Action, ActionKind};
pub use command::{Command, CommandRegistry};
pub use directive::{BonusClaim, Directive, ForceJoinDirective, RequiredGroup, WithdrawResult};
pub use message::{Content, Message};
