//! Message handling - parsing, dispatching and rendering

pub mod dispatcher;
pub mod parser;
pub mod presenter;

pub use dispatcher::CommandDispatcher;
pub use parser::MessageParser;
pub use presenter::{Markup, Presenter, Reply};
