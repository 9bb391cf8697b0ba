//! Command-line interface.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CreateCommands, ListCommands, SetupArgs};
pub use commands::CommandDispatcher;
