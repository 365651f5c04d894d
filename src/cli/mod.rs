mod args;
pub mod backend;
pub mod commands;
pub mod core;
mod format;
pub mod help;
pub mod io;
pub mod output;
pub mod registry;
mod shell;
pub mod shell_context;
pub mod table;

pub use shell::run_cli;
