//! CLI layer - argument parsing, command routing and output

pub mod command_handlers;
pub mod dispatcher;
pub mod main_types;
pub mod output;
