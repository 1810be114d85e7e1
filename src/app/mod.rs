//! Application runtime composition modules.

pub(crate) mod command_dispatcher;
pub(crate) mod config;
pub(crate) mod progress_manager;
pub(crate) mod terminal;
