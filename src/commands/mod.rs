//! CLI command handlers.

mod extract;
mod info;
mod inv;
mod reorder;
mod sync;

pub(crate) use extract::run_extract_command;
pub(crate) use info::run_info_command;
pub(crate) use inv::run_inv_command;
pub(crate) use reorder::run_reorder_command;
pub(crate) use sync::run_sync_command;
