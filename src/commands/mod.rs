//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod combine;
pub mod models;
pub mod process;
pub mod utils;

// Re-export main command functions
pub use combine::execute_combine;
pub use models::{CombineArgs, ProcessArgs};
pub use process::{execute_process, validate_args};
pub use utils::{display_version, validate_session_file};
