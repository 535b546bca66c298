//! Output writers for sessions and processed trees.
//!
//! This module handles reading and writing data on disk:
//! - JSON sessions (sampler output, combined sessions)
//! - JSON tree reports

pub mod json;

// Re-export main functions
pub use json::{read_session, read_tree_report, write_session, write_tree_report};
