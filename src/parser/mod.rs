//! Session parsing and schema definitions.
//!
//! This module handles:
//! - The sampler's session format and sample records
//! - Merging sessions and building their frame trees
//! - Defining the processed tree output schema

pub mod schema;
pub mod session;

// Re-export main types
pub use schema::{FrameReport, HotPath, SampleRecord, Session, TreeReport};
pub use session::{frame_reports, to_tree_report};
