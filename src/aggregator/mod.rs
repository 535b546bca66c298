//! Construction and surgery of frame trees.
//!
//! This module turns sampled stacks into a frame tree and provides the
//! primitive edits processors are built from:
//! - Tree building from ordered samples
//! - Frame deletion, sibling combination, group cleanup
//! - Hot path analysis (top self-time stacks)

pub mod frame_ops;
pub mod metrics;
pub mod tree_builder;

// Re-export main types and functions
pub use frame_ops::{combine_frames, delete_frame, remove_frame_from_groups, ReplaceWith};
pub use metrics::{calculate_hot_paths, create_hot_path};
pub use tree_builder::build_frame_tree;
