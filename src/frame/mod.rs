//! The frame tree: nodes, identifiers and frame groups.
//!
//! This module owns the data model every other stage works on:
//! - `FrameTree` arena with cached total times
//! - `FrameIdentifier` / `FrameKind` decoded from sampler strings
//! - `FrameGroup` annotations for collapsed library code

pub mod group;
pub mod identifier;
pub mod tree;

// Re-export main types
pub use group::{FrameGroup, GroupId};
pub use identifier::{parse_frame_info, to_frame_info, FrameIdentifier, FrameKind};
pub use tree::{FrameContext, FrameId, FrameTree};
