//! Callstack Studio
//!
//! Builds call trees from sampled call stacks and rewrites them into
//! readable profiles: repeated calls aggregated, library code grouped,
//! and insignificant frames folded away without losing any time.
//!
//! This crate provides the core implementation for the `callstack` CLI
//! tool, and can be used directly as a library:
//!
//! ```ignore
//! let session = read_session("session.json")?;
//! let mut tree = FrameTree::new();
//! let root = session.root_frame(&mut tree, true)?;
//! let root = Pipeline::summary(ProcessorOptions::default()).run(&mut tree, root)?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod frame;
pub mod output;
pub mod parser;
pub mod processors;
pub mod utils;

pub use frame::{FrameId, FrameTree};
pub use parser::{SampleRecord, Session};
pub use processors::Pipeline;
pub use utils::{ProcessorOptions, TreeError};
