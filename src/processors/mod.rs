//! Tree processors and the pipelines that chain them.
//!
//! Every processor has the same shape: it takes the arena, an optional
//! root and the shared options, rewrites the tree in place and returns the
//! (possibly new) root. `None` in means `None` out.

pub mod aggregate;
pub mod filters;
pub mod grouping;
pub mod stem;

pub use aggregate::{aggregate_repeated_calls, merge_consecutive_self_time};
pub use filters::{
    remove_hidden, remove_importlib, remove_irrelevant_nodes, remove_irrelevant_nodes_with_total,
    remove_unnecessary_self_time_nodes,
};
pub use grouping::{group_library_frames, HidePolicy};
pub use stem::trim_stem;

use crate::frame::{FrameId, FrameTree};
use crate::utils::config::ProcessorOptions;
use crate::utils::error::TreeError;
use log::debug;
use std::fmt;

/// A tree rewrite stage
pub type Processor =
    fn(&mut FrameTree, Option<FrameId>, &ProcessorOptions) -> Result<Option<FrameId>, TreeError>;

pub const REMOVE_IMPORTLIB: &str = "remove_importlib";
pub const REMOVE_HIDDEN: &str = "remove_hidden";
pub const MERGE_CONSECUTIVE_SELF_TIME: &str = "merge_consecutive_self_time";
pub const AGGREGATE_REPEATED_CALLS: &str = "aggregate_repeated_calls";
pub const GROUP_LIBRARY_FRAMES: &str = "group_library_frames";
pub const REMOVE_UNNECESSARY_SELF_TIME_NODES: &str = "remove_unnecessary_self_time_nodes";
pub const REMOVE_IRRELEVANT_NODES: &str = "remove_irrelevant_nodes";

/// Look up a processor by its stage name
pub fn processor_by_name(name: &str) -> Option<Processor> {
    let processor: Processor = match name {
        REMOVE_IMPORTLIB => remove_importlib,
        REMOVE_HIDDEN => remove_hidden,
        MERGE_CONSECUTIVE_SELF_TIME => merge_consecutive_self_time,
        AGGREGATE_REPEATED_CALLS => aggregate_repeated_calls,
        GROUP_LIBRARY_FRAMES => group_library_frames,
        REMOVE_UNNECESSARY_SELF_TIME_NODES => remove_unnecessary_self_time_nodes,
        REMOVE_IRRELEVANT_NODES => remove_irrelevant_nodes,
        _ => return None,
    };
    Some(processor)
}

/// An ordered list of named processors plus the options they share
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<(&'static str, Processor)>,
    options: ProcessorOptions,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("options", &self.options)
            .finish()
    }
}

impl Pipeline {
    /// An empty pipeline
    pub fn new(options: ProcessorOptions) -> Self {
        Self {
            stages: Vec::new(),
            options,
        }
    }

    /// The default summary view: a call tree with library code grouped and
    /// insignificant frames removed
    pub fn summary(options: ProcessorOptions) -> Self {
        Self::from_names(
            options,
            &[
                REMOVE_IMPORTLIB,
                REMOVE_HIDDEN,
                MERGE_CONSECUTIVE_SELF_TIME,
                AGGREGATE_REPEATED_CALLS,
                GROUP_LIBRARY_FRAMES,
                REMOVE_UNNECESSARY_SELF_TIME_NODES,
                REMOVE_IRRELEVANT_NODES,
            ],
        )
    }

    /// Like [`Pipeline::summary`], but repeated calls stay in time order
    pub fn timeline(options: ProcessorOptions) -> Self {
        Self::summary(options).without(AGGREGATE_REPEATED_CALLS)
    }

    fn from_names(options: ProcessorOptions, names: &[&'static str]) -> Self {
        let mut pipeline = Self::new(options);
        for name in names {
            if let Some(processor) = processor_by_name(name) {
                pipeline = pipeline.with_stage(*name, processor);
            }
        }
        pipeline
    }

    /// Keep every frame: drop the stages that hide or remove frames
    pub fn show_all(self) -> Self {
        self.without(GROUP_LIBRARY_FRAMES)
            .without(REMOVE_IMPORTLIB)
            .without(REMOVE_IRRELEVANT_NODES)
            .without(REMOVE_HIDDEN)
    }

    /// Append a stage
    pub fn with_stage(mut self, name: &'static str, processor: Processor) -> Self {
        self.stages.push((name, processor));
        self
    }

    /// Drop every stage called `name`
    pub fn without(mut self, name: &str) -> Self {
        self.stages.retain(|(stage, _)| *stage != name);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Run every stage in order, feeding each the root the previous one
    /// returned
    ///
    /// # Errors
    /// The first error returned by a stage; later stages don't run.
    pub fn run(&self, tree: &mut FrameTree, root: Option<FrameId>) -> Result<Option<FrameId>, TreeError> {
        let mut root = root;

        for (name, processor) in &self.stages {
            root = processor(tree, root, &self.options)?;
            match root {
                Some(frame) => debug!(
                    "{}: {} frames, {:.6}s total",
                    name,
                    tree.descendants(frame).len(),
                    tree.total_time(frame)
                ),
                None => debug!("{}: empty tree", name),
            }
        }

        Ok(root)
    }
}
