//! JSON schema definitions for sessions and processed trees.
//!
//! Sessions are what the sampler writes; tree reports are what we write
//! after processing. The report schema is versioned to allow future
//! evolution.
//!
//! Report frames are stored flat, in pre-order, and refer to each other by
//! index, so the JSON nesting depth doesn't grow with the stack depth.

use crate::utils::config::DEFAULT_INTERVAL;
use serde::{Deserialize, Deserializer, Serialize};

/// One sample: a stack snapshot and the time attributed to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Frame info strings, outermost first
    pub stack: Vec<String>,

    /// Seconds attributed to this sample
    pub duration: f64,
}

impl SampleRecord {
    pub fn new(stack: Vec<String>, duration: f64) -> Self {
        Self { stack, duration }
    }
}

/// A recorded profiling session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Samples in time order
    pub frame_records: Vec<SampleRecord>,

    /// Wall-clock start, seconds since the Unix epoch
    pub start_time: f64,

    /// Wall-clock duration in seconds
    pub duration: f64,

    #[serde(default = "default_interval")]
    pub min_interval: f64,

    #[serde(default = "default_interval")]
    pub max_interval: f64,

    pub sample_count: u64,

    /// Frames already on the stack when profiling started, outermost first
    #[serde(default)]
    pub start_call_stack: Vec<String>,

    /// What was profiled, e.g. the command line
    #[serde(default)]
    pub target_description: String,

    /// CPU time used by the process while profiling, in seconds
    ///
    /// Samplers that can't measure it write `null`.
    #[serde(default, deserialize_with = "zero_if_null")]
    pub cpu_time: f64,

    #[serde(default)]
    pub sys_path: Vec<String>,

    /// Install prefixes; files under these are library code
    #[serde(default)]
    pub sys_prefixes: Vec<String>,
}

fn default_interval() -> f64 {
    DEFAULT_INTERVAL
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl Default for Session {
    fn default() -> Self {
        Self {
            frame_records: Vec::new(),
            start_time: 0.0,
            duration: 0.0,
            min_interval: DEFAULT_INTERVAL,
            max_interval: DEFAULT_INTERVAL,
            sample_count: 0,
            start_call_stack: Vec::new(),
            target_description: String::new(),
            cpu_time: 0.0,
            sys_path: Vec::new(),
            sys_prefixes: Vec::new(),
        }
    }
}

/// A hot path in the call tree (stack with its self time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotPath {
    /// Collapsed stack representation (e.g., "main;handler;parse")
    pub stack: String,

    /// Self time of this stack, in seconds
    pub time: f64,

    /// Percentage of total time
    pub percentage: f64,
}

/// Top-level processed tree written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// What was profiled
    pub target_description: String,

    /// Total time of the root, in seconds
    pub total_time: f64,

    /// Number of samples the tree was built from
    pub sample_count: u64,

    /// Stages the tree went through, in order
    pub processors: Vec<String>,

    /// Top hot paths (ranked by self time)
    pub hot_paths: Vec<HotPath>,

    /// Frames in pre-order; the first one is the root. Empty for an empty
    /// session.
    pub frames: Vec<FrameReport>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

impl TreeReport {
    pub fn root(&self) -> Option<&FrameReport> {
        self.frames.first()
    }

    /// Child frames of `frame`, in tree order
    pub fn children<'a>(
        &'a self,
        frame: &'a FrameReport,
    ) -> impl Iterator<Item = &'a FrameReport> + 'a {
        frame
            .children
            .iter()
            .filter_map(move |index| self.frames.get(*index))
    }
}

/// One frame of a [`TreeReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Function name, or the synthetic label (`[self]`, `[await]`, ...)
    pub function: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_no: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,

    pub self_time: f64,
    pub absorbed_time: f64,
    pub total_time: f64,

    /// Group id, e.g. "group-3"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Index of the parent in [`TreeReport::frames`]; `None` for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,

    /// Indices of the children in [`TreeReport::frames`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
}
