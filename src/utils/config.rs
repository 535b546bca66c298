//! Configuration and constants for the frame tree and processors.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::ConfigError;

/// Current session / tree output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Frame info encoding, as produced by the sampler
pub const IDENTIFIER_SEP: char = '\x00';
pub const ATTRIBUTES_SEP: char = '\x01';
pub const ATTRIBUTE_HIDDEN: &str = "h1";
pub const ATTRIBUTE_CLASS_NAME: &str = "c";

// Synthetic frame identifiers; these don't reflect real program frames
pub const SELF_TIME_FRAME_IDENTIFIER: &str = "[self]";
pub const AWAIT_FRAME_IDENTIFIER: &str = "[await]";
pub const OUT_OF_CONTEXT_FRAME_IDENTIFIER: &str = "[out-of-context]";
pub const DUMMY_ROOT_FRAME_IDENTIFIER: &str = "[root]";

/// File path fragment of the interpreter's import machinery
pub const IMPORTLIB_MARKER: &str = "<frozen importlib._bootstrap";

/// Default minimum share of total time a frame needs to stay in the output
pub const DEFAULT_FILTER_THRESHOLD: f64 = 0.01;

/// Substitute denominator when a tree's total time is exactly zero
pub const ZERO_TIME_EPSILON: f64 = 1e-10;

/// Default sampling interval, in seconds
pub const DEFAULT_INTERVAL: f64 = 0.001;

/// Options shared by every processor
///
/// Each option defaults independently; unknown keys in a config file are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    /// Minimum proportion of total time for a frame to be kept
    pub filter_threshold: f64,

    /// File paths matching this regex are grouped as library code
    pub hide_regex: Option<String>,

    /// File paths matching this regex are never grouped (beats `hide_regex`)
    pub show_regex: Option<String>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            filter_threshold: DEFAULT_FILTER_THRESHOLD,
            hide_regex: None,
            show_regex: None,
        }
    }
}

/// Load processor options from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
///
/// # Example
/// ```ignore
/// let options = load_processor_options("callstack.toml")?;
/// ```
pub fn load_processor_options(path: impl AsRef<Path>) -> Result<ProcessorOptions, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let options: ProcessorOptions = toml::from_str(&contents)?;
    Ok(options)
}
