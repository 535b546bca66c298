use std::path::PathBuf;

/// Arguments for the process command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ProcessArgs {
    /// Session JSON written by the sampler
    pub input: PathBuf,

    /// Output path for the tree report
    pub output_json: PathBuf,

    /// TOML file with processor options
    pub config: Option<PathBuf>,

    /// Overrides `filter_threshold` from the config file
    pub filter_threshold: Option<f64>,

    /// Overrides `hide_regex` from the config file
    pub hide_regex: Option<String>,

    /// Overrides `show_regex` from the config file
    pub show_regex: Option<String>,

    /// Keep repeated calls in time order instead of aggregating them
    pub timeline: bool,

    /// Keep library, importlib, hidden and insignificant frames
    pub show_all: bool,

    /// Cut off the frames that were on the stack before profiling started
    pub trim_stem: bool,

    /// Number of top hot paths to include in the report
    pub top_paths: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("session.json"),
            output_json: PathBuf::from("tree.json"),
            config: None,
            filter_threshold: None,
            hide_regex: None,
            show_regex: None,
            timeline: false,
            show_all: false,
            trim_stem: true,
            top_paths: 20,
            print_summary: false,
        }
    }
}

/// Arguments for the combine command
#[derive(Debug, Clone)]
pub struct CombineArgs {
    pub first: PathBuf,
    pub second: PathBuf,

    /// Output path for the combined session
    pub output_json: PathBuf,
}
