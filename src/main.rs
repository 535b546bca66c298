//! Callstack Studio CLI
//!
//! Turns recorded call-stack sampling sessions into processed call trees.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use callstack_studio::commands::{
    display_version, execute_combine, execute_process, validate_args, validate_session_file,
    CombineArgs, ProcessArgs,
};

/// Callstack Studio - call tree processing for sampling profilers
#[derive(Parser, Debug)]
#[command(name = "callstack")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and process the call tree of a session
    Process {
        /// Session JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the JSON tree report
        #[arg(short, long, default_value = "tree.json")]
        output: PathBuf,

        /// TOML file with processor options
        #[arg(short, long, env = "CALLSTACK_CONFIG")]
        config: Option<PathBuf>,

        /// Minimum share of total time a frame needs to be kept
        #[arg(long)]
        filter_threshold: Option<f64>,

        /// Regex for file paths to group as library code
        #[arg(long)]
        hide: Option<String>,

        /// Regex for file paths never to group (beats --hide)
        #[arg(long)]
        show: Option<String>,

        /// Keep calls in time order instead of aggregating them
        #[arg(long)]
        timeline: bool,

        /// Keep every frame (no grouping or filtering)
        #[arg(long)]
        show_all: bool,

        /// Keep the frames that were on the stack before profiling started
        #[arg(long)]
        no_trim_stem: bool,

        /// Number of top hot paths to include
        #[arg(long, default_value = "20")]
        top_paths: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Combine two session files into one
    Combine {
        /// First session JSON file
        first: PathBuf,

        /// Second session JSON file
        second: PathBuf,

        /// Output path for the combined session
        #[arg(short, long, default_value = "combined.json")]
        output: PathBuf,
    },

    /// Validate a session JSON file
    Validate {
        /// Path to session JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            filter_threshold,
            hide,
            show,
            timeline,
            show_all,
            no_trim_stem,
            top_paths,
            summary,
        } => {
            let args = ProcessArgs {
                input,
                output_json: output,
                config,
                filter_threshold,
                hide_regex: hide,
                show_regex: show,
                timeline,
                show_all,
                trim_stem: !no_trim_stem,
                top_paths,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_process(args)?;
        }

        Commands::Combine {
            first,
            second,
            output,
        } => {
            execute_combine(CombineArgs {
                first,
                second,
                output_json: output,
            })?;
        }

        Commands::Validate { file } => {
            validate_session_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
