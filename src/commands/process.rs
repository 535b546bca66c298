//! Process command implementation.
//!
//! The process command:
//! 1. Loads the session JSON
//! 2. Resolves processor options (config file, then CLI overrides)
//! 3. Builds the frame tree
//! 4. Runs the processor pipeline
//! 5. Writes the tree report

use super::models::ProcessArgs;
use crate::frame::FrameTree;
use crate::output::{read_session, write_tree_report};
use crate::parser::schema::TreeReport;
use crate::parser::to_tree_report;
use crate::processors::{HidePolicy, Pipeline};
use crate::utils::config::{load_processor_options, ProcessorOptions};
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the process command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Session file missing or invalid
/// * Config file invalid
/// * Malformed sample records or bad hide/show patterns
/// * File write errors
pub fn execute_process(args: ProcessArgs) -> Result<TreeReport> {
    let start_time = Instant::now();

    info!("Processing session: {}", args.input.display());

    info!("Step 1/5: Loading session...");
    let session = read_session(&args.input)
        .with_context(|| format!("Failed to load session {}", args.input.display()))?;

    info!("Step 2/5: Resolving processor options...");
    let options = resolve_options(&args)?;
    debug!("Processor options: {:?}", options);

    info!("Step 3/5: Building frame tree...");
    let mut tree = FrameTree::new();
    let root = session
        .root_frame(&mut tree, args.trim_stem)
        .context("Failed to build frame tree")?;

    info!("Step 4/5: Running processors...");
    let pipeline = build_pipeline(&args, options);
    let root = pipeline
        .run(&mut tree, root)
        .context("Failed to process frame tree")?;

    if let Some(root) = root {
        debug!("Processed tree: {:.6}s total", tree.total_time(root));
    }

    info!("Step 5/5: Writing tree report...");
    let report = to_tree_report(
        &tree,
        root,
        &session,
        &pipeline.stage_names(),
        args.top_paths,
    );
    write_tree_report(&report, &args.output_json).context("Failed to write tree report")?;

    info!("✓ Tree report written to: {}", args.output_json.display());

    if args.print_summary {
        print_summary(&report);
    }

    let elapsed = start_time.elapsed();
    info!("Process completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Config file options with CLI overrides applied
fn resolve_options(args: &ProcessArgs) -> Result<ProcessorOptions> {
    let mut options = match &args.config {
        Some(path) => load_processor_options(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProcessorOptions::default(),
    };

    if let Some(threshold) = args.filter_threshold {
        options.filter_threshold = threshold;
    }
    if args.hide_regex.is_some() {
        options.hide_regex = args.hide_regex.clone();
    }
    if args.show_regex.is_some() {
        options.show_regex = args.show_regex.clone();
    }

    Ok(options)
}

fn build_pipeline(args: &ProcessArgs, options: ProcessorOptions) -> Pipeline {
    let pipeline = if args.timeline {
        Pipeline::timeline(options)
    } else {
        Pipeline::summary(options)
    };

    if args.show_all {
        pipeline.show_all()
    } else {
        pipeline
    }
}

fn print_summary(report: &TreeReport) {
    println!("\n{}", "=".repeat(80));
    println!("PROCESSED TREE SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Target:      {}", report.target_description);
    println!("Samples:     {}", report.sample_count);
    println!("Total Time:  {:.3}s", report.total_time);
    println!("Processors:  {}", report.processors.join(", "));
    println!("\nTop {} hot paths:", report.hot_paths.len());
    for (i, path) in report.hot_paths.iter().enumerate() {
        println!(
            "  {:>2}. {:>8.3}s ({:>5.1}%)  {}",
            i + 1,
            path.time,
            path.percentage,
            path.stack
        );
    }
    println!("{}", "=".repeat(80));
}

/// Validate process arguments
///
/// **Public** - can be called before execute_process for early validation
pub fn validate_args(args: &ProcessArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Session file not found: {}", args.input.display());
    }

    if let Some(threshold) = args.filter_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("filter_threshold must be between 0 and 1");
        }
    }

    // bad patterns fail here instead of halfway through the pipeline
    let patterns = ProcessorOptions {
        hide_regex: args.hide_regex.clone(),
        show_regex: args.show_regex.clone(),
        ..ProcessorOptions::default()
    };
    HidePolicy::from_options(&patterns).context("Invalid hide/show pattern")?;

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    if args.top_paths > 1000 {
        anyhow::bail!("top_paths is too large (max 1000)");
    }

    Ok(())
}
