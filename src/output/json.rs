//! JSON session and tree report reader/writers.
//!
//! Sessions round-trip through JSON so they can be combined and
//! re-processed later; processed trees are written as flat frame lists.

use crate::parser::schema::{Session, TreeReport};
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a processed tree report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = to_tree_report(&tree, root, &session, &stages, 20);
/// write_tree_report(&report, "tree.json")?;
/// ```
pub fn write_tree_report(
    report: &TreeReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing tree report to: {}", output_path.display());

    write_json(report, output_path)?;

    info!(
        "Tree report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );
    Ok(())
}

/// Write a session to a JSON file
///
/// # Errors
/// Same as [`write_tree_report`].
pub fn write_session(session: &Session, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!(
        "Writing session ({} samples) to: {}",
        session.frame_records.len(),
        output_path.display()
    );

    write_json(session, output_path)
}

/// Read a session from a JSON file
///
/// # Errors
/// * `OutputError::ReadFailed` - File cannot be opened
/// * `OutputError::SerializationFailed` - Not a valid session
pub fn read_session(input_path: impl AsRef<Path>) -> Result<Session, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading session from: {}", input_path.display());

    let session: Session = read_json(input_path)?;

    debug!(
        "Session loaded: {} samples, {:.3}s",
        session.frame_records.len(),
        session.duration
    );
    Ok(session)
}

/// Read a tree report back from a JSON file
///
/// # Errors
/// Same as [`read_session`].
pub fn read_tree_report(input_path: impl AsRef<Path>) -> Result<TreeReport, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading tree report from: {}", input_path.display());

    let report: TreeReport = read_json(input_path)?;

    debug!("Tree report loaded: version {}", report.version);
    Ok(report)
}

fn write_json<T: Serialize>(value: &T, output_path: &Path) -> Result<(), OutputError> {
    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, value).map_err(OutputError::SerializationFailed)?;

    Ok(())
}

fn read_json<T: DeserializeOwned>(input_path: &Path) -> Result<T, OutputError> {
    let file = File::open(input_path).map_err(OutputError::ReadFailed)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(OutputError::SerializationFailed)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
