//! Combine command implementation.
//!
//! Concatenates two recorded sessions into one, so separate runs of the
//! same program can be processed as a single tree.

use super::models::CombineArgs;
use crate::output::{read_session, write_session};
use crate::parser::schema::Session;
use anyhow::{Context, Result};
use log::info;

/// Execute the combine command
///
/// **Public** - main entry point called from main.rs
pub fn execute_combine(args: CombineArgs) -> Result<Session> {
    let first = read_session(&args.first)
        .with_context(|| format!("Failed to load session {}", args.first.display()))?;
    let second = read_session(&args.second)
        .with_context(|| format!("Failed to load session {}", args.second.display()))?;

    let combined = Session::combine(first, second);
    info!(
        "Combined session: {} samples over {:.3}s",
        combined.sample_count, combined.duration
    );

    write_session(&combined, &args.output_json).context("Failed to write combined session")?;
    info!("✓ Combined session written to: {}", args.output_json.display());

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::SampleRecord;
    use tempfile::tempdir;

    #[test]
    fn test_execute_combine() {
        let dir = tempdir().unwrap();
        let session = |start_time: f64, function: &str| Session {
            frame_records: vec![SampleRecord::new(
                vec![format!("{}\x00app.py\x001", function)],
                1.0,
            )],
            start_time,
            duration: 1.0,
            sample_count: 1,
            ..Session::default()
        };

        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        write_session(&session(20.0, "later"), &first).unwrap();
        write_session(&session(10.0, "earlier"), &second).unwrap();

        let args = CombineArgs {
            first,
            second,
            output_json: dir.path().join("combined.json"),
        };
        let combined = execute_combine(args.clone()).unwrap();

        assert_eq!(combined.sample_count, 2);
        assert_eq!(combined.start_time, 10.0);
        assert!(combined.frame_records[0].stack[0].starts_with("earlier"));
        assert_eq!(read_session(&args.output_json).unwrap(), combined);
    }

    #[test]
    fn test_execute_combine_missing_input() {
        let dir = tempdir().unwrap();
        let args = CombineArgs {
            first: dir.path().join("a.json"),
            second: dir.path().join("b.json"),
            output_json: dir.path().join("out.json"),
        };
        assert!(execute_combine(args).is_err());
    }
}
