use crate::frame::FrameTree;
use crate::output::read_session;
use crate::parser::schema::Session;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a session JSON file, including every sample's stack entries
pub fn validate_session_file(file_path: &Path) -> Result<Session> {
    println!("Validating session: {}", file_path.display());

    let session = read_session(file_path)?;

    // building the tree decodes every stack entry
    let mut tree = FrameTree::new();
    let root = session
        .root_frame(&mut tree, false)
        .context("Session contains malformed samples")?;

    println!("✓ Valid session JSON");
    println!("  Target: {}", session.target_description);
    println!("  Samples: {}", session.frame_records.len());
    println!("  Duration: {:.3}s", session.duration);
    println!("  CPU Time: {:.3}s", session.cpu_time);
    println!(
        "  Interval: {:.4}s - {:.4}s",
        session.min_interval, session.max_interval
    );
    if let Some(root) = root {
        println!("  Frames: {}", tree.descendants(root).len());
        println!("  Sampled Time: {:.3}s", tree.total_time(root));
    }

    Ok(session)
}

/// Display version information
pub fn display_version() {
    println!("Callstack Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Tree Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Builds and simplifies call trees from sampled call stacks.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::write_session;
    use crate::parser::schema::SampleRecord;
    use tempfile::tempdir;

    #[test]
    fn test_validate_session_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session {
            frame_records: vec![SampleRecord::new(vec!["main\x00app.py\x001".to_string()], 1.0)],
            sample_count: 1,
            ..Session::default()
        };
        write_session(&session, &path).unwrap();

        assert!(validate_session_file(&path).is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_stack() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session {
            frame_records: vec![SampleRecord::new(vec!["main:app.py:1".to_string()], 1.0)],
            sample_count: 1,
            ..Session::default()
        };
        write_session(&session, &path).unwrap();

        assert!(validate_session_file(&path).is_err());
    }
}
