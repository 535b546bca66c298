//! Session operations: merging two sessions, building the tree, and
//! turning a processed tree into a report.

use super::schema::{FrameReport, Session, TreeReport};
use crate::aggregator::{build_frame_tree, calculate_hot_paths};
use crate::frame::{FrameContext, FrameId, FrameTree};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::TreeError;
use log::debug;
use std::collections::HashMap;

impl Session {
    /// Concatenate two sessions into one
    ///
    /// The session that started first comes first, whichever order the
    /// arguments are given in. Its start call stack and target description
    /// win; durations, sample counts and CPU times add up.
    pub fn combine(first: Session, second: Session) -> Session {
        let (earlier, later) = if second.start_time < first.start_time {
            (second, first)
        } else {
            (first, second)
        };

        debug!(
            "Combining sessions: {} + {} samples",
            earlier.sample_count, later.sample_count
        );

        let mut frame_records = earlier.frame_records;
        frame_records.extend(later.frame_records);

        let mut sys_path = earlier.sys_path;
        for entry in later.sys_path {
            if !sys_path.contains(&entry) {
                sys_path.push(entry);
            }
        }

        let mut sys_prefixes = earlier.sys_prefixes;
        for prefix in later.sys_prefixes {
            if !sys_prefixes.contains(&prefix) {
                sys_prefixes.push(prefix);
            }
        }

        Session {
            frame_records,
            start_time: earlier.start_time,
            duration: earlier.duration + later.duration,
            min_interval: earlier.min_interval.min(later.min_interval),
            max_interval: earlier.max_interval.max(later.max_interval),
            sample_count: earlier.sample_count + later.sample_count,
            start_call_stack: earlier.start_call_stack,
            target_description: earlier.target_description,
            cpu_time: earlier.cpu_time + later.cpu_time,
            sys_path,
            sys_prefixes,
        }
    }

    /// Build this session's samples into `tree` and return the root
    ///
    /// The tree's context is replaced with one built from `sys_prefixes`.
    /// With `trim_stem`, the frames that were already on the stack when
    /// profiling started are cut off.
    ///
    /// # Errors
    /// * `TreeError::MalformedRecord` - a sample or start stack entry can't
    ///   be decoded
    pub fn root_frame(
        &self,
        tree: &mut FrameTree,
        trim_stem: bool,
    ) -> Result<Option<FrameId>, TreeError> {
        tree.set_context(FrameContext::new(self.sys_prefixes.clone()));

        let root = build_frame_tree(tree, &self.frame_records)?;
        if trim_stem {
            crate::processors::trim_stem(tree, root, &self.start_call_stack)
        } else {
            Ok(root)
        }
    }
}

/// Convert a processed tree into a report
///
/// **Public** - main entry point for report creation
///
/// # Arguments
/// * `tree` - Arena holding the processed frames
/// * `root` - Root returned by the last processor
/// * `session` - Session the tree was built from
/// * `processors` - Names of the stages that ran
/// * `top_paths` - Number of hot paths to include
pub fn to_tree_report(
    tree: &FrameTree,
    root: Option<FrameId>,
    session: &Session,
    processors: &[&str],
    top_paths: usize,
) -> TreeReport {
    let (total_time, hot_paths, frames) = match root {
        Some(root) => (
            tree.total_time(root),
            calculate_hot_paths(tree, root, top_paths),
            frame_reports(tree, root),
        ),
        None => (0.0, Vec::new(), Vec::new()),
    };

    TreeReport {
        version: SCHEMA_VERSION.to_string(),
        target_description: session.target_description.clone(),
        total_time,
        sample_count: session.sample_count,
        processors: processors.iter().map(|name| name.to_string()).collect(),
        hot_paths,
        frames,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Flatten the subtree under `root` into report frames, in pre-order
///
/// `root` always comes first and has no parent index, even when it is
/// attached to a larger tree.
pub fn frame_reports(tree: &FrameTree, root: FrameId) -> Vec<FrameReport> {
    let frames = tree.descendants(root);
    let index: HashMap<FrameId, usize> = frames
        .iter()
        .enumerate()
        .map(|(i, frame)| (*frame, i))
        .collect();

    frames
        .iter()
        .map(|&frame| {
            let identifier = tree.identifier(frame);
            FrameReport {
                function: tree
                    .function(frame)
                    .map(str::to_string)
                    .unwrap_or_else(|| tree.kind(frame).label()),
                file_path: identifier.map(|i| i.file_path.clone()),
                line_no: identifier.map(|i| i.line_no),
                class_name: identifier.and_then(|i| i.class_name.clone()),
                hidden: tree.is_hidden(frame),
                self_time: tree.self_time(frame),
                absorbed_time: tree.absorbed_time(frame),
                total_time: tree.total_time(frame),
                group: tree.group(frame).map(|group| group.to_string()),
                parent: tree
                    .parent(frame)
                    .and_then(|parent| index.get(&parent).copied()),
                children: tree
                    .children(frame)
                    .iter()
                    .filter_map(|child| index.get(child).copied())
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::SampleRecord;
    use pretty_assertions::assert_eq;

    const MAIN: &str = "main\x00app.py\x001";
    const RUN: &str = "run\x00app.py\x005";
    const WORK: &str = "work\x00app.py\x0010";

    fn session(start_time: f64, stacks: &[&[&str]]) -> Session {
        Session {
            frame_records: stacks
                .iter()
                .map(|stack| SampleRecord::new(stack.iter().map(|s| s.to_string()).collect(), 1.0))
                .collect(),
            start_time,
            duration: stacks.len() as f64,
            sample_count: stacks.len() as u64,
            ..Session::default()
        }
    }

    #[test]
    fn test_combine_orders_by_start_time() {
        let mut early = session(100.0, &[&[MAIN]]);
        early.start_call_stack = vec![MAIN.to_string()];
        early.target_description = "early".to_string();
        early.min_interval = 0.002;
        early.sys_path = vec!["/a".to_string(), "/b".to_string()];
        early.sys_prefixes = vec!["/usr".to_string()];
        early.cpu_time = 0.5;

        let mut late = session(200.0, &[&[RUN], &[WORK]]);
        late.target_description = "late".to_string();
        late.max_interval = 0.01;
        late.sys_path = vec!["/b".to_string(), "/c".to_string()];
        late.sys_prefixes = vec!["/usr".to_string(), "/opt".to_string()];
        late.cpu_time = 0.25;

        let combined = Session::combine(late, early);

        assert_eq!(combined.start_time, 100.0);
        assert_eq!(combined.frame_records.len(), 3);
        assert_eq!(combined.frame_records[0].stack, vec![MAIN.to_string()]);
        assert_eq!(combined.duration, 3.0);
        assert_eq!(combined.sample_count, 3);
        assert_eq!(combined.min_interval, 0.001);
        assert_eq!(combined.max_interval, 0.01);
        assert_eq!(combined.cpu_time, 0.75);
        assert_eq!(combined.start_call_stack, vec![MAIN.to_string()]);
        assert_eq!(combined.target_description, "early");
        assert_eq!(combined.sys_path, vec!["/a", "/b", "/c"]);
        assert_eq!(combined.sys_prefixes, vec!["/usr", "/opt"]);
    }

    #[test]
    fn test_root_frame_trims_stem() {
        let mut s = session(0.0, &[&[MAIN, RUN, WORK], &[MAIN, RUN, WORK]]);
        s.start_call_stack = vec![MAIN.to_string(), RUN.to_string()];

        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, true).unwrap().unwrap();
        assert_eq!(tree.function(root), Some("run"));
        assert_eq!(tree.total_time(root), 2.0);

        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, false).unwrap().unwrap();
        assert_eq!(tree.function(root), Some("main"));
    }

    #[test]
    fn test_root_frame_installs_context() {
        let mut s = session(0.0, &[&[MAIN]]);
        s.sys_prefixes = vec!["/usr/lib/".to_string()];

        let mut tree = FrameTree::new();
        s.root_frame(&mut tree, false).unwrap();
        assert_eq!(tree.context().sys_prefixes, vec!["/usr/lib/".to_string()]);
    }

    #[test]
    fn test_empty_session() {
        let s = Session::default();
        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, true).unwrap();
        assert_eq!(root, None);

        let report = to_tree_report(&tree, root, &s, &[], 10);
        assert!(report.root().is_none());
        assert_eq!(report.total_time, 0.0);
    }

    #[test]
    fn test_frame_report_mirrors_tree() {
        let s = session(0.0, &[&[MAIN, WORK], &[MAIN]]);
        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, false).unwrap();

        let report = to_tree_report(&tree, root, &s, &["remove_hidden"], 5);
        let root_report = report.root().unwrap();
        let children: Vec<&FrameReport> = report.children(root_report).collect();

        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.processors, vec!["remove_hidden".to_string()]);
        // work's own [self] leaf sits between the two children
        assert_eq!(report.frames.len(), 4);
        assert_eq!(root_report.function, "main");
        assert_eq!(root_report.file_path.as_deref(), Some("app.py"));
        assert_eq!(root_report.total_time, 2.0);
        assert_eq!(root_report.parent, None);
        assert_eq!(root_report.children, vec![1, 3]);
        assert_eq!(children[0].function, "work");
        assert_eq!(children[0].parent, Some(0));
        assert_eq!(children[1].function, "[self]");
        assert_eq!(children[1].line_no, None);
    }

    #[test]
    fn test_frame_reports_of_subtree() {
        let s = session(0.0, &[&[MAIN, RUN, WORK], &[MAIN, RUN]]);
        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, false).unwrap().unwrap();
        let run = tree.children(root)[0];

        let reports = frame_reports(&tree, run);

        assert_eq!(reports[0].function, "run");
        assert_eq!(reports[0].parent, None);
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[1].function, "work");
        assert_eq!(reports[1].parent, Some(0));
    }

    #[test]
    fn test_frame_report_keeps_class_name() {
        let method = "handle\x00app.py\x0020\x01cHandler";
        let s = session(0.0, &[&[MAIN, method]]);
        let mut tree = FrameTree::new();
        let root = s.root_frame(&mut tree, false).unwrap();

        let report = to_tree_report(&tree, root, &s, &[], 5);

        assert_eq!(report.frames[0].class_name, None);
        assert_eq!(report.frames[1].function, "handle");
        assert_eq!(report.frames[1].class_name.as_deref(), Some("Handler"));
    }
}
