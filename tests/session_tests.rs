use callstack_studio::commands::{execute_process, ProcessArgs};
use callstack_studio::frame::FrameTree;
use callstack_studio::output::{read_session, read_tree_report, write_session};
use callstack_studio::parser::schema::{SampleRecord, Session};
use callstack_studio::parser::to_tree_report;
use callstack_studio::processors::Pipeline;
use callstack_studio::utils::ProcessorOptions;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const OUTER: &str = "<module>\x00/home/me/serve.py\x001";
const LOOP: &str = "serve_forever\x00/home/me/serve.py\x0012";
const REQUEST: &str = "handle_request\x00/home/me/serve.py\x0030";
const RENDER: &str = "render\x00/home/me/views.py\x0050";

fn sample(stack: &[&str], duration: f64) -> SampleRecord {
    SampleRecord::new(stack.iter().map(|s| s.to_string()).collect(), duration)
}

fn session(start_time: f64, samples: Vec<SampleRecord>) -> Session {
    let duration: f64 = samples.iter().map(|s| s.duration).sum();
    Session {
        sample_count: samples.len() as u64,
        frame_records: samples,
        start_time,
        duration,
        start_call_stack: vec![OUTER.to_string(), LOOP.to_string()],
        target_description: "serve.py".to_string(),
        ..Session::default()
    }
}

#[test]
fn test_combined_sessions_build_one_tree() {
    let first = session(
        100.0,
        vec![sample(&[OUTER, LOOP, REQUEST, RENDER], 1.0), sample(&[OUTER, LOOP, REQUEST], 0.5)],
    );
    let second = session(50.0, vec![sample(&[OUTER, LOOP, REQUEST, RENDER], 2.0)]);

    let combined = Session::combine(first, second);
    assert_eq!(combined.start_time, 50.0);
    assert_eq!(combined.sample_count, 3);

    let mut tree = FrameTree::new();
    let root = combined.root_frame(&mut tree, true).unwrap();
    let root = Pipeline::summary(ProcessorOptions::default())
        .run(&mut tree, root)
        .unwrap()
        .unwrap();

    // the stem above serve_forever is trimmed; both requests aggregate
    assert_eq!(tree.function(root), Some("serve_forever"));
    let request = tree.children(root)[0];
    assert_eq!(tree.function(request), Some("handle_request"));
    assert_eq!(tree.total_time(request), 3.5);
    let render = tree.children(request)[0];
    assert_eq!(tree.function(render), Some("render"));
    assert_eq!(tree.total_time(render), 3.0);
}

#[test]
fn test_session_file_round_trip_and_report() {
    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let report_path = dir.path().join("reports/tree.json");

    let original = session(0.0, vec![sample(&[OUTER, LOOP, REQUEST], 1.0)]);
    write_session(&original, &session_path).unwrap();
    assert_eq!(read_session(&session_path).unwrap(), original);

    let report = execute_process(ProcessArgs {
        input: session_path,
        output_json: report_path.clone(),
        top_paths: 5,
        ..Default::default()
    })
    .unwrap();

    let loaded = read_tree_report(&report_path).unwrap();
    assert_eq!(loaded.frames, report.frames);
    assert_eq!(loaded.target_description, "serve.py");
    assert_eq!(loaded.hot_paths.len(), 1);
    assert_eq!(loaded.hot_paths[0].stack, "serve_forever;handle_request");
    assert_eq!(loaded.hot_paths[0].percentage, 100.0);
}

#[test]
fn test_empty_session_report() {
    let empty = Session::default();
    let mut tree = FrameTree::new();
    let root = empty.root_frame(&mut tree, true).unwrap();
    let root = Pipeline::summary(ProcessorOptions::default())
        .run(&mut tree, root)
        .unwrap();
    assert!(root.is_none());

    let report = to_tree_report(&tree, root, &empty, &[], 10);
    assert!(report.root().is_none());
    assert!(report.hot_paths.is_empty());
}

#[test]
fn test_deep_session_report_round_trip() {
    let depth = 300;
    let stack: Vec<String> = (0..depth)
        .map(|i| format!("level{}\x00/home/me/recurse.py\x00{}", i, i + 1))
        .collect();

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("deep.json");
    let report_path = dir.path().join("deep-tree.json");
    let frames: Vec<&str> = stack.iter().map(String::as_str).collect();
    write_session(&session(0.0, vec![sample(&frames, 1.0)]), &session_path).unwrap();

    let report = execute_process(ProcessArgs {
        input: session_path,
        output_json: report_path.clone(),
        ..Default::default()
    })
    .unwrap();

    let loaded = read_tree_report(&report_path).unwrap();
    assert_eq!(loaded.frames, report.frames);

    // walk root to leaf through the child indices
    let mut depth_seen = 0;
    let mut current = loaded.root().unwrap();
    while let Some(child) = loaded.children(current).next() {
        current = child;
        depth_seen += 1;
    }
    assert_eq!(depth_seen, depth - 1);
    assert_eq!(current.function, "level299");
}
