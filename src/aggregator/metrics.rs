//! Calculate hot paths from a frame tree.
//!
//! Hot paths are the call stacks with the most self time. These are the
//! primary targets for optimization.

use crate::frame::{FrameId, FrameTree};
use crate::parser::schema::HotPath;
use log::debug;
use std::collections::HashMap;

/// Calculate hot paths from a (usually processed) frame tree
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `tree` - Arena holding the frames
/// * `root` - Root of the tree to walk
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths, sorted by self time (descending). Stacks are
/// function names joined with `;`, outermost first; identical stacks
/// reached through different nodes are summed.
pub fn calculate_hot_paths(tree: &FrameTree, root: FrameId, top_n: usize) -> Vec<HotPath> {
    let total_time = tree.total_time(root);
    let mut by_stack: HashMap<String, f64> = HashMap::new();

    let mut stack = vec![(root, frame_name(tree, root))];
    while let Some((frame, path)) = stack.pop() {
        let self_time = tree.total_self_time(frame);
        if self_time > 0.0 {
            *by_stack.entry(path.clone()).or_insert(0.0) += self_time;
        }

        for child in tree.children(frame) {
            if tree.is_synthetic_leaf(*child) {
                continue;
            }
            stack.push((*child, format!("{};{}", path, frame_name(tree, *child))));
        }
    }

    debug!("Calculating top {} hot paths from {} stacks", top_n, by_stack.len());

    let mut paths: Vec<HotPath> = by_stack
        .into_iter()
        .map(|(stack, time)| create_hot_path(stack, time, total_time))
        .collect();

    paths.sort_by(|a, b| b.time.total_cmp(&a.time).then_with(|| a.stack.cmp(&b.stack)));
    paths.truncate(top_n);
    paths
}

/// Create a HotPath from a stack and its self time
///
/// **Public** - internal conversion, exposed for tests
pub fn create_hot_path(stack: String, time: f64, total_time: f64) -> HotPath {
    let percentage = if total_time > 0.0 {
        (time / total_time) * 100.0
    } else {
        0.0
    };

    HotPath {
        stack,
        time,
        percentage,
    }
}

fn frame_name(tree: &FrameTree, frame: FrameId) -> String {
    tree.function(frame)
        .map(str::to_string)
        .unwrap_or_else(|| tree.kind(frame).label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameIdentifier;

    fn call(tree: &mut FrameTree, name: &str) -> FrameId {
        tree.add_call_frame(FrameIdentifier::new(name, "app.py", 1), 0.0)
    }

    #[test]
    fn test_calculate_hot_paths() {
        let mut tree = FrameTree::new();
        let main = call(&mut tree, "main");
        let execute = call(&mut tree, "execute");
        let storage = call(&mut tree, "storage");
        let s1 = tree.add_self_time_frame(5.0);
        let s2 = tree.add_self_time_frame(3.0);
        let s3 = tree.add_self_time_frame(2.0);
        tree.add_children(main, &[execute, storage, s3], None).unwrap();
        tree.add_child(execute, s1, None).unwrap();
        tree.add_child(storage, s2, None).unwrap();

        let hot_paths = calculate_hot_paths(&tree, main, 2);

        assert_eq!(hot_paths.len(), 2);
        assert_eq!(hot_paths[0].stack, "main;execute");
        assert_eq!(hot_paths[0].time, 5.0);
        assert_eq!(hot_paths[0].percentage, 50.0);
        assert_eq!(hot_paths[1].stack, "main;storage");
    }

    #[test]
    fn test_identical_stacks_are_summed() {
        let mut tree = FrameTree::new();
        let main = call(&mut tree, "main");
        let first = call(&mut tree, "work");
        let second = call(&mut tree, "work");
        let s1 = tree.add_self_time_frame(1.0);
        let s2 = tree.add_self_time_frame(1.5);
        tree.add_children(main, &[first, second], None).unwrap();
        tree.add_child(first, s1, None).unwrap();
        tree.add_child(second, s2, None).unwrap();

        let hot_paths = calculate_hot_paths(&tree, main, 10);
        assert_eq!(hot_paths.len(), 1);
        assert_eq!(hot_paths[0].time, 2.5);
    }

    #[test]
    fn test_create_hot_path_zero_total() {
        let hot_path = create_hot_path("a;b".to_string(), 1.0, 0.0);
        assert_eq!(hot_path.percentage, 0.0);
    }
}
