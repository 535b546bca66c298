//! Trim the frames above the point where profiling started.

use crate::frame::{parse_frame_info, FrameId, FrameKind, FrameTree};
use crate::utils::error::TreeError;
use log::debug;

/// Drop the stem of frames that were already on the stack when profiling
/// started
///
/// Starting from `frame`, descends while the current frame has no self
/// time, has exactly one child, and that child matches the next entry of
/// `start_call_stack`. The frame reached this way is detached from its
/// parent and returned as the new root. If `frame` itself doesn't match
/// the first entry, nothing is trimmed.
///
/// # Errors
/// * `TreeError::MalformedRecord` - an entry of `start_call_stack` can't be
///   decoded
pub fn trim_stem(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    start_call_stack: &[String],
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let start_stack = start_call_stack
        .iter()
        .map(|info| parse_frame_info(info))
        .collect::<Result<Vec<FrameKind>, _>>()?;

    let mut expected = start_stack.iter();
    if expected.next() != Some(tree.kind(frame)) {
        return Ok(Some(frame));
    }

    let mut current = frame;
    let mut trimmed = 0;

    while tree.total_self_time(current) == 0.0 {
        let only_child = match tree.children(current) {
            [only_child] => *only_child,
            _ => break,
        };

        match expected.next() {
            Some(kind) if kind == tree.kind(only_child) => {
                current = only_child;
                trimmed += 1;
            }
            _ => break,
        }
    }

    if trimmed > 0 {
        debug!("trim_stem: trimmed {} frames above {}", trimmed, tree.kind(current).label());
        tree.remove_from_parent(current);
    }

    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{to_frame_info, FrameIdentifier};

    fn chain(tree: &mut FrameTree, names: &[&str]) -> (Vec<FrameId>, Vec<String>) {
        let mut frames = Vec::new();
        let mut infos = Vec::new();
        for name in names {
            let identifier = FrameIdentifier::new(*name, "app.py", 1);
            infos.push(to_frame_info(&identifier));
            let frame = tree.add_call_frame(identifier, 0.0);
            if let Some(parent) = frames.last() {
                tree.add_child(*parent, frame, None).unwrap();
            }
            frames.push(frame);
        }
        (frames, infos)
    }

    #[test]
    fn test_frame_passthrough_none() {
        let mut tree = FrameTree::new();
        assert_eq!(trim_stem(&mut tree, None, &[]).unwrap(), None);
    }

    #[test]
    fn test_trims_matching_stem() {
        let mut tree = FrameTree::new();
        let (frames, infos) = chain(&mut tree, &["main", "run", "handler", "work"]);
        let work_self = tree.add_self_time_frame(1.0);
        let other = tree.add_self_time_frame(0.5);
        tree.add_children(frames[3], &[work_self], None).unwrap();
        tree.add_child(frames[2], other, None).unwrap();

        // profiling started inside handler
        let root = trim_stem(&mut tree, Some(frames[0]), &infos[..3]).unwrap();

        assert_eq!(root, Some(frames[2]));
        assert_eq!(tree.parent(frames[2]), None);
        assert_eq!(tree.total_time(frames[2]), 1.5);
    }

    #[test]
    fn test_stops_at_branching_frame() {
        let mut tree = FrameTree::new();
        let (frames, infos) = chain(&mut tree, &["main", "run", "handler"]);
        let sibling = tree.add_call_frame(FrameIdentifier::new("setup", "app.py", 1), 1.0);
        tree.add_child(frames[0], sibling, None).unwrap();

        let root = trim_stem(&mut tree, Some(frames[0]), &infos).unwrap();

        assert_eq!(root, Some(frames[0]));
        assert_eq!(tree.children(frames[0]).len(), 2);
    }

    #[test]
    fn test_stops_at_frame_with_self_time() {
        let mut tree = FrameTree::new();
        let (frames, infos) = chain(&mut tree, &["main", "run", "handler"]);
        let run_self = tree.add_self_time_frame(0.25);
        tree.add_child(frames[1], run_self, None).unwrap();

        let root = trim_stem(&mut tree, Some(frames[0]), &infos).unwrap();

        // run has two children now, and self time
        assert_eq!(root, Some(frames[1]));
        assert_eq!(tree.parent(frames[1]), None);
    }

    #[test]
    fn test_root_mismatch_trims_nothing() {
        let mut tree = FrameTree::new();
        let (frames, _) = chain(&mut tree, &["main", "run"]);
        let start = vec![to_frame_info(&FrameIdentifier::new("other", "app.py", 1))];

        let root = trim_stem(&mut tree, Some(frames[0]), &start).unwrap();

        assert_eq!(root, Some(frames[0]));
        assert_eq!(tree.parent(frames[1]), Some(frames[0]));
    }

    #[test]
    fn test_malformed_start_stack() {
        let mut tree = FrameTree::new();
        let (frames, _) = chain(&mut tree, &["main"]);
        let start = vec!["not a frame".to_string()];
        assert!(matches!(
            trim_stem(&mut tree, Some(frames[0]), &start),
            Err(TreeError::MalformedRecord(_))
        ));
    }
}
