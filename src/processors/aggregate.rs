//! Processors that merge frames without losing time.

use crate::aggregator::frame_ops::{combine_frames, remove_frame_from_groups};
use crate::frame::{FrameId, FrameKind, FrameTree};
use crate::utils::config::ProcessorOptions;
use crate::utils::error::TreeError;
use log::debug;
use std::collections::HashMap;

/// Merge sibling frames with the same identity, then order each frame's
/// children by total time, largest first
///
/// This turns a timeline-shaped tree into a call-tree summary. Siblings
/// with equal totals keep their first-seen order. Idempotent.
pub fn aggregate_repeated_calls(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    _options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let mut merged = 0;
    let mut stack = vec![frame];

    while let Some(current) = stack.pop() {
        let mut aggregates: HashMap<FrameKind, FrameId> = HashMap::new();

        for child in tree.children(current).to_vec() {
            let existing = aggregates.get(tree.kind(child)).copied();
            match existing {
                Some(aggregate) => {
                    combine_frames(tree, child, aggregate)?;
                    merged += 1;
                }
                None => {
                    aggregates.insert(tree.kind(child).clone(), child);
                }
            }
        }

        // merging inside the children moves time around below them, but
        // never changes their totals, so sorting now is final
        tree.sort_children_by(current, |tree, a, b| {
            tree.total_time(b).total_cmp(&tree.total_time(a))
        });

        stack.extend_from_slice(tree.children(current));
    }

    debug!("aggregate_repeated_calls: merged {} frames", merged);

    Ok(Some(frame))
}

/// Combine runs of adjacent self-time siblings into the first of each run
///
/// Idempotent.
pub fn merge_consecutive_self_time(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    _options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    for current in tree.descendants(frame) {
        let mut previous_self_time: Option<FrameId> = None;

        for child in tree.children(current).to_vec() {
            if !tree.is_self_time(child) {
                previous_self_time = None;
                continue;
            }

            match previous_self_time {
                Some(previous) => {
                    let time = tree.self_time(child);
                    tree.add_self_time(previous, time);
                    tree.remove_from_parent(child);
                    remove_frame_from_groups(tree, child, false);
                }
                None => previous_self_time = Some(child),
            }
        }
    }

    Ok(Some(frame))
}
