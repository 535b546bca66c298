//! Processors that delete frames from the tree.
//!
//! `remove_importlib` and `remove_hidden` splice the matching frames out
//! (their children move up). `remove_unnecessary_self_time_nodes` and
//! `remove_irrelevant_nodes` fold the deleted time into the parent's
//! absorbed time. None of them change the root's total time.

use crate::aggregator::frame_ops::{delete_frame, ReplaceWith};
use crate::frame::{FrameId, FrameTree};
use crate::utils::config::{ProcessorOptions, IMPORTLIB_MARKER, ZERO_TIME_EPSILON};
use crate::utils::error::TreeError;
use log::debug;

/// Removes `<frozen importlib._bootstrap>` frames that clutter the output
///
/// Their children and self time are spliced into the parent, in place.
/// Idempotent.
pub fn remove_importlib(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    _options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let removed = remove_matching(tree, frame, |tree, f| {
        tree.file_path(f)
            .map(|path| path.contains(IMPORTLIB_MARKER))
            .unwrap_or(false)
    })?;
    debug!("remove_importlib: removed {} frames", removed);

    Ok(Some(frame))
}

/// Removes frames marked hidden by the profiled program (e.g. frames that
/// asked to be left out of tracebacks)
///
/// Idempotent.
pub fn remove_hidden(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    _options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let removed = remove_matching(tree, frame, |tree, f| tree.is_hidden(f))?;
    debug!("remove_hidden: removed {} frames", removed);

    Ok(Some(frame))
}

/// Delete every strict descendant of `frame` matching `predicate`,
/// innermost first, splicing children into the parent
fn remove_matching<P>(tree: &mut FrameTree, frame: FrameId, predicate: P) -> Result<usize, TreeError>
where
    P: Fn(&FrameTree, FrameId) -> bool,
{
    // Reverse pre-order visits every frame after all of its descendants,
    // so each frame still has its original parent when it is examined.
    let candidates = tree.descendants(frame);
    let mut removed = 0;

    for candidate in candidates.into_iter().skip(1).rev() {
        if predicate(tree, candidate) {
            delete_frame(tree, candidate, ReplaceWith::Children)?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// When a frame's only child is a self-time frame, fold that child into
/// the frame
///
/// The extra layer adds no information. Idempotent.
pub fn remove_unnecessary_self_time_nodes(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    _options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    for current in tree.descendants(frame) {
        let only_child = match tree.children(current) {
            [only_child] => Some(*only_child),
            _ => None,
        };

        if let Some(child) = only_child.filter(|child| tree.is_self_time(*child)) {
            delete_frame(tree, child, ReplaceWith::Nothing)?;
        }
    }

    Ok(Some(frame))
}

/// Remove frames that account for less than `filter_threshold` of the
/// tree's total time
///
/// The threshold is always relative to the total time of `frame`, never to
/// the local subtree. Removed time is absorbed by the parent, so the total
/// is preserved.
///
/// Not idempotent in general: after other stages change the total, a
/// second run can remove more.
pub fn remove_irrelevant_nodes(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    remove_irrelevant_nodes_with_total(tree, frame, options, None)
}

/// [`remove_irrelevant_nodes`] with an explicit denominator
///
/// `total_time` defaults to the total time of `frame`; a zero total is
/// replaced with a tiny epsilon.
pub fn remove_irrelevant_nodes_with_total(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    options: &ProcessorOptions,
    total_time: Option<f64>,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let mut total_time = total_time.unwrap_or_else(|| tree.total_time(frame));
    if total_time == 0.0 {
        total_time = ZERO_TIME_EPSILON;
    }

    let threshold = options.filter_threshold;
    let mut removed = 0;
    let mut stack = vec![frame];

    while let Some(current) = stack.pop() {
        for child in tree.children(current).to_vec() {
            let proportion_of_total = tree.total_time(child) / total_time;

            if proportion_of_total < threshold {
                delete_frame(tree, child, ReplaceWith::Nothing)?;
                removed += 1;
            } else {
                stack.push(child);
            }
        }
    }

    debug!(
        "remove_irrelevant_nodes: removed {} frames below {:.2}% of {:.6}s",
        removed,
        threshold * 100.0,
        total_time
    );

    Ok(Some(frame))
}
