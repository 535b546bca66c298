//! Tree surgery primitives shared by every processor.
//!
//! All of these keep the root's total time unchanged: time leaving a frame
//! always lands in a sibling, a replacement self-time frame, or the
//! parent's absorbed time.

use crate::frame::{FrameId, FrameTree};
use crate::utils::error::TreeError;

/// What takes the place of a deleted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceWith {
    /// Splice the frame's children into its position
    Children,

    /// Put a single self-time frame carrying the frame's time in its position
    SelfTime,

    /// Fold the frame's time into the parent's absorbed time
    Nothing,
}

/// Delete `frame` from the tree
///
/// In every mode the frame's own absorbed time moves to the parent's
/// absorbed time, and the frame (recursively) leaves its groups.
///
/// With [`ReplaceWith::Children`], a non-zero `self_time` on the frame is
/// kept as a self-time frame placed just before the spliced children.
///
/// # Errors
/// * `TreeError::InvalidOperation` - `frame` is a root
pub fn delete_frame(
    tree: &mut FrameTree,
    frame: FrameId,
    replace_with: ReplaceWith,
) -> Result<(), TreeError> {
    let Some(parent) = tree.parent(frame) else {
        return Err(TreeError::InvalidOperation(format!(
            "cannot delete the root frame {}",
            tree.kind(frame).label()
        )));
    };

    let absorbed_time = tree.absorbed_time(frame);
    // time the frame carries besides what it had already absorbed
    let own_time = tree.total_time(frame) - absorbed_time;

    match replace_with {
        ReplaceWith::Children => {
            let mut replacements = Vec::with_capacity(tree.children(frame).len() + 1);
            let self_time = tree.self_time(frame);
            if self_time != 0.0 {
                replacements.push(tree.add_self_time_frame(self_time));
            }
            replacements.extend_from_slice(tree.children(frame));
            tree.add_children(parent, &replacements, Some(frame))?;
        }
        ReplaceWith::SelfTime => {
            let replacement = tree.add_self_time_frame(own_time);
            tree.add_child(parent, replacement, Some(frame))?;
        }
        ReplaceWith::Nothing => {
            tree.add_absorbed_time(parent, own_time);
        }
    }

    tree.add_absorbed_time(parent, absorbed_time);
    tree.remove_from_parent(frame);

    // With `Children` the children already moved to the parent, so the
    // recursion only touches the frame itself.
    remove_frame_from_groups(tree, frame, true);

    Ok(())
}

/// Merge `frame` into its sibling `into`
///
/// Self and absorbed time are added to `into`, `frame`'s children are
/// appended to `into`'s, and `frame` is detached.
///
/// # Errors
/// * `TreeError::InvalidOperation` - the frames are not distinct siblings,
///   or `frame` has children and `into` is a leaf-only frame
pub fn combine_frames(tree: &mut FrameTree, frame: FrameId, into: FrameId) -> Result<(), TreeError> {
    if frame == into || tree.parent(frame) != tree.parent(into) {
        return Err(TreeError::InvalidOperation(format!(
            "cannot combine {} into {}: frames must be distinct siblings",
            tree.kind(frame).label(),
            tree.kind(into).label()
        )));
    }

    if tree.is_synthetic_leaf(into) && !tree.children(frame).is_empty() {
        return Err(TreeError::InvalidOperation(format!(
            "cannot combine {} into leaf-only frame {}",
            tree.kind(frame).label(),
            tree.kind(into).label()
        )));
    }

    tree.add_self_time(into, tree.self_time(frame));
    tree.add_absorbed_time(into, tree.absorbed_time(frame));

    let children = tree.children(frame).to_vec();
    tree.add_children(into, &children, None)?;

    tree.remove_from_parent(frame);
    remove_frame_from_groups(tree, frame, false);

    Ok(())
}

/// Take `frame` (and with `recursive`, its whole subtree) out of any group
///
/// A group left with a single member is dissolved.
pub fn remove_frame_from_groups(tree: &mut FrameTree, frame: FrameId, recursive: bool) {
    let frames = if recursive {
        tree.descendants(frame)
    } else {
        vec![frame]
    };

    for frame in frames {
        if let Some(group) = tree.group(frame) {
            // membership was just read from the frame itself
            let _ = tree.remove_frame_from_group(group, frame);
        }
    }
}
