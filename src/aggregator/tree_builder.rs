//! Build a frame tree from an ordered list of stack samples.
//!
//! Samples arrive in time order. Consecutive samples that share a stack
//! prefix share the tree nodes for that prefix; as soon as a sample's stack
//! diverges from the currently open path, the deeper open frames are
//! closed and fresh nodes are created. The result is a timeline-shaped
//! tree: repeated calls stay separate until `aggregate_repeated_calls`
//! merges them.
//!
//! Example, with each sample taking 1.0s:
//! ```text
//! main;a       main ─┬─ a ── [self] 2.0
//! main;a             ├─ b ── [self] 1.0
//! main;b             └─ a ── [self] 1.0
//! main;a
//! ```

use crate::frame::{parse_frame_info, FrameId, FrameKind, FrameTree};
use crate::parser::schema::SampleRecord;
use crate::utils::error::TreeError;
use log::debug;

/// Build a frame tree from `samples` into `tree`
///
/// **Public** - main entry point for tree construction
///
/// # Returns
/// The root frame, or `None` when there are no samples. If every sample
/// starts with the same outermost frame, that frame is the root; otherwise
/// the root is a synthetic `[root]` frame.
///
/// # Errors
/// * `TreeError::MalformedRecord` - a stack entry can't be decoded, or a
///   leaf-only entry (`[await]`, `[self]`, ...) is not the innermost one.
///   Every record is decoded before the tree is touched, so on error
///   `tree` is unchanged.
pub fn build_frame_tree(
    tree: &mut FrameTree,
    samples: &[SampleRecord],
) -> Result<Option<FrameId>, TreeError> {
    if samples.is_empty() {
        return Ok(None);
    }

    debug!("Building frame tree from {} samples", samples.len());

    let decoded = samples
        .iter()
        .enumerate()
        .map(|(index, sample)| decode_stack(index, sample))
        .collect::<Result<Vec<_>, _>>()?;

    let first_frame = tree.len();
    let dummy_root = tree.add_frame(FrameKind::DummyRoot, 0.0);

    // open_path[d] is the open frame at depth d; depth 0 is the dummy root
    let mut open_path: Vec<FrameId> = vec![dummy_root];

    for (stack, sample) in decoded.into_iter().zip(samples) {
        for (index, kind) in stack.iter().enumerate() {
            let depth = index + 1;

            if let Some(&open) = open_path.get(depth) {
                if tree.kind(open) == kind {
                    continue;
                }
                open_path.truncate(depth);
            }

            let parent = open_path[depth - 1];
            let frame = tree.add_frame(kind.clone(), 0.0);
            tree.add_child(parent, frame, None)?;
            open_path.push(frame);
        }

        open_path.truncate(stack.len() + 1);

        let innermost = open_path[stack.len()];
        if tree.is_synthetic_leaf(innermost) {
            tree.add_self_time(innermost, sample.duration);
        } else {
            let self_time = tree.add_self_time_frame(sample.duration);
            tree.add_child(innermost, self_time, None)?;
        }
    }

    // a lone outermost frame replaces the synthetic wrapper
    let only_child = match tree.children(dummy_root) {
        [only_child] => Some(*only_child),
        _ => None,
    };
    let root = match only_child {
        Some(child) => {
            tree.remove_from_parent(child);
            child
        }
        None => dummy_root,
    };

    debug!(
        "Built frame tree: {} frames, {:.6}s total",
        tree.len() - first_frame,
        tree.total_time(root)
    );

    Ok(Some(root))
}

/// Decode one sample's stack, outermost first
fn decode_stack(index: usize, sample: &SampleRecord) -> Result<Vec<FrameKind>, TreeError> {
    let stack = sample
        .stack
        .iter()
        .map(|info| parse_frame_info(info))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| match e {
            TreeError::MalformedRecord(msg) => {
                TreeError::MalformedRecord(format!("sample {}: {}", index, msg))
            }
            other => other,
        })?;

    if let Some(position) = stack.iter().position(FrameKind::is_synthetic_leaf) {
        if position + 1 != stack.len() {
            return Err(TreeError::MalformedRecord(format!(
                "sample {}: leaf-only frame {} at depth {} is not innermost",
                index,
                stack[position].label(),
                position + 1
            )));
        }
    }

    Ok(stack)
}
