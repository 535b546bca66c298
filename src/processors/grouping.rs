//! Group runs of library frames so they can be collapsed for display.

use crate::frame::{FrameId, FrameTree};
use crate::utils::config::ProcessorOptions;
use crate::utils::error::TreeError;
use log::debug;
use regex::Regex;

/// Decides whether a frame is library code that should be collapsed
///
/// Patterns must match at the start of the file path. A `show` match wins
/// over a `hide` match; with neither, non-application code is hidden.
pub struct HidePolicy {
    hide: Option<Regex>,
    show: Option<Regex>,
}

impl HidePolicy {
    /// Compile the hide/show patterns from `options`
    ///
    /// # Errors
    /// * `TreeError::InvalidPattern` - a pattern is not a valid regex
    pub fn from_options(options: &ProcessorOptions) -> Result<Self, TreeError> {
        Ok(Self {
            hide: options.hide_regex.as_deref().map(anchored).transpose()?,
            show: options.show_regex.as_deref().map(anchored).transpose()?,
        })
    }

    pub fn should_hide(&self, tree: &FrameTree, frame: FrameId) -> bool {
        let file_path = tree.file_path(frame).unwrap_or("");

        if self.show.as_ref().is_some_and(|re| re.is_match(file_path)) {
            return false;
        }
        if self.hide.as_ref().is_some_and(|re| re.is_match(file_path)) {
            return true;
        }
        !tree.is_application_code(frame)
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

/// Put chains of library frames into groups
///
/// A child of any frame starts a new group when it is not grouped yet,
/// should be hidden, and has at least one child that should be hidden too.
/// The group then takes in every contiguous hidden descendant, so no group
/// ever has a single member.
///
/// # Errors
/// * `TreeError::InvalidPattern` - `hide_regex` or `show_regex` is invalid
pub fn group_library_frames(
    tree: &mut FrameTree,
    frame: Option<FrameId>,
    options: &ProcessorOptions,
) -> Result<Option<FrameId>, TreeError> {
    let Some(frame) = frame else {
        return Ok(None);
    };

    let policy = HidePolicy::from_options(options)?;
    let mut created = 0;
    let mut stack = vec![frame];

    while let Some(current) = stack.pop() {
        for child in tree.children(current).to_vec() {
            let starts_group = tree.group(child).is_none()
                && policy.should_hide(tree, child)
                && tree
                    .children(child)
                    .iter()
                    .any(|grandchild| policy.should_hide(tree, *grandchild));

            if starts_group {
                let group = tree.new_group(child);
                created += 1;

                let mut pending = tree.children(child).to_vec();
                while let Some(candidate) = pending.pop() {
                    if policy.should_hide(tree, candidate) {
                        tree.add_frame_to_group(group, candidate);
                        pending.extend_from_slice(tree.children(candidate));
                    }
                }
            }

            stack.push(child);
        }
    }

    debug!("group_library_frames: created {} groups", created);

    Ok(Some(frame))
}
