//! Frame groups: a display annotation over a contiguous run of library
//! frames.
//!
//! Groups don't change the tree structure. A frame belongs to at most one
//! group, and a group that loses a member and drops to a single one is
//! dissolved.

use super::tree::{FrameId, FrameTree};
use crate::utils::error::TreeError;
use std::cell::RefCell;
use std::fmt;

/// Handle to a [`FrameGroup`] stored in a [`FrameTree`]
///
/// Ids come from a per-tree counter, so the same input always yields the
/// same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// A set of frames collapsed together for display
#[derive(Debug)]
pub struct FrameGroup {
    id: GroupId,
    root: FrameId,
    frames: Vec<FrameId>,
    exit_frames: RefCell<Option<Vec<FrameId>>>,
}

impl FrameGroup {
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// The outermost frame of the group
    pub fn root(&self) -> FrameId {
        self.root
    }

    pub fn frames(&self) -> &[FrameId] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn contains(&self, frame: FrameId) -> bool {
        self.frames.contains(&frame)
    }

    fn invalidate_exit_frames(&self) {
        self.exit_frames.replace(None);
    }
}

impl FrameTree {
    /// Start a new group rooted at `root`
    ///
    /// `root` leaves any group it was already in.
    pub fn new_group(&mut self, root: FrameId) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(FrameGroup {
            id,
            root,
            frames: Vec::new(),
            exit_frames: RefCell::new(None),
        });
        self.add_frame_to_group(id, root);
        id
    }

    pub fn frame_group(&self, group: GroupId) -> &FrameGroup {
        &self.groups[group.0]
    }

    /// Every group ever created in this tree, dissolved ones included
    pub fn groups(&self) -> impl Iterator<Item = &FrameGroup> {
        self.groups.iter()
    }

    /// Move `frame` into `group`, leaving its previous group if any
    ///
    /// A previous group left with a single member is dissolved.
    pub fn add_frame_to_group(&mut self, group: GroupId, frame: FrameId) {
        if let Some(previous) = self.nodes[frame.index()].group {
            if previous == group {
                return;
            }
            self.detach_from_group(previous, frame);
        }

        self.groups[group.0].frames.push(frame);
        self.nodes[frame.index()].group = Some(group);
        self.invalidate_exit_frames_around(frame);
    }

    /// Take `frame` out of `group`
    ///
    /// If one member remains, it leaves the group too.
    ///
    /// # Errors
    /// * `TreeError::InvalidOperation` - `frame` is not a member of `group`
    pub fn remove_frame_from_group(
        &mut self,
        group: GroupId,
        frame: FrameId,
    ) -> Result<(), TreeError> {
        if self.nodes[frame.index()].group != Some(group) {
            return Err(TreeError::InvalidOperation(format!(
                "frame {} is not a member of {}",
                self.kind(frame).label(),
                group
            )));
        }
        self.detach_from_group(group, frame);
        Ok(())
    }

    fn detach_from_group(&mut self, group: GroupId, frame: FrameId) {
        self.unlink_member(group, frame);

        let lone = match self.groups[group.0].frames.as_slice() {
            [last] => Some(*last),
            _ => None,
        };
        if let Some(last) = lone {
            self.unlink_member(group, last);
        }
    }

    fn unlink_member(&mut self, group: GroupId, frame: FrameId) {
        // invalidate while the membership is still visible
        self.invalidate_exit_frames_around(frame);
        self.groups[group.0].frames.retain(|f| *f != frame);
        self.nodes[frame.index()].group = None;
    }

    /// Members with at least one child outside the group
    pub fn exit_frames(&self, group: GroupId) -> Vec<FrameId> {
        let info = &self.groups[group.0];
        if let Some(cached) = info.exit_frames.borrow().as_ref() {
            return cached.clone();
        }

        let exit_frames: Vec<FrameId> = info
            .frames
            .iter()
            .copied()
            .filter(|frame| {
                self.children(*frame)
                    .iter()
                    .any(|child| self.group(*child) != Some(group))
            })
            .collect();

        info.exit_frames.replace(Some(exit_frames.clone()));
        exit_frames
    }

    /// Exit frames of the group `frame` belongs to depend on its children
    pub(super) fn invalidate_exit_frames_of(&self, frame: FrameId) {
        if let Some(group) = self.group(frame) {
            self.groups[group.0].invalidate_exit_frames();
        }
    }

    /// A membership change of `frame` affects its own group and its
    /// parent's group
    fn invalidate_exit_frames_around(&self, frame: FrameId) {
        self.invalidate_exit_frames_of(frame);
        if let Some(parent) = self.parent(frame) {
            self.invalidate_exit_frames_of(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameIdentifier;

    fn chain(tree: &mut FrameTree, names: &[&str]) -> Vec<FrameId> {
        let mut frames = Vec::new();
        for name in names {
            let frame = tree.add_call_frame(FrameIdentifier::new(*name, "lib/x.py", 1), 0.0);
            if let Some(parent) = frames.last() {
                tree.add_child(*parent, frame, None).unwrap();
            }
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_new_group_contains_root() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a"]);
        let group = tree.new_group(frames[0]);

        assert_eq!(tree.frame_group(group).root(), frames[0]);
        assert_eq!(tree.frame_group(group).frames(), &[frames[0]]);
        assert_eq!(tree.group(frames[0]), Some(group));
    }

    #[test]
    fn test_group_ids_are_sequential() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b"]);
        let first = tree.new_group(frames[0]);
        let second = tree.new_group(frames[1]);
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(second.to_string(), "group-1");
    }

    #[test]
    fn test_membership_is_exclusive() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b", "c", "d"]);
        let first = tree.new_group(frames[0]);
        tree.add_frame_to_group(first, frames[1]);
        tree.add_frame_to_group(first, frames[2]);
        let second = tree.new_group(frames[3]);
        tree.add_frame_to_group(second, frames[2]);

        assert!(!tree.frame_group(first).contains(frames[2]));
        assert_eq!(tree.frame_group(first).len(), 2);
        assert!(tree.frame_group(second).contains(frames[2]));
        assert_eq!(tree.group(frames[2]), Some(second));
        tree.check_integrity(frames[0]).unwrap();
    }

    #[test]
    fn test_moving_out_of_a_pair_dissolves_it() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b", "c"]);
        let first = tree.new_group(frames[0]);
        tree.add_frame_to_group(first, frames[1]);
        let second = tree.new_group(frames[2]);

        tree.add_frame_to_group(second, frames[1]);

        assert!(tree.frame_group(first).is_empty());
        assert_eq!(tree.group(frames[0]), None);
        assert_eq!(tree.frame_group(second).frames(), &[frames[2], frames[1]]);
        tree.check_integrity(frames[0]).unwrap();
    }

    #[test]
    fn test_removing_from_a_pair_dissolves_it() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b"]);
        let group = tree.new_group(frames[0]);
        tree.add_frame_to_group(group, frames[1]);

        tree.remove_frame_from_group(group, frames[1]).unwrap();

        assert!(tree.frame_group(group).is_empty());
        assert_eq!(tree.group(frames[0]), None);
        tree.check_integrity(frames[0]).unwrap();
    }

    #[test]
    fn test_exit_frames() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b", "c"]);
        let group = tree.new_group(frames[0]);
        tree.add_frame_to_group(group, frames[1]);

        assert_eq!(tree.exit_frames(group), vec![frames[1]]);

        // pulling c into the group leaves it with no way out
        tree.add_frame_to_group(group, frames[2]);
        assert!(tree.exit_frames(group).is_empty());

        // a new non-member child turns c into an exit frame
        let d = tree.add_call_frame(FrameIdentifier::new("d", "app.py", 1), 0.0);
        tree.add_child(frames[2], d, None).unwrap();
        assert_eq!(tree.exit_frames(group), vec![frames[2]]);
    }

    #[test]
    fn test_remove_frame_from_wrong_group_fails() {
        let mut tree = FrameTree::new();
        let frames = chain(&mut tree, &["a", "b"]);
        let group = tree.new_group(frames[0]);
        assert!(tree.remove_frame_from_group(group, frames[1]).is_err());
        assert!(tree.remove_frame_from_group(group, frames[0]).is_ok());
        assert!(tree.frame_group(group).is_empty());
    }
}
