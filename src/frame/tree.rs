//! Arena-backed call tree.
//!
//! Every node lives in a single `FrameTree` and is addressed by a copyable
//! [`FrameId`]. Parents own their children through the `children` list;
//! the `parent` link is only a back-reference used for cache invalidation
//! and removal. Nodes detached from the tree stay in the arena but are no
//! longer reachable from the root.
//!
//! Total time is memoized per node. Any change to a node's self/absorbed
//! time or to its child list clears the cache of that node and of every
//! ancestor up to the root.

use super::group::{FrameGroup, GroupId};
use super::identifier::{FrameIdentifier, FrameKind};
use crate::utils::error::TreeError;
use std::cell::Cell;

/// Handle to a frame stored in a [`FrameTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    /// Position of the frame in its arena
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub(super) struct FrameNode {
    pub(super) kind: FrameKind,
    pub(super) self_time: f64,
    pub(super) absorbed_time: f64,
    pub(super) children: Vec<FrameId>,
    pub(super) parent: Option<FrameId>,
    pub(super) group: Option<GroupId>,
    pub(super) cached_total_time: Cell<Option<f64>>,
}

/// Facts about the profiled program the tree needs to classify frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameContext {
    /// Install prefixes; files under these are library code
    pub sys_prefixes: Vec<String>,
}

impl FrameContext {
    pub fn new(sys_prefixes: Vec<String>) -> Self {
        Self { sys_prefixes }
    }
}

/// Arena of frames plus the frame groups annotating them
#[derive(Debug, Default)]
pub struct FrameTree {
    pub(super) nodes: Vec<FrameNode>,
    pub(super) groups: Vec<FrameGroup>,
    context: FrameContext,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: FrameContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    pub fn context(&self) -> &FrameContext {
        &self.context
    }

    pub fn set_context(&mut self, context: FrameContext) {
        self.context = context;
    }

    /// Number of frames ever allocated in this arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Allocate a new, detached frame
    pub fn add_frame(&mut self, kind: FrameKind, self_time: f64) -> FrameId {
        let id = FrameId(self.nodes.len());
        self.nodes.push(FrameNode {
            kind,
            self_time,
            absorbed_time: 0.0,
            children: Vec::new(),
            parent: None,
            group: None,
            cached_total_time: Cell::new(None),
        });
        id
    }

    /// Allocate a detached call frame
    pub fn add_call_frame(&mut self, identifier: FrameIdentifier, self_time: f64) -> FrameId {
        self.add_frame(FrameKind::Call(identifier), self_time)
    }

    /// Allocate a detached self-time leaf
    pub fn add_self_time_frame(&mut self, time: f64) -> FrameId {
        self.add_frame(FrameKind::SelfTime, time)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    fn node(&self, frame: FrameId) -> &FrameNode {
        &self.nodes[frame.0]
    }

    fn node_mut(&mut self, frame: FrameId) -> &mut FrameNode {
        &mut self.nodes[frame.0]
    }

    pub fn kind(&self, frame: FrameId) -> &FrameKind {
        &self.node(frame).kind
    }

    pub fn identifier(&self, frame: FrameId) -> Option<&FrameIdentifier> {
        self.node(frame).kind.identifier()
    }

    pub fn function(&self, frame: FrameId) -> Option<&str> {
        self.identifier(frame).map(|i| i.function.as_str())
    }

    pub fn file_path(&self, frame: FrameId) -> Option<&str> {
        self.identifier(frame).map(|i| i.file_path.as_str())
    }

    pub fn line_no(&self, frame: FrameId) -> Option<u32> {
        self.identifier(frame).map(|i| i.line_no)
    }

    pub fn is_hidden(&self, frame: FrameId) -> bool {
        self.identifier(frame).map(|i| i.hidden).unwrap_or(false)
    }

    pub fn is_synthetic(&self, frame: FrameId) -> bool {
        self.node(frame).kind.is_synthetic()
    }

    pub fn is_synthetic_leaf(&self, frame: FrameId) -> bool {
        self.node(frame).kind.is_synthetic_leaf()
    }

    pub fn is_self_time(&self, frame: FrameId) -> bool {
        self.node(frame).kind == FrameKind::SelfTime
    }

    pub fn self_time(&self, frame: FrameId) -> f64 {
        self.node(frame).self_time
    }

    pub fn absorbed_time(&self, frame: FrameId) -> f64 {
        self.node(frame).absorbed_time
    }

    pub fn children(&self, frame: FrameId) -> &[FrameId] {
        &self.node(frame).children
    }

    pub fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.node(frame).parent
    }

    pub fn group(&self, frame: FrameId) -> Option<GroupId> {
        self.node(frame).group
    }

    // ------------------------------------------------------------------
    // Time bookkeeping
    // ------------------------------------------------------------------

    pub fn set_self_time(&mut self, frame: FrameId, time: f64) {
        self.node_mut(frame).self_time = time;
        self.invalidate(frame);
    }

    pub fn add_self_time(&mut self, frame: FrameId, time: f64) {
        self.node_mut(frame).self_time += time;
        self.invalidate(frame);
    }

    pub fn add_absorbed_time(&mut self, frame: FrameId, time: f64) {
        self.node_mut(frame).absorbed_time += time;
        self.invalidate(frame);
    }

    /// Clear the cached total of `frame` and every ancestor
    fn invalidate(&self, frame: FrameId) {
        let mut current = Some(frame);
        while let Some(f) = current {
            let node = self.node(f);
            node.cached_total_time.set(None);
            current = node.parent;
        }
    }

    /// Self time plus absorbed time plus the totals of all children
    ///
    /// Uses an explicit work stack, so arbitrarily deep trees are fine.
    pub fn total_time(&self, frame: FrameId) -> f64 {
        if let Some(total) = self.node(frame).cached_total_time.get() {
            return total;
        }

        let mut stack = vec![(frame, false)];
        while let Some((current, children_done)) = stack.pop() {
            let node = self.node(current);
            if node.cached_total_time.get().is_some() {
                continue;
            }

            if children_done {
                let children_total: f64 = node
                    .children
                    .iter()
                    .map(|c| self.node(*c).cached_total_time.get().unwrap_or_default())
                    .sum();
                node.cached_total_time
                    .set(Some(node.self_time + node.absorbed_time + children_total));
            } else {
                stack.push((current, true));
                for child in &node.children {
                    if self.node(*child).cached_total_time.get().is_none() {
                        stack.push((*child, false));
                    }
                }
            }
        }

        self.node(frame).cached_total_time.get().unwrap_or_default()
    }

    /// Share of the parent's total time; 1.0 for a root, NaN if the parent
    /// has no time at all
    pub fn proportion_of_parent(&self, frame: FrameId) -> f64 {
        match self.parent(frame) {
            None => 1.0,
            Some(parent) => {
                let parent_time = self.total_time(parent);
                if parent_time == 0.0 {
                    f64::NAN
                } else {
                    self.total_time(frame) / parent_time
                }
            }
        }
    }

    /// Time spent in this frame itself, including self-time and other
    /// synthetic leaf children
    pub fn total_self_time(&self, frame: FrameId) -> f64 {
        let node = self.node(frame);
        let synthetic_children: f64 = node
            .children
            .iter()
            .filter(|c| self.is_synthetic_leaf(**c))
            .map(|c| self.total_time(*c))
            .sum();
        node.self_time + node.absorbed_time + synthetic_children
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Attach `frame` under `parent`, detaching it from any prior parent
    ///
    /// Appends by default; with `after`, inserts directly after that child.
    ///
    /// # Errors
    /// * `TreeError::InvalidOperation` - `parent` is a synthetic leaf,
    ///   `after` is not a child of `parent`, or `frame` is `parent` itself
    ///   or one of its ancestors
    pub fn add_child(
        &mut self,
        parent: FrameId,
        frame: FrameId,
        after: Option<FrameId>,
    ) -> Result<(), TreeError> {
        self.check_can_adopt(parent, frame)?;

        if let Some(after) = after {
            if after == frame || self.parent(after) != Some(parent) {
                return Err(TreeError::InvalidOperation(format!(
                    "cannot insert after {}: not a sibling position under {}",
                    self.kind(after).label(),
                    self.kind(parent).label()
                )));
            }
        }

        self.remove_from_parent(frame);

        let children = &mut self.node_mut(parent).children;
        let index = match after {
            Some(after) => children
                .iter()
                .position(|c| *c == after)
                .map(|i| i + 1)
                .unwrap_or(children.len()),
            None => children.len(),
        };
        children.insert(index, frame);
        self.node_mut(frame).parent = Some(parent);

        self.invalidate(parent);
        self.invalidate_exit_frames_of(parent);
        Ok(())
    }

    /// Attach several frames, preserving their order
    ///
    /// With `after`, the whole batch lands contiguously right after that
    /// child.
    pub fn add_children(
        &mut self,
        parent: FrameId,
        frames: &[FrameId],
        after: Option<FrameId>,
    ) -> Result<(), TreeError> {
        match after {
            // inserting in reverse keeps the batch in its original order
            Some(after) => {
                for frame in frames.iter().rev() {
                    self.add_child(parent, *frame, Some(after))?;
                }
            }
            None => {
                for frame in frames {
                    self.add_child(parent, *frame, None)?;
                }
            }
        }
        Ok(())
    }

    /// Detach `frame` from its parent; a no-op on a root
    pub fn remove_from_parent(&mut self, frame: FrameId) {
        let Some(parent) = self.node(frame).parent else {
            return;
        };

        self.node_mut(parent).children.retain(|c| *c != frame);
        self.node_mut(frame).parent = None;

        self.invalidate(parent);
        self.invalidate_exit_frames_of(parent);
    }

    /// Reorder the children of `frame` without changing its membership
    pub(crate) fn sort_children_by<F>(&mut self, frame: FrameId, mut compare: F)
    where
        F: FnMut(&Self, FrameId, FrameId) -> std::cmp::Ordering,
    {
        let mut children = std::mem::take(&mut self.node_mut(frame).children);
        let tree: &Self = self;
        children.sort_by(|a, b| compare(tree, *a, *b));
        self.node_mut(frame).children = children;
    }

    fn check_can_adopt(&self, parent: FrameId, frame: FrameId) -> Result<(), TreeError> {
        if self.is_synthetic_leaf(parent) {
            return Err(TreeError::InvalidOperation(format!(
                "cannot add children to leaf-only frame {}",
                self.kind(parent).label()
            )));
        }

        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == frame {
                return Err(TreeError::InvalidOperation(format!(
                    "cannot make {} a descendant of itself",
                    self.kind(frame).label()
                )));
            }
            ancestor = self.parent(a);
        }
        Ok(())
    }

    /// All frames under `root`, root first, in depth-first order
    pub fn descendants(&self, root: FrameId) -> Vec<FrameId> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(frame) = stack.pop() {
            result.push(frame);
            stack.extend(self.children(frame).iter().rev());
        }
        result
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Whether a frame belongs to the profiled program rather than to an
    /// installed library or interpreter machinery
    pub fn is_application_code(&self, frame: FrameId) -> bool {
        let mut current = frame;
        loop {
            let Some(file_path) = self.file_path(current) else {
                return false;
            };

            if file_path.is_empty() {
                return false;
            }

            if self
                .context
                .sys_prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && file_path.starts_with(prefix.as_str()))
            {
                return false;
            }

            if !file_path.starts_with('<') {
                return true;
            }

            if file_path.starts_with("<ipython-input-") {
                return true;
            }

            if file_path != "<string>" && file_path != "<stdin>" {
                // library-internal code generation
                return false;
            }

            // eval/exec is application code if its caller is
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return true,
            }
        }
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Verify the structural invariants of the tree under `root`
    ///
    /// # Errors
    /// * `TreeError::InvalidOperation` - describing the first violation
    pub fn check_integrity(&self, root: FrameId) -> Result<(), TreeError> {
        for frame in self.descendants(root) {
            let node = self.node(frame);

            if node.kind.is_synthetic_leaf() && !node.children.is_empty() {
                return Err(TreeError::InvalidOperation(format!(
                    "leaf-only frame {} has {} children",
                    node.kind.label(),
                    node.children.len()
                )));
            }

            for child in &node.children {
                if self.parent(*child) != Some(frame) {
                    return Err(TreeError::InvalidOperation(format!(
                        "child {} of {} has a mismatched parent link",
                        self.kind(*child).label(),
                        node.kind.label()
                    )));
                }
            }

            if let Some(group) = node.group {
                let info = self.frame_group(group);
                if !info.contains(frame) {
                    return Err(TreeError::InvalidOperation(format!(
                        "frame {} points at group {} but is not a member",
                        node.kind.label(),
                        group
                    )));
                }
                if info.len() < 2 {
                    return Err(TreeError::InvalidOperation(format!(
                        "group {} has fewer than two members",
                        group
                    )));
                }
            }
        }
        Ok(())
    }
}
