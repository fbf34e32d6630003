//! Bounded undo/redo over store snapshots.
//!
//! Every successful edit pushes the *pre-edit* store onto the undo stack.
//! Undo and redo exchange the live store for a stored snapshot, so history
//! entries are complete states rather than inverse operations, and any
//! sequence of undos and redos lands on a store that once actually existed.
//! Node identifiers are minted outside the store, which keeps redone and
//! freshly created nodes from ever sharing an id.

use rulecanvas_graph::NodeStore;

const DEFAULT_MAX_LEVELS: usize = 100;

/// Snapshot history with a bounded undo depth.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: Vec<NodeStore>,
    redo: Vec<NodeStore>,
    max_levels: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEVELS)
    }
}

impl UndoStack {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_levels,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Record the pre-edit state. Any redo tail is discarded; the oldest
    /// snapshot is evicted once the depth bound is reached.
    pub fn push_snapshot(&mut self, store: &NodeStore) {
        self.redo.clear();
        if self.undo.len() >= self.max_levels {
            self.undo.remove(0);
        }
        self.undo.push(store.clone());
    }

    /// Step back one edit: returns the snapshot to restore, banking
    /// `current` for redo. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &NodeStore) -> Option<NodeStore> {
        let snapshot = self.undo.pop()?;
        self.redo.push(current.clone());
        Some(snapshot)
    }

    /// Step forward one undone edit.
    pub fn redo(&mut self, current: &NodeStore) -> Option<NodeStore> {
        let snapshot = self.redo.pop()?;
        self.undo.push(current.clone());
        Some(snapshot)
    }

    /// Drop the most recent snapshot and return it. Rollback path for an
    /// edit that failed after its snapshot was taken.
    pub fn discard_last(&mut self) -> Option<NodeStore> {
        self.undo.pop()
    }
}
