//! # Edit Session
//!
//! Owns everything one open rule document needs: the node store, the
//! operator registry, the id generator, snapshot history, clipboard, and
//! selection.
//!
//! The session exposes two mutation surfaces. [`EditSession::try_mutate`]
//! returns a `Result` and is what tests and programmatic callers use.
//! [`EditSession::mutate`] and the per-operation convenience methods wrap it
//! into the UI-facing contract: any edit that cannot proceed is a silent
//! no-op, reported as `false`, with the refusal reason logged rather than
//! surfaced.

use crate::clipboard::Clipboard;
use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationResult, NewNodeKind};
use crate::selection::Selection;
use crate::undo_stack::UndoStack;
use rulecanvas_graph::{
    project, seed, Edge, GraphError, IdGenerator, NodeStore, OperatorRegistry,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Editing state for one rule document.
pub struct EditSession {
    /// Stable session identifier (also seeds node ids)
    pub id: String,
    store: NodeStore,
    registry: OperatorRegistry,
    ids: IdGenerator,
    history: UndoStack,
    clipboard: Clipboard,
    selection: Selection,
    /// Bumped on every applied change, undo, and redo
    version: u64,
}

impl EditSession {
    /// Session over an existing store. `ids` must be the generator the store
    /// was built with, so minted ids never collide with stored ones.
    pub fn new(id: impl Into<String>, store: NodeStore, registry: OperatorRegistry, ids: IdGenerator) -> Self {
        Self {
            id: id.into(),
            store,
            registry,
            ids,
            history: UndoStack::default(),
            clipboard: Clipboard::new(),
            selection: Selection::new(),
            version: 0,
        }
    }

    /// Session seeded from a canonical expression.
    pub fn from_expression(id: &str, expr: &Value, registry: OperatorRegistry) -> Self {
        let seeded = seed(expr, id, &registry);
        debug!(session = id, nodes = seeded.store.len(), "seeded session");
        Self::new(id, seeded.store, registry, seeded.ids)
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_paste(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Canonical expression of the first tree root, if any.
    pub fn root_expression(&self) -> Option<&Value> {
        self.store.roots().first().map(|n| &n.expression)
    }

    /// Cached canonical expression of one node.
    pub fn expression_of(&self, node_id: &str) -> Option<&Value> {
        self.store.get(node_id).map(|n| &n.expression)
    }

    /// Re-project a subtree from the live store (bypassing caches).
    pub fn project(&self, node_id: &str) -> Value {
        project(&self.store, node_id)
    }

    /// Parent→child edge list for graph-shaped renderers.
    pub fn edges(&self) -> Vec<Edge> {
        self.store.edges()
    }

    pub fn check_integrity(&self) -> Result<(), GraphError> {
        self.store.check_integrity(&self.registry)
    }

    /// Apply a mutation, recording the pre-edit state for undo. Validation
    /// runs before the snapshot is taken, so refused edits leave history
    /// untouched.
    pub fn try_mutate(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        mutation.validate(&self.store, &self.registry)?;
        self.history.push_snapshot(&self.store);

        match mutation.apply(&mut self.store, &self.registry, &mut self.ids) {
            Ok(result) => {
                self.version += 1;
                debug!(
                    session = %self.id,
                    mutation = mutation.name(),
                    version = self.version,
                    "applied mutation"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    mutation = mutation.name(),
                    error = %err,
                    "mutation failed after validation, rolling back"
                );
                if let Some(previous) = self.history.discard_last() {
                    self.store = previous;
                }
                Err(err.into())
            }
        }
    }

    /// UI-facing mutation entry point: `true` when the store changed,
    /// `false` for a silent no-op.
    pub fn mutate(&mut self, mutation: Mutation) -> bool {
        match self.try_mutate(mutation) {
            Ok(_) => true,
            Err(err) => {
                debug!(session = %self.id, error = %err, "edit refused");
                false
            }
        }
    }

    pub fn add_argument(
        &mut self,
        parent_id: &str,
        kind: NewNodeKind,
        operator: Option<&str>,
    ) -> bool {
        self.mutate(Mutation::AddArgument {
            parent_id: parent_id.to_string(),
            kind,
            operator: operator.map(str::to_string),
        })
    }

    pub fn remove_argument(&mut self, parent_id: &str, slot_index: usize) -> bool {
        self.mutate(Mutation::RemoveArgument {
            parent_id: parent_id.to_string(),
            slot_index,
        })
    }

    pub fn wrap_in_operator(&mut self, node_id: &str, operator: &str) -> bool {
        self.mutate(Mutation::WrapInOperator {
            node_id: node_id.to_string(),
            operator: operator.to_string(),
        })
    }

    pub fn duplicate_node_tree(&mut self, node_id: &str) -> bool {
        self.mutate(Mutation::DuplicateNodeTree {
            node_id: node_id.to_string(),
        })
    }

    pub fn delete_node_tree(&mut self, node_id: &str) -> bool {
        self.mutate(Mutation::DeleteNodeTree {
            node_id: node_id.to_string(),
        })
    }

    pub fn set_cell_value(&mut self, node_id: &str, slot_index: usize, value: Value) -> bool {
        self.mutate(Mutation::SetCellValue {
            node_id: node_id.to_string(),
            slot_index,
            value,
        })
    }

    pub fn set_literal_value(&mut self, node_id: &str, value: Value) -> bool {
        self.mutate(Mutation::SetLiteralValue {
            node_id: node_id.to_string(),
            value,
        })
    }

    /// Copy a subtree to the session clipboard.
    pub fn copy(&mut self, node_id: &str) -> bool {
        let copied = self.clipboard.copy(&self.store, node_id);
        if copied {
            debug!(session = %self.id, node = node_id, "copied subtree");
        }
        copied
    }

    /// Paste the clipboard, replacing the primary selection's subtree when
    /// one is set (and has a parent slot to splice into), otherwise
    /// replacing the whole store. The pasted root becomes the selection.
    pub fn paste(&mut self) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        let target = self.selection.primary(&self.store).map(str::to_string);

        self.history.push_snapshot(&self.store);
        match self
            .clipboard
            .paste(&mut self.store, target.as_deref(), &mut self.ids)
        {
            Some(new_root) => {
                self.version += 1;
                debug!(session = %self.id, root = %new_root, "pasted subtree");
                self.selection.select_one(new_root);
                true
            }
            None => {
                if let Some(previous) = self.history.discard_last() {
                    self.store = previous;
                }
                false
            }
        }
    }

    /// Revert the last edit. Selection is cleared since its nodes may not
    /// exist in the restored state.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.store) {
            Some(snapshot) => {
                self.store = snapshot;
                self.selection.clear();
                self.version += 1;
                debug!(session = %self.id, version = self.version, "undo");
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.store) {
            Some(snapshot) => {
                self.store = snapshot;
                self.selection.clear();
                self.version += 1;
                debug!(session = %self.id, version = self.version, "redo");
                true
            }
            None => false,
        }
    }
}
