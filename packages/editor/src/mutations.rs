//! # Graph Mutations
//!
//! Structural operations on the rule graph. Each mutation is an
//! intent-preserving edit that leaves the store projectable and arity-valid.
//!
//! ## Design Principles
//!
//! 1. **Validated**: every mutation checks its preconditions before touching
//!    the store
//! 2. **Synchronous**: a mutation runs to completion; callers never observe
//!    a store with stale caches or a violated invariant
//! 3. **Cache-repairing**: cached expressions are re-established along the
//!    ancestor chain at the end of every edit
//!
//! Failure handling is split across two layers: these functions return
//! `Result` so tests can assert *why* an edit was refused, while
//! [`crate::EditSession`] resolves every failure to a silent no-op, which is
//! the UI-facing contract.

use rulecanvas_graph::{
    decision_roles, refresh_from, BranchRole, Cell, ElementValue, IdGenerator, LiteralType, Node,
    NodeKind, NodeStore, OperatorCategory, OperatorRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Kind of node synthesized by [`Mutation::AddArgument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewNodeKind {
    Literal,
    Operator,
}

/// Semantic mutations over the node store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Append an operand to an extendable operator. For decision operators
    /// this inserts a condition/then pair before the trailing else.
    AddArgument {
        parent_id: String,
        kind: NewNodeKind,
        /// Operator name when `kind` is `Operator`
        operator: Option<String>,
    },

    /// Remove the slot at `slot_index`, cascade-deleting its subtree. For
    /// decision operators a condition or then slot removes its pair partner
    /// as a unit.
    RemoveArgument {
        parent_id: String,
        slot_index: usize,
    },

    /// Interpose a new operator between a node and its parent
    WrapInOperator { node_id: String, operator: String },

    /// Deep-copy a subtree with fresh ids; appended as a trailing sibling
    /// when the source has an operator parent, otherwise added as a new root
    DuplicateNodeTree { node_id: String },

    /// Remove a node and all descendants, patching the parent slot
    DeleteNodeTree { node_id: String },

    /// Update an inline/editable slot's scalar value
    SetCellValue {
        node_id: String,
        slot_index: usize,
        value: Value,
    },

    /// Replace a literal node's value (and declared type tag)
    SetLiteralValue { node_id: String, value: Value },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node is not an operator: {0}")]
    NotAnOperator(String),

    #[error("Node has no slots: {0}")]
    NoSlots(String),

    #[error("Operator does not take additional arguments: {0}")]
    NotExtendable(String),

    #[error("Operator {operator} is at its maximum of {max} slots")]
    MaxArityReached { operator: String, max: usize },

    #[error("Operator {operator} cannot go below {min} slots")]
    MinArityReached { operator: String, min: usize },

    #[error("No slot {index} on node {node_id}")]
    NoSuchSlot { node_id: String, index: usize },

    #[error("Slot {index} on node {node_id} is not editable")]
    SlotNotEditable { node_id: String, index: usize },

    #[error("Cannot remove the last condition/then pair")]
    LastDecisionPair,

    #[error("Node is not a literal: {0}")]
    NotALiteral(String),

    #[error("Operator name required when adding an operator argument")]
    MissingOperatorName,
}

/// What a mutation produced, for callers that need to address new nodes.
#[derive(Debug, Clone, Default)]
pub struct MutationResult {
    /// Root id of the subtree the mutation created, if any
    pub created: Option<String>,
}

impl Mutation {
    /// Debug name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddArgument { .. } => "add_argument",
            Mutation::RemoveArgument { .. } => "remove_argument",
            Mutation::WrapInOperator { .. } => "wrap_in_operator",
            Mutation::DuplicateNodeTree { .. } => "duplicate_node_tree",
            Mutation::DeleteNodeTree { .. } => "delete_node_tree",
            Mutation::SetCellValue { .. } => "set_cell_value",
            Mutation::SetLiteralValue { .. } => "set_literal_value",
        }
    }

    /// Check preconditions without applying.
    pub fn validate(
        &self,
        store: &NodeStore,
        registry: &OperatorRegistry,
    ) -> Result<(), MutationError> {
        match self {
            Mutation::AddArgument {
                parent_id,
                kind,
                operator,
            } => {
                let parent = store
                    .get(parent_id)
                    .ok_or_else(|| MutationError::NodeNotFound(parent_id.clone()))?;
                let NodeKind::Operator { name, cells, .. } = &parent.kind else {
                    return Err(MutationError::NotAnOperator(parent_id.clone()));
                };
                // Unregistered operators are opaque: never extendable
                let def = registry
                    .get(name)
                    .ok_or_else(|| MutationError::NotExtendable(name.clone()))?;
                if !def.arity.is_extendable() {
                    return Err(MutationError::NotExtendable(name.clone()));
                }
                if let Some(max) = def.arity.max_slots() {
                    if cells.len() >= max {
                        return Err(MutationError::MaxArityReached {
                            operator: name.clone(),
                            max,
                        });
                    }
                }
                if *kind == NewNodeKind::Operator && operator.is_none() {
                    return Err(MutationError::MissingOperatorName);
                }
                Ok(())
            }

            Mutation::RemoveArgument {
                parent_id,
                slot_index,
            } => {
                let parent = store
                    .get(parent_id)
                    .ok_or_else(|| MutationError::NodeNotFound(parent_id.clone()))?;
                let NodeKind::Operator { name, cells, .. } = &parent.kind else {
                    return Err(MutationError::NotAnOperator(parent_id.clone()));
                };
                if *slot_index >= cells.len() {
                    return Err(MutationError::NoSuchSlot {
                        node_id: parent_id.clone(),
                        index: *slot_index,
                    });
                }

                let def = registry.get(name);
                let paired = def.is_some_and(|d| d.arity.is_paired());
                let removed = if paired {
                    match cells[*slot_index].role() {
                        Some(BranchRole::Condition) | Some(BranchRole::Then) => {
                            let conditions = cells
                                .iter()
                                .filter(|c| c.role() == Some(BranchRole::Condition))
                                .count();
                            if conditions <= 1 {
                                return Err(MutationError::LastDecisionPair);
                            }
                            2
                        }
                        _ => 1,
                    }
                } else {
                    1
                };

                if let Some(def) = def {
                    let min = def.arity.min_slots();
                    if cells.len() - removed < min {
                        return Err(MutationError::MinArityReached {
                            operator: name.clone(),
                            min,
                        });
                    }
                }
                Ok(())
            }

            Mutation::WrapInOperator { node_id, .. } => {
                if store.contains(node_id) {
                    Ok(())
                } else {
                    Err(MutationError::NodeNotFound(node_id.clone()))
                }
            }

            Mutation::DuplicateNodeTree { node_id } => {
                let node = store
                    .get(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                // The copy lands as a trailing sibling, so a saturated
                // operator parent refuses it
                if let Some(parent) = node.parent_id.as_ref().and_then(|p| store.get(p)) {
                    if let NodeKind::Operator { name, cells, .. } = &parent.kind {
                        if let Some(max) = registry.get(name).and_then(|d| d.arity.max_slots()) {
                            if cells.len() >= max {
                                return Err(MutationError::MaxArityReached {
                                    operator: name.clone(),
                                    max,
                                });
                            }
                        }
                    }
                }
                Ok(())
            }

            Mutation::DeleteNodeTree { node_id } => {
                let node = store
                    .get(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                // Decision parents keep the slot with its reference cleared;
                // any other operator parent loses the slot outright, which is
                // refused at the arity floor
                if let Some(parent) = node.parent_id.as_ref().and_then(|p| store.get(p)) {
                    if let NodeKind::Operator {
                        name,
                        category,
                        cells,
                    } = &parent.kind
                    {
                        if *category != OperatorCategory::Decision {
                            if let Some(def) = registry.get(name) {
                                let min = def.arity.min_slots();
                                if cells.len() <= min {
                                    return Err(MutationError::MinArityReached {
                                        operator: name.clone(),
                                        min,
                                    });
                                }
                            }
                        }
                    }
                }
                Ok(())
            }

            Mutation::SetCellValue {
                node_id,
                slot_index,
                ..
            } => {
                let node = store
                    .get(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                match &node.kind {
                    NodeKind::Operator { cells, .. } => match cells.get(*slot_index) {
                        Some(Cell::Inline { .. }) | Some(Cell::Editable { .. }) => Ok(()),
                        Some(_) => Err(MutationError::SlotNotEditable {
                            node_id: node_id.clone(),
                            index: *slot_index,
                        }),
                        None => Err(MutationError::NoSuchSlot {
                            node_id: node_id.clone(),
                            index: *slot_index,
                        }),
                    },
                    NodeKind::Structure { elements, .. } => match elements.get(*slot_index) {
                        Some(element) => match element.value {
                            ElementValue::Inline { .. } => Ok(()),
                            ElementValue::Branch { .. } => Err(MutationError::SlotNotEditable {
                                node_id: node_id.clone(),
                                index: *slot_index,
                            }),
                        },
                        None => Err(MutationError::NoSuchSlot {
                            node_id: node_id.clone(),
                            index: *slot_index,
                        }),
                    },
                    _ => Err(MutationError::NoSlots(node_id.clone())),
                }
            }

            Mutation::SetLiteralValue { node_id, .. } => {
                let node = store
                    .get(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                match node.kind {
                    NodeKind::Literal { .. } => Ok(()),
                    _ => Err(MutationError::NotALiteral(node_id.clone())),
                }
            }
        }
    }

    /// Validate, then apply to the store. On success the store satisfies the
    /// structural invariants again.
    pub fn apply(
        &self,
        store: &mut NodeStore,
        registry: &OperatorRegistry,
        ids: &mut IdGenerator,
    ) -> Result<MutationResult, MutationError> {
        self.validate(store, registry)?;

        match self {
            Mutation::AddArgument {
                parent_id,
                kind,
                operator,
            } => apply_add_argument(store, registry, ids, parent_id, *kind, operator.as_deref()),

            Mutation::RemoveArgument {
                parent_id,
                slot_index,
            } => apply_remove_argument(store, registry, parent_id, *slot_index),

            Mutation::WrapInOperator { node_id, operator } => {
                apply_wrap(store, registry, ids, node_id, operator)
            }

            Mutation::DuplicateNodeTree { node_id } => apply_duplicate(store, ids, node_id),

            Mutation::DeleteNodeTree { node_id } => apply_delete(store, node_id),

            Mutation::SetCellValue {
                node_id,
                slot_index,
                value,
            } => apply_set_cell(store, node_id, *slot_index, value),

            Mutation::SetLiteralValue { node_id, value } => {
                apply_set_literal(store, node_id, value)
            }
        }
    }
}

/// Synthesize the subtree for a new argument and return its root id. An
/// `Operator` argument arrives arity-valid: the operator plus enough default
/// literal children (picked by its own category) to satisfy its minimum.
fn synthesize(
    store: &mut NodeStore,
    registry: &OperatorRegistry,
    ids: &mut IdGenerator,
    kind: NewNodeKind,
    operator: Option<&str>,
    default: Value,
) -> Result<String, MutationError> {
    match kind {
        NewNodeKind::Literal => {
            let node = Node::literal(ids.new_id(), default);
            let id = node.id.clone();
            store.insert(node);
            Ok(id)
        }
        NewNodeKind::Operator => {
            let name = operator.ok_or(MutationError::MissingOperatorName)?;
            let category = registry.category(name);
            let def = registry.get(name);
            let child_count = def.map(|d| d.arity.min_slots().max(1)).unwrap_or(1);

            let op_id = ids.new_id();
            let mut cells = Vec::with_capacity(child_count);
            for index in 0..child_count {
                let child = Node::literal(ids.new_id(), category.default_literal());
                let child_id = child.id.clone();
                store.insert(child);
                if let Some(child) = store.get_mut(&child_id) {
                    child.parent_id = Some(op_id.clone());
                    child.arg_index = Some(index);
                }
                cells.push(Cell::branch(child_id));
            }

            let op_node = Node::operator(op_id.clone(), name, category, cells);
            store.insert(op_node);
            if def.is_some_and(|d| d.arity.is_paired()) {
                relabel_decision(store, &op_id);
            }
            refresh_from(store, &op_id);
            Ok(op_id)
        }
    }
}

/// Reassign roles and display labels over a decision node's slots after its
/// slot list changed.
fn relabel_decision(store: &mut NodeStore, node_id: &str) {
    let Some(node) = store.get_mut(node_id) else {
        return;
    };
    if let NodeKind::Operator { cells, .. } = &mut node.kind {
        let roles = decision_roles(cells.len());
        for (cell, (role, label)) in cells.iter_mut().zip(roles) {
            if let Cell::Branch {
                role: cell_role,
                label: cell_label,
                ..
            } = cell
            {
                *cell_role = role;
                *cell_label = Some(label.to_string());
            }
        }
    }
}

fn apply_add_argument(
    store: &mut NodeStore,
    registry: &OperatorRegistry,
    ids: &mut IdGenerator,
    parent_id: &str,
    kind: NewNodeKind,
    operator: Option<&str>,
) -> Result<MutationResult, MutationError> {
    let parent = store
        .get(parent_id)
        .ok_or_else(|| MutationError::NodeNotFound(parent_id.to_string()))?;
    let (name, category) = match &parent.kind {
        NodeKind::Operator { name, category, .. } => (name.clone(), *category),
        _ => return Err(MutationError::NotAnOperator(parent_id.to_string())),
    };
    let paired = registry.get(&name).is_some_and(|d| d.arity.is_paired());

    let created = if paired {
        // Insert a condition/then pair immediately before the trailing else
        let condition_id = synthesize(
            store,
            registry,
            ids,
            kind,
            operator,
            OperatorCategory::Decision.default_literal(),
        )?;
        let then_id = synthesize(store, registry, ids, NewNodeKind::Literal, None, json!(0))?;

        if let Some(parent) = store.get_mut(parent_id) {
            if let NodeKind::Operator { cells, .. } = &mut parent.kind {
                let insert_at = match cells.last().and_then(|c| c.role()) {
                    Some(BranchRole::Else) => cells.len() - 1,
                    _ => cells.len(),
                };
                cells.insert(
                    insert_at,
                    Cell::decision_branch(then_id.clone(), BranchRole::Then),
                );
                cells.insert(
                    insert_at,
                    Cell::decision_branch(condition_id.clone(), BranchRole::Condition),
                );
            }
        }
        relabel_decision(store, parent_id);
        condition_id
    } else {
        let new_id = synthesize(store, registry, ids, kind, operator, category.default_literal())?;
        if let Some(parent) = store.get_mut(parent_id) {
            if let NodeKind::Operator { cells, .. } = &mut parent.kind {
                cells.push(Cell::branch(new_id.clone()));
            }
        }
        new_id
    };

    store.renumber_children(parent_id);
    refresh_from(store, parent_id);
    Ok(MutationResult {
        created: Some(created),
    })
}

fn apply_remove_argument(
    store: &mut NodeStore,
    registry: &OperatorRegistry,
    parent_id: &str,
    slot_index: usize,
) -> Result<MutationResult, MutationError> {
    let parent = store
        .get(parent_id)
        .ok_or_else(|| MutationError::NodeNotFound(parent_id.to_string()))?;
    let NodeKind::Operator { name, cells, .. } = &parent.kind else {
        return Err(MutationError::NotAnOperator(parent_id.to_string()));
    };
    let paired = registry.get(name).is_some_and(|d| d.arity.is_paired());

    // Slots removed together: the target, plus its pair partner on decision
    // operators when the target is a condition or then slot.
    let mut remove_indices = vec![slot_index];
    if paired {
        match cells.get(slot_index).and_then(|c| c.role()) {
            Some(BranchRole::Condition) if slot_index + 1 < cells.len() => {
                remove_indices.push(slot_index + 1);
            }
            Some(BranchRole::Then) if slot_index > 0 => {
                remove_indices.push(slot_index - 1);
            }
            _ => {}
        }
    }
    remove_indices.sort_unstable();

    let mut doomed: HashSet<String> = HashSet::new();
    for index in &remove_indices {
        if let Some(child_id) = cells.get(*index).and_then(|c| c.branch_id()) {
            doomed.extend(store.subtree_ids(child_id));
        }
    }

    store.remove_ids(&doomed);
    if let Some(parent) = store.get_mut(parent_id) {
        if let NodeKind::Operator { cells, .. } = &mut parent.kind {
            for index in remove_indices.iter().rev() {
                if *index < cells.len() {
                    cells.remove(*index);
                }
            }
        }
    }

    if paired {
        relabel_decision(store, parent_id);
    }
    store.renumber_children(parent_id);
    refresh_from(store, parent_id);
    Ok(MutationResult::default())
}

fn apply_wrap(
    store: &mut NodeStore,
    registry: &OperatorRegistry,
    ids: &mut IdGenerator,
    node_id: &str,
    operator: &str,
) -> Result<MutationResult, MutationError> {
    let target = store
        .get(node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
    let former_parent = target.parent_id.clone();
    let former_index = target.arg_index;

    let category = registry.category(operator);
    let def = registry.get(operator);
    let min = def.map(|d| d.arity.min_slots()).unwrap_or(0);

    // The wrapped node fills slot 0; pad with default literals until the
    // wrapper satisfies its minimum arity
    let wrapper_id = ids.new_id();
    let mut cells = vec![Cell::branch(node_id)];
    while cells.len() < min {
        let mut pad = Node::literal(ids.new_id(), category.default_literal());
        pad.parent_id = Some(wrapper_id.clone());
        pad.arg_index = Some(cells.len());
        cells.push(Cell::branch(pad.id.clone()));
        store.insert(pad);
    }

    let mut wrapper = Node::operator(wrapper_id.clone(), operator, category, cells);
    // The wrapper takes over the target's position among its siblings
    wrapper.parent_id = former_parent.clone();
    wrapper.arg_index = former_index;
    store.insert(wrapper);

    if let Some(parent_id) = &former_parent {
        store.rewrite_child_ref(parent_id, node_id, &wrapper_id);
    }
    if let Some(target) = store.get_mut(node_id) {
        target.parent_id = Some(wrapper_id.clone());
        target.arg_index = Some(0);
    }
    if def.is_some_and(|d| d.arity.is_paired()) {
        relabel_decision(store, &wrapper_id);
    }

    refresh_from(store, &wrapper_id);
    Ok(MutationResult {
        created: Some(wrapper_id),
    })
}

fn apply_duplicate(
    store: &mut NodeStore,
    ids: &mut IdGenerator,
    node_id: &str,
) -> Result<MutationResult, MutationError> {
    let cloned = crate::clone::clone_subtree(store, node_id, ids)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
    let new_root = cloned.new_root_id.clone();

    let parent_id = store.get(node_id).and_then(|n| n.parent_id.clone());
    let operator_parent = parent_id
        .as_ref()
        .and_then(|pid| store.get(pid))
        .filter(|p| matches!(p.kind, NodeKind::Operator { .. }))
        .map(|p| (p.id.clone(), p.is_decision()));

    match operator_parent {
        Some((pid, decision)) => {
            for node in cloned.nodes {
                store.insert(node);
            }
            if let Some(parent) = store.get_mut(&pid) {
                if let NodeKind::Operator { cells, .. } = &mut parent.kind {
                    cells.push(Cell::branch(new_root.clone()));
                }
            }
            if decision {
                relabel_decision(store, &pid);
            }
            store.renumber_children(&pid);
            refresh_from(store, &pid);
        }
        None => {
            // Copy becomes a standalone root
            for mut node in cloned.nodes {
                if node.id == new_root {
                    node.parent_id = None;
                    node.arg_index = None;
                }
                store.insert(node);
            }
        }
    }

    Ok(MutationResult {
        created: Some(new_root),
    })
}

fn apply_delete(store: &mut NodeStore, node_id: &str) -> Result<MutationResult, MutationError> {
    let node = store
        .get(node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
    let parent_id = node.parent_id.clone();
    let doomed: HashSet<String> = store.subtree_ids(node_id).into_iter().collect();

    if let Some(pid) = &parent_id {
        if let Some(parent) = store.get_mut(pid) {
            match &mut parent.kind {
                NodeKind::Operator {
                    category, cells, ..
                } => {
                    if *category == OperatorCategory::Decision {
                        // Decision branches are mandatory: keep the slot and
                        // clear the reference, the user picks a replacement
                        for cell in cells.iter_mut() {
                            if let Cell::Branch { node, .. } = cell {
                                if node.as_deref() == Some(node_id) {
                                    *node = None;
                                }
                            }
                        }
                    } else {
                        cells.retain(|c| c.branch_id() != Some(node_id));
                    }
                }
                NodeKind::Structure { elements, .. } => {
                    elements.retain(|e| e.branch_id() != Some(node_id));
                }
                _ => {}
            }
        }
    }

    store.remove_ids(&doomed);
    if let Some(pid) = &parent_id {
        store.renumber_children(pid);
        refresh_from(store, pid);
    }
    Ok(MutationResult::default())
}

fn apply_set_cell(
    store: &mut NodeStore,
    node_id: &str,
    slot_index: usize,
    value: &Value,
) -> Result<MutationResult, MutationError> {
    let node = store
        .get_mut(node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;

    match &mut node.kind {
        NodeKind::Operator { cells, .. } => match cells.get_mut(slot_index) {
            Some(Cell::Inline { value: slot }) | Some(Cell::Editable { value: slot }) => {
                *slot = value.clone();
            }
            Some(_) => {
                return Err(MutationError::SlotNotEditable {
                    node_id: node_id.to_string(),
                    index: slot_index,
                })
            }
            None => {
                return Err(MutationError::NoSuchSlot {
                    node_id: node_id.to_string(),
                    index: slot_index,
                })
            }
        },
        NodeKind::Structure { elements, .. } => match elements.get_mut(slot_index) {
            Some(element) => match &mut element.value {
                ElementValue::Inline { value: slot } => *slot = value.clone(),
                ElementValue::Branch { .. } => {
                    return Err(MutationError::SlotNotEditable {
                        node_id: node_id.to_string(),
                        index: slot_index,
                    })
                }
            },
            None => {
                return Err(MutationError::NoSuchSlot {
                    node_id: node_id.to_string(),
                    index: slot_index,
                })
            }
        },
        _ => return Err(MutationError::NoSlots(node_id.to_string())),
    }

    refresh_from(store, node_id);
    Ok(MutationResult::default())
}

fn apply_set_literal(
    store: &mut NodeStore,
    node_id: &str,
    value: &Value,
) -> Result<MutationResult, MutationError> {
    let node = store
        .get_mut(node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;

    match &mut node.kind {
        NodeKind::Literal {
            value: slot,
            literal_type,
        } => {
            *slot = value.clone();
            *literal_type = LiteralType::of(value);
        }
        _ => return Err(MutationError::NotALiteral(node_id.to_string())),
    }
    node.label = Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    refresh_from(store, node_id);
    Ok(MutationResult::default())
}
