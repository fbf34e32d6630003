//! # Node Store
//!
//! The ordered collection of nodes forming one or more rule trees. The store
//! is the unit of truth: every other representation (canonical expression,
//! edge list, selection) is derived from it.
//!
//! The store is treated as an immutable value at each point in time:
//! mutations hand a complete new store to the caller, which is what makes
//! snapshot-based undo/redo correct.

use crate::error::GraphError;
use crate::node::{Node, NodeKind};
use crate::project::project_shallow;
use rulecanvas_registry::OperatorRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Derived edge for the layout pass: parent slot → child node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// Ordered node collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Append a node. The caller is responsible for wiring parent slots.
    pub fn insert(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Remove every node whose id is in `ids`.
    pub fn remove_ids(&mut self, ids: &HashSet<String>) {
        self.nodes.retain(|n| !ids.contains(&n.id));
    }

    /// Replace the entire contents with one new tree.
    pub fn replace_all(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    /// All tree roots, in insertion order.
    pub fn roots(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_root()).collect()
    }

    /// Direct children of `id`, ordered by `arg_index`.
    pub fn children(&self, id: &str) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .collect();
        children.sort_by_key(|n| n.arg_index.unwrap_or(usize::MAX));
        children
    }

    /// Ids of `id` and every node transitively reachable through its slot
    /// references, root first. Dangling references are skipped so traversal
    /// always terminates.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut collected = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            match self.get(&current) {
                Some(node) => {
                    collected.push(current);
                    // Push in reverse so slots come off the stack in order
                    for child in node.child_refs().iter().rev() {
                        stack.push((*child).to_string());
                    }
                }
                None => {
                    warn!(node_id = %current, "skipping dangling reference during traversal");
                }
            }
        }

        collected
    }

    /// Descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut ids = self.subtree_ids(id);
        if !ids.is_empty() {
            ids.remove(0);
        }
        ids
    }

    /// Reassign `arg_index` of `parent_id`'s children to `0..n-1` following
    /// the parent's slot order. Call after any slot-list edit.
    pub fn renumber_children(&mut self, parent_id: &str) {
        let ordered: Vec<String> = match self.get(parent_id) {
            Some(parent) => parent.child_refs().iter().map(|s| s.to_string()).collect(),
            None => return,
        };

        for (index, child_id) in ordered.iter().enumerate() {
            if let Some(child) = self.get_mut(child_id) {
                child.arg_index = Some(index);
                child.parent_id = Some(parent_id.to_string());
            }
        }
    }

    /// Rewrite the one slot on `parent_id` that references `old_id` to point
    /// at `new_id`. Returns false if no such slot exists.
    pub fn rewrite_child_ref(&mut self, parent_id: &str, old_id: &str, new_id: &str) -> bool {
        let Some(parent) = self.get_mut(parent_id) else {
            return false;
        };

        match &mut parent.kind {
            NodeKind::Operator { cells, .. } => {
                for cell in cells.iter_mut() {
                    if let crate::node::Cell::Branch { node, .. } = cell {
                        if node.as_deref() == Some(old_id) {
                            *node = Some(new_id.to_string());
                            return true;
                        }
                    }
                }
                false
            }
            NodeKind::Structure { elements, .. } => {
                for element in elements.iter_mut() {
                    if let crate::node::ElementValue::Branch { node } = &mut element.value {
                        if node == old_id {
                            *node = new_id.to_string();
                            return true;
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Derived edge list for the layout pass, reconstructed on demand from
    /// current slot references.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for child in node.child_refs() {
                edges.push(Edge {
                    source: node.id.clone(),
                    target: child.to_string(),
                });
            }
        }
        edges
    }

    /// Collect every violation of the store invariants. Empty means the
    /// store is well-formed.
    pub fn integrity_violations(&self, registry: &OperatorRegistry) -> Vec<String> {
        let mut violations = Vec::new();

        // 1. Uniqueness
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                violations.push(format!("duplicate node id: {}", node.id));
            }
        }

        // 3. Single ownership: each id referenced by at most one slot
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for node in &self.nodes {
            for child in node.child_refs() {
                if let Some(previous) = owners.insert(child, &node.id) {
                    violations.push(format!(
                        "node {} referenced by both {} and {}",
                        child, previous, node.id
                    ));
                }
            }
        }

        for node in &self.nodes {
            // 2. Referential closure
            if let Some(parent_id) = &node.parent_id {
                match self.get(parent_id) {
                    None => violations.push(format!(
                        "node {} has dangling parent {}",
                        node.id, parent_id
                    )),
                    Some(parent) => {
                        if !parent.child_refs().contains(&node.id.as_str()) {
                            violations.push(format!(
                                "node {} claims parent {} but no slot references it",
                                node.id, parent_id
                            ));
                        }
                    }
                }
            }
            for child in node.child_refs() {
                if !self.contains(child) {
                    violations.push(format!(
                        "node {} slot references missing node {}",
                        node.id, child
                    ));
                }
            }

            // 4. Index contiguity and slot-order agreement
            let children = self.children(&node.id);
            for (expected, child) in children.iter().enumerate() {
                if child.arg_index != Some(expected) {
                    violations.push(format!(
                        "child {} of {} has arg_index {:?}, expected {}",
                        child.id, node.id, child.arg_index, expected
                    ));
                }
            }
            let slot_order = node.child_refs();
            let child_order: Vec<&str> = children.iter().map(|c| c.id.as_str()).collect();
            if slot_order != child_order {
                violations.push(format!(
                    "children of {} out of slot order: slots {:?} vs arg_index {:?}",
                    node.id, slot_order, child_order
                ));
            }

            // 5. Arity bounds (unknown operators are permissive)
            if let NodeKind::Operator { name, cells, .. } = &node.kind {
                if let Some(def) = registry.get(name) {
                    let count = cells.len();
                    if count < def.arity.min_slots() {
                        violations.push(format!(
                            "operator {} ({}) has {} slots, minimum {}",
                            node.id,
                            name,
                            count,
                            def.arity.min_slots()
                        ));
                    }
                    if let Some(max) = def.arity.max_slots() {
                        if count > max {
                            violations.push(format!(
                                "operator {} ({}) has {} slots, maximum {}",
                                node.id, name, count, max
                            ));
                        }
                    }
                }
            }

            // 6. Projection consistency
            let fresh = project_shallow(self, node);
            if fresh != node.expression {
                violations.push(format!(
                    "node {} cached expression {} differs from projection {}",
                    node.id, node.expression, fresh
                ));
            }
        }

        violations
    }

    /// Invariant check as a result, for callers that want `?`.
    pub fn check_integrity(&self, registry: &OperatorRegistry) -> Result<(), GraphError> {
        let violations = self.integrity_violations(registry);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GraphError::Integrity(violations.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BranchRole, Cell};
    use rulecanvas_registry::OperatorCategory;
    use serde_json::json;

    fn two_child_sum() -> NodeStore {
        let mut store = NodeStore::new();
        let mut root = Node::operator(
            "s-1",
            "+",
            OperatorCategory::Arithmetic,
            vec![Cell::branch("s-2"), Cell::branch("s-3")],
        );
        root.expression = json!({"+": [2, 3]});

        let mut left = Node::literal("s-2", json!(2));
        left.parent_id = Some("s-1".to_string());
        left.arg_index = Some(0);

        let mut right = Node::literal("s-3", json!(3));
        right.parent_id = Some("s-1".to_string());
        right.arg_index = Some(1);

        store.insert(root);
        store.insert(left);
        store.insert(right);
        store
    }

    #[test]
    fn test_children_ordered_by_arg_index() {
        let store = two_child_sum();
        let children = store.children("s-1");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, "s-2");
        assert_eq!(children[1].id, "s-3");
    }

    #[test]
    fn test_subtree_collects_in_slot_order() {
        let store = two_child_sum();
        assert_eq!(store.subtree_ids("s-1"), vec!["s-1", "s-2", "s-3"]);
        assert_eq!(store.descendants("s-1"), vec!["s-2", "s-3"]);
        assert!(store.descendants("s-2").is_empty());
    }

    #[test]
    fn test_edges_projection() {
        let store = two_child_sum();
        let edges = store.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source, "s-1");
        assert_eq!(edges[0].target, "s-2");
        assert_eq!(edges[1].target, "s-3");
    }

    #[test]
    fn test_integrity_accepts_well_formed_store() {
        let store = two_child_sum();
        let registry = OperatorRegistry::standard();
        assert!(store.check_integrity(&registry).is_ok());
    }

    #[test]
    fn test_integrity_flags_dangling_reference() {
        let mut store = two_child_sum();
        store.remove_ids(&std::collections::HashSet::from(["s-3".to_string()]));

        let registry = OperatorRegistry::standard();
        let violations = store.integrity_violations(&registry);
        assert!(violations
            .iter()
            .any(|v| v.contains("missing node s-3")));
    }

    #[test]
    fn test_integrity_flags_arg_index_gap() {
        let mut store = two_child_sum();
        store.get_mut("s-3").unwrap().arg_index = Some(5);

        let registry = OperatorRegistry::standard();
        let violations = store.integrity_violations(&registry);
        assert!(violations.iter().any(|v| v.contains("arg_index")));
    }

    #[test]
    fn test_integrity_flags_stale_expression() {
        let mut store = two_child_sum();
        store.get_mut("s-2").unwrap().expression = json!(99);

        let registry = OperatorRegistry::standard();
        let violations = store.integrity_violations(&registry);
        // The literal itself is stale, and the parent no longer matches its
        // children's current expressions.
        assert!(violations.iter().any(|v| v.contains("s-2")));
        assert!(violations.iter().any(|v| v.contains("s-1")));
    }

    #[test]
    fn test_renumber_children_closes_gap() {
        let mut store = two_child_sum();
        // Drop the first cell, as removeArgument would
        if let NodeKind::Operator { cells, .. } = &mut store.get_mut("s-1").unwrap().kind {
            cells.remove(0);
        }
        store.remove_ids(&std::collections::HashSet::from(["s-2".to_string()]));
        store.renumber_children("s-1");

        assert_eq!(store.get("s-3").unwrap().arg_index, Some(0));
    }

    #[test]
    fn test_rewrite_child_ref() {
        let mut store = two_child_sum();
        let mut replacement = Node::literal("s-9", json!(7));
        replacement.parent_id = Some("s-1".to_string());
        replacement.arg_index = Some(1);
        store.insert(replacement);

        assert!(store.rewrite_child_ref("s-1", "s-3", "s-9"));
        assert!(!store.rewrite_child_ref("s-1", "s-3", "s-9"));

        let refs = store.get("s-1").unwrap().child_refs();
        assert_eq!(refs, vec!["s-2", "s-9"]);
    }

    #[test]
    fn test_cleared_branch_is_not_dangling() {
        let mut store = NodeStore::new();
        let mut node = Node::operator(
            "d-1",
            "?:",
            OperatorCategory::Decision,
            vec![
                Cell::Branch {
                    node: None,
                    role: BranchRole::Condition,
                    label: Some("if".to_string()),
                },
                Cell::Branch {
                    node: None,
                    role: BranchRole::Then,
                    label: Some("then".to_string()),
                },
                Cell::Branch {
                    node: None,
                    role: BranchRole::Else,
                    label: Some("else".to_string()),
                },
            ],
        );
        node.expression = json!({"?:": [null, null, null]});
        store.insert(node);

        let registry = OperatorRegistry::standard();
        assert!(store.check_integrity(&registry).is_ok());
    }
}
