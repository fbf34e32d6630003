//! Selection state over live nodes.
//!
//! Selection stores ids, not node references, and is tolerant of the store
//! changing underneath it: reads filter against the live store, so an id
//! whose node was deleted or undone away silently drops out instead of
//! dangling.

use rulecanvas_graph::NodeStore;

/// Selected node ids plus a primary focus node.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    primary: Option<String>,
    selected: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single node.
    pub fn select_one(&mut self, node_id: impl Into<String>) {
        let id = node_id.into();
        self.primary = Some(id.clone());
        self.selected = vec![id];
    }

    /// Select a node together with its whole subtree; the node itself
    /// becomes primary.
    pub fn select_with_descendants(&mut self, store: &NodeStore, node_id: &str) {
        let subtree = store.subtree_ids(node_id);
        if subtree.is_empty() {
            return;
        }
        self.primary = Some(node_id.to_string());
        self.selected = subtree;
    }

    /// Add a node to the selection without changing the primary.
    pub fn add(&mut self, node_id: impl Into<String>) {
        let id = node_id.into();
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.selected.clear();
    }

    /// Primary node id, if it still exists in the store.
    pub fn primary<'a>(&'a self, store: &NodeStore) -> Option<&'a str> {
        self.primary
            .as_deref()
            .filter(|id| store.contains(id))
    }

    /// Selected ids still present in the store, in selection order.
    pub fn selected<'a>(&'a self, store: &NodeStore) -> Vec<&'a str> {
        self.selected
            .iter()
            .map(String::as_str)
            .filter(|id| store.contains(id))
            .collect()
    }

    pub fn is_selected(&self, store: &NodeStore, node_id: &str) -> bool {
        store.contains(node_id) && self.selected.iter().any(|id| id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecanvas_graph::{seed, OperatorRegistry};
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_deleted_nodes_drop_out_of_reads() {
        let registry = OperatorRegistry::standard();
        let result = seed(&json!({"+": [1, 2]}), "sel", &registry);
        let child_id = result.store.children(&result.root_id)[0].id.clone();

        let mut selection = Selection::new();
        selection.select_one(child_id.clone());
        selection.add(result.root_id.clone());
        assert_eq!(selection.selected(&result.store).len(), 2);

        let mut store = result.store.clone();
        let doomed: HashSet<String> = [child_id.clone()].into_iter().collect();
        store.remove_ids(&doomed);

        assert_eq!(selection.primary(&store), None);
        assert_eq!(selection.selected(&store), vec![result.root_id.as_str()]);
        assert!(!selection.is_selected(&store, &child_id));
    }

    #[test]
    fn test_select_with_descendants_covers_subtree() {
        let registry = OperatorRegistry::standard();
        let result = seed(&json!({"and": [{"var": "a"}, {"var": "b"}]}), "sel", &registry);

        let mut selection = Selection::new();
        selection.select_with_descendants(&result.store, &result.root_id);

        assert_eq!(selection.primary(&result.store), Some(result.root_id.as_str()));
        assert_eq!(selection.selected(&result.store).len(), 3);
    }
}
