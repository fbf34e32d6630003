//! Session-local clipboard.
//!
//! Copy captures a self-contained snapshot of a subtree under its original
//! ids; the ids are remapped freshly on every paste, so pasting twice never
//! collides and pasting survives the source being deleted or undone away.

use crate::clone::clone_subtree;
use rulecanvas_graph::{refresh_from, refresh_subtree, IdGenerator, Node, NodeStore};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct Payload {
    nodes: Vec<Node>,
    root_id: String,
}

/// Clipboard holding at most one copied subtree.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    payload: Option<Payload>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }

    /// Snapshot the subtree rooted at `node_id`. Returns `false` (leaving
    /// any previous payload intact) when the node does not exist.
    pub fn copy(&mut self, store: &NodeStore, node_id: &str) -> bool {
        let subtree = store.subtree_ids(node_id);
        if subtree.is_empty() {
            return false;
        }
        let nodes = subtree
            .iter()
            .filter_map(|id| store.get(id).cloned())
            .collect();
        self.payload = Some(Payload {
            nodes,
            root_id: node_id.to_string(),
        });
        true
    }

    /// Materialize the payload into `store` under fresh ids and return the
    /// new root. With a `target` that has a parent, the copy replaces the
    /// target subtree in place; otherwise it replaces the whole store.
    pub fn paste(
        &self,
        store: &mut NodeStore,
        target: Option<&str>,
        ids: &mut IdGenerator,
    ) -> Option<String> {
        let payload = self.payload.as_ref()?;
        let scratch = NodeStore::from_nodes(payload.nodes.clone());
        let cloned = clone_subtree(&scratch, &payload.root_id, ids)?;
        let new_root = cloned.new_root_id.clone();

        let splice_point = target
            .and_then(|t| store.get(t))
            .and_then(|t| t.parent_id.clone().map(|p| (t.id.clone(), p, t.arg_index)));

        match splice_point {
            Some((target_id, parent_id, arg_index)) => {
                let doomed: HashSet<String> =
                    store.subtree_ids(&target_id).into_iter().collect();
                store.rewrite_child_ref(&parent_id, &target_id, &new_root);
                store.remove_ids(&doomed);

                for mut node in cloned.nodes {
                    if node.id == new_root {
                        node.parent_id = Some(parent_id.clone());
                        node.arg_index = arg_index;
                    }
                    store.insert(node);
                }
                store.renumber_children(&parent_id);
                refresh_subtree(store, &new_root);
                refresh_from(store, &parent_id);
            }
            None => {
                let mut nodes = cloned.nodes;
                for node in nodes.iter_mut() {
                    if node.id == new_root {
                        node.parent_id = None;
                        node.arg_index = None;
                    }
                }
                store.replace_all(nodes);
                refresh_subtree(store, &new_root);
            }
        }

        Some(new_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecanvas_graph::{project, seed, OperatorRegistry};
    use serde_json::json;

    #[test]
    fn test_copy_then_paste_wholesale() {
        let registry = OperatorRegistry::standard();
        let mut result = seed(&json!({"+": [1, 2]}), "clip", &registry);

        let mut clipboard = Clipboard::new();
        assert!(clipboard.copy(&result.store, &result.root_id));

        let mut other = NodeStore::new();
        let pasted = clipboard
            .paste(&mut other, None, &mut result.ids)
            .unwrap();
        assert_eq!(project(&other, &pasted), json!({"+": [1, 2]}));
        assert!(other.check_integrity(&registry).is_ok());
    }

    #[test]
    fn test_paste_survives_source_deletion() {
        let registry = OperatorRegistry::standard();
        let mut result = seed(&json!({"!": [true]}), "clip", &registry);

        let mut clipboard = Clipboard::new();
        clipboard.copy(&result.store, &result.root_id);
        result.store.replace_all(vec![]);

        let pasted = clipboard
            .paste(&mut result.store, None, &mut result.ids)
            .unwrap();
        assert_eq!(project(&result.store, &pasted), json!({"!": [true]}));
    }

    #[test]
    fn test_paste_twice_yields_distinct_ids() {
        let registry = OperatorRegistry::standard();
        let mut result = seed(&json!({"var": "x"}), "clip", &registry);

        let mut clipboard = Clipboard::new();
        clipboard.copy(&result.store, &result.root_id);

        let mut a = NodeStore::new();
        let first = clipboard.paste(&mut a, None, &mut result.ids).unwrap();
        let mut b = NodeStore::new();
        let second = clipboard.paste(&mut b, None, &mut result.ids).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_clipboard_paste_is_none() {
        let clipboard = Clipboard::new();
        let mut store = NodeStore::new();
        let mut ids = IdGenerator::new("clip");
        assert!(clipboard.paste(&mut store, None, &mut ids).is_none());
    }
}
