//! Subtree cloning with identifier remapping.
//!
//! Shared by duplicate and paste: both need a deep copy of a subtree under
//! fresh ids, with every internal reference rewritten to its counterpart.
//! References to nodes outside the cloned set are left untouched; the caller
//! decides how the copy attaches to the surrounding graph.

use rulecanvas_graph::{Cell, IdGenerator, Node, NodeKind, NodeStore};
use std::collections::HashMap;

/// A cloned subtree, detached from any store.
#[derive(Debug)]
pub struct ClonedSubtree {
    /// Copied nodes carrying their new ids
    pub nodes: Vec<Node>,
    /// Old id → new id, covering exactly the cloned set
    pub id_map: HashMap<String, String>,
    pub new_root_id: String,
}

/// Deep-copy the subtree rooted at `root_id` under fresh ids. Returns `None`
/// when the root is not in the store.
pub fn clone_subtree(
    store: &NodeStore,
    root_id: &str,
    ids: &mut IdGenerator,
) -> Option<ClonedSubtree> {
    let subtree = store.subtree_ids(root_id);
    if subtree.is_empty() {
        return None;
    }

    let mut id_map = HashMap::with_capacity(subtree.len());
    for old_id in &subtree {
        id_map.insert(old_id.clone(), ids.new_id());
    }

    let mut nodes = Vec::with_capacity(subtree.len());
    for old_id in &subtree {
        let mut node = store.get(old_id)?.clone();
        node.id = id_map[old_id].clone();
        if let Some(parent_id) = &node.parent_id {
            if let Some(new_parent) = id_map.get(parent_id) {
                node.parent_id = Some(new_parent.clone());
            }
        }
        remap_child_refs(&mut node, &id_map);
        nodes.push(node);
    }

    Some(ClonedSubtree {
        new_root_id: id_map[root_id].clone(),
        nodes,
        id_map,
    })
}

fn remap_child_refs(node: &mut Node, id_map: &HashMap<String, String>) {
    match &mut node.kind {
        NodeKind::Operator { cells, .. } => {
            for cell in cells.iter_mut() {
                if let Cell::Branch {
                    node: Some(child_id),
                    ..
                } = cell
                {
                    if let Some(new_id) = id_map.get(child_id) {
                        *child_id = new_id.clone();
                    }
                }
            }
        }
        NodeKind::Structure { elements, .. } => {
            for element in elements.iter_mut() {
                if let rulecanvas_graph::ElementValue::Branch { node: child_id } =
                    &mut element.value
                {
                    if let Some(new_id) = id_map.get(child_id) {
                        *child_id = new_id.clone();
                    }
                }
            }
        }
        NodeKind::Literal { .. } | NodeKind::VarAccess { .. } => {}
    }
}
