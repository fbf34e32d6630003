//! # Expression Projector
//!
//! Pure computation of a node's canonical nested-expression value from its
//! own data and its children's projections. The cached `Node::expression` is
//! re-established through these functions at the end of every mutation.
//!
//! Two flavors exist on purpose:
//! - [`project`] recomputes the whole subtree from structure alone
//! - [`project_shallow`] computes one node from its children's *cached*
//!   expressions, which is what the incremental refresh after a mutation uses
//!
//! On a store satisfying the invariants the two agree everywhere.

use crate::node::{AccessPath, Cell, ElementValue, Node, NodeKind, StructureKind};
use crate::store::NodeStore;
use serde_json::{Map, Value};

/// Project `node` using the cached expressions of its direct children.
/// Cleared or dangling branch references project as `null`.
pub fn project_shallow(store: &NodeStore, node: &Node) -> Value {
    project_with(node, |child_id| {
        store
            .get(child_id)
            .map(|child| child.expression.clone())
            .unwrap_or(Value::Null)
    })
}

/// Fully recompute the projection of the subtree rooted at `id`.
pub fn project(store: &NodeStore, id: &str) -> Value {
    match store.get(id) {
        Some(node) => project_with(node, |child_id| project(store, child_id)),
        None => Value::Null,
    }
}

/// Shared projection shape; `child` resolves a branch reference to the
/// expression of the referenced node.
fn project_with<F>(node: &Node, mut child: F) -> Value
where
    F: FnMut(&str) -> Value,
{
    match &node.kind {
        NodeKind::Literal { value, .. } => value.clone(),

        NodeKind::VarAccess { op, path, default } => {
            let path_value = path.to_value();
            let operand = match default {
                None => path_value,
                Some(default) => Value::Array(vec![path_value, default.clone()]),
            };
            single_key(op.name(), operand)
        }

        NodeKind::Operator { name, cells, .. } => {
            let operands: Vec<Value> = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Inline { value } | Cell::Editable { value } => value.clone(),
                    Cell::Branch { node: Some(id), .. } => child(id),
                    Cell::Branch { node: None, .. } => Value::Null,
                })
                .collect();
            single_key(name, Value::Array(operands))
        }

        NodeKind::Structure { shape, elements } => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(match &element.value {
                    ElementValue::Inline { value } => value.clone(),
                    ElementValue::Branch { node } => child(node),
                });
            }
            match shape {
                StructureKind::Array => Value::Array(values),
                StructureKind::Object => {
                    let mut map = Map::new();
                    for (element, value) in elements.iter().zip(values) {
                        map.insert(element.key.clone().unwrap_or_default(), value);
                    }
                    Value::Object(map)
                }
            }
        }
    }
}

fn single_key(name: &str, operand: Value) -> Value {
    let mut map = Map::new();
    map.insert(name.to_string(), operand);
    Value::Object(map)
}

/// Recompute cached expressions from `id` up through its ancestors to the
/// root. Call after any edit that changed `id`'s own data or slot list.
pub fn refresh_from(store: &mut NodeStore, id: &str) {
    let mut current = Some(id.to_string());
    while let Some(node_id) = current {
        let Some(node) = store.get(&node_id) else {
            return;
        };
        let fresh = project_shallow(store, node);
        let parent = node.parent_id.clone();
        if let Some(node) = store.get_mut(&node_id) {
            node.expression = fresh;
        }
        current = parent;
    }
}

/// Recompute cached expressions of the whole subtree rooted at `id`,
/// children before parents. Used after seeding and pasting.
pub fn refresh_subtree(store: &mut NodeStore, id: &str) {
    let mut order = store.subtree_ids(id);
    order.reverse();
    for node_id in order {
        if let Some(node) = store.get(&node_id) {
            let fresh = project_shallow(store, node);
            if let Some(node) = store.get_mut(&node_id) {
                node.expression = fresh;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AccessorOp, BranchRole, StructureElement};
    use rulecanvas_registry::OperatorCategory;
    use serde_json::json;

    #[test]
    fn test_project_literal() {
        let mut store = NodeStore::new();
        store.insert(Node::literal("p-1", json!("hello")));
        assert_eq!(project(&store, "p-1"), json!("hello"));
    }

    #[test]
    fn test_project_var_access_forms() {
        let plain = Node::var_access("p-1", AccessorOp::Var, AccessPath::Dotted("a.b".into()));
        let store = NodeStore::from_nodes(vec![plain]);
        assert_eq!(project(&store, "p-1"), json!({"var": "a.b"}));

        let mut with_default =
            Node::var_access("p-2", AccessorOp::Var, AccessPath::Dotted("a.b".into()));
        if let NodeKind::VarAccess { default, .. } = &mut with_default.kind {
            *default = Some(json!(26));
        }
        let store = NodeStore::from_nodes(vec![with_default]);
        assert_eq!(project(&store, "p-2"), json!({"var": ["a.b", 26]}));

        let segments = Node::var_access(
            "p-3",
            AccessorOp::Val,
            AccessPath::Segments(vec![json!("user"), json!("name")]),
        );
        let store = NodeStore::from_nodes(vec![segments]);
        assert_eq!(project(&store, "p-3"), json!({"val": ["user", "name"]}));
    }

    #[test]
    fn test_project_operator_in_slot_order() {
        let mut store = NodeStore::new();
        store.insert(Node::operator(
            "p-1",
            "+",
            OperatorCategory::Arithmetic,
            vec![
                Cell::branch("p-2"),
                Cell::Inline { value: json!(10) },
                Cell::branch("p-3"),
            ],
        ));
        let mut left = Node::literal("p-2", json!(2));
        left.parent_id = Some("p-1".into());
        left.arg_index = Some(0);
        store.insert(left);
        let mut right = Node::literal("p-3", json!(3));
        right.parent_id = Some("p-1".into());
        right.arg_index = Some(1);
        store.insert(right);

        assert_eq!(project(&store, "p-1"), json!({"+": [2, 10, 3]}));
    }

    #[test]
    fn test_cleared_branch_projects_null() {
        let store = NodeStore::from_nodes(vec![Node::operator(
            "p-1",
            "?:",
            OperatorCategory::Decision,
            vec![
                Cell::Branch {
                    node: None,
                    role: BranchRole::Condition,
                    label: None,
                },
            ],
        )]);
        assert_eq!(project(&store, "p-1"), json!({"?:": [null]}));
    }

    #[test]
    fn test_project_structure_object_and_array() {
        let mut store = NodeStore::new();
        store.insert(Node::structure(
            "p-1",
            StructureKind::Object,
            vec![
                StructureElement {
                    key: Some("limit".into()),
                    value: ElementValue::Inline { value: json!(5) },
                },
                StructureElement {
                    key: Some("rule".into()),
                    value: ElementValue::Branch { node: "p-2".into() },
                },
            ],
        ));
        let mut child = Node::literal("p-2", json!(true));
        child.parent_id = Some("p-1".into());
        child.arg_index = Some(0);
        store.insert(child);

        assert_eq!(
            project(&store, "p-1"),
            json!({"limit": 5, "rule": true})
        );

        let array = NodeStore::from_nodes(vec![Node::structure(
            "a-1",
            StructureKind::Array,
            vec![
                StructureElement {
                    key: None,
                    value: ElementValue::Inline { value: json!(1) },
                },
                StructureElement {
                    key: None,
                    value: ElementValue::Inline { value: json!(2) },
                },
            ],
        )]);
        assert_eq!(project(&array, "a-1"), json!([1, 2]));
    }

    #[test]
    fn test_refresh_subtree_establishes_caches() {
        let mut store = NodeStore::new();
        store.insert(Node::operator(
            "p-1",
            "and",
            OperatorCategory::Logic,
            vec![Cell::branch("p-2"), Cell::branch("p-3")],
        ));
        let mut a = Node::literal("p-2", json!(true));
        a.parent_id = Some("p-1".into());
        a.arg_index = Some(0);
        store.insert(a);
        let mut b = Node::literal("p-3", json!(false));
        b.parent_id = Some("p-1".into());
        b.arg_index = Some(1);
        store.insert(b);

        refresh_subtree(&mut store, "p-1");
        assert_eq!(
            store.get("p-1").unwrap().expression,
            json!({"and": [true, false]})
        );
        assert_eq!(project(&store, "p-1"), store.get("p-1").unwrap().expression);
    }

    #[test]
    fn test_refresh_from_walks_to_root() {
        let mut store = NodeStore::new();
        store.insert(Node::operator(
            "p-1",
            "!",
            OperatorCategory::Logic,
            vec![Cell::branch("p-2")],
        ));
        let mut inner = Node::operator(
            "p-2",
            "and",
            OperatorCategory::Logic,
            vec![Cell::branch("p-3")],
        );
        inner.parent_id = Some("p-1".into());
        inner.arg_index = Some(0);
        store.insert(inner);
        let mut leaf = Node::literal("p-3", json!(true));
        leaf.parent_id = Some("p-2".into());
        leaf.arg_index = Some(0);
        store.insert(leaf);
        refresh_subtree(&mut store, "p-1");

        // Edit the leaf, then refresh from it
        if let NodeKind::Literal { value, .. } = &mut store.get_mut("p-3").unwrap().kind {
            *value = json!(false);
        }
        refresh_from(&mut store, "p-3");

        assert_eq!(
            store.get("p-1").unwrap().expression,
            json!({"!": [{"and": [false]}]})
        );
    }
}
