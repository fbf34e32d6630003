//! # Expression Seeding
//!
//! Builds a node tree from a canonical-format expression value. This is the
//! reverse of the projector: operator applications become operator nodes
//! with child nodes per operand, accessors become variable-access nodes,
//! multi-key objects and arrays become structure nodes, and everything else
//! becomes a literal.
//!
//! The seeded store always satisfies the store invariants, and
//! `project(seed(expr)) == expr` for expressions already in canonical form
//! (single-operand sugar like `{"!": true}` is normalized to the array
//! form on the way in).

use crate::id_generator::IdGenerator;
use crate::node::{
    decision_roles, AccessPath, AccessorOp, BranchRole, Cell, ElementValue, Node, NodeKind,
    StructureElement, StructureKind,
};
use crate::project::refresh_subtree;
use crate::store::NodeStore;
use rulecanvas_registry::OperatorRegistry;
use serde_json::Value;

/// A freshly seeded store plus the generator to keep minting ids with.
#[derive(Debug)]
pub struct SeedResult {
    pub store: NodeStore,
    pub root_id: String,
    pub ids: IdGenerator,
}

/// Seed a store from `expr`. `name` seeds the id generator, so two stores
/// seeded under different names never share identifiers.
pub fn seed(expr: &Value, name: &str, registry: &OperatorRegistry) -> SeedResult {
    let mut builder = Builder {
        store: NodeStore::new(),
        ids: IdGenerator::new(name),
        registry,
    };

    let root_id = builder.build(expr);
    let mut store = builder.store;
    refresh_subtree(&mut store, &root_id);

    SeedResult {
        store,
        root_id,
        ids: builder.ids,
    }
}

struct Builder<'a> {
    store: NodeStore,
    ids: IdGenerator,
    registry: &'a OperatorRegistry,
}

impl Builder<'_> {
    /// Build a node for `value` and return its id. The node is inserted
    /// detached; the caller wires parent and index.
    fn build(&mut self, value: &Value) -> String {
        match value {
            Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((name, operand)) => {
                    if let Some(op) = AccessorOp::from_name(name) {
                        if let Some(node) = self.try_var_access(op, operand) {
                            let id = node.id.clone();
                            self.store.insert(node);
                            return id;
                        }
                    }
                    self.build_operator(name, operand)
                }
                None => self.build_structure(StructureKind::Object, Vec::new()),
            },
            Value::Object(map) => {
                let entries: Vec<(Option<String>, &Value)> = map
                    .iter()
                    .map(|(k, v)| (Some(k.clone()), v))
                    .collect();
                self.build_structure(StructureKind::Object, entries)
            }
            Value::Array(items) => {
                let entries: Vec<(Option<String>, &Value)> =
                    items.iter().map(|v| (None, v)).collect();
                self.build_structure(StructureKind::Array, entries)
            }
            scalar => {
                let node = Node::literal(self.ids.new_id(), scalar.clone());
                let id = node.id.clone();
                self.store.insert(node);
                id
            }
        }
    }

    /// Variable access in one of its canonical shapes, or `None` if the
    /// operand doesn't fit (then the accessor is built as a plain operator).
    fn try_var_access(&mut self, op: AccessorOp, operand: &Value) -> Option<Node> {
        match (op, operand) {
            (_, Value::String(path)) => Some(Node::var_access(
                self.ids.new_id(),
                op,
                AccessPath::Dotted(path.clone()),
            )),
            (AccessorOp::Var, Value::Array(items)) => {
                // ["path", default]
                let path = items.first()?.as_str()?;
                if items.len() > 2 {
                    return None;
                }
                let mut node = Node::var_access(
                    self.ids.new_id(),
                    op,
                    AccessPath::Dotted(path.to_string()),
                );
                if let NodeKind::VarAccess { default, .. } = &mut node.kind {
                    *default = items.get(1).cloned();
                }
                Some(node)
            }
            (AccessorOp::Val | AccessorOp::Exists, Value::Array(items)) => {
                if items.iter().any(|v| v.is_object() || v.is_array()) {
                    return None;
                }
                Some(Node::var_access(
                    self.ids.new_id(),
                    op,
                    AccessPath::Segments(items.clone()),
                ))
            }
            _ => None,
        }
    }

    fn build_operator(&mut self, name: &str, operand: &Value) -> String {
        // Normalize single-operand sugar to the array form
        let operands: Vec<&Value> = match operand {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };

        let child_ids: Vec<String> = operands.iter().map(|v| self.build(v)).collect();

        let category = self.registry.category(name);
        let id = self.ids.new_id();

        let mut cells: Vec<Cell> = child_ids.iter().map(|id| Cell::branch(id.clone())).collect();
        if self.registry.get(name).is_some_and(|d| d.arity.is_paired()) {
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

        let node = Node::operator(id.clone(), name, category, cells);
        self.store.insert(node);

        for (index, child_id) in child_ids.iter().enumerate() {
            if let Some(child) = self.store.get_mut(child_id) {
                child.parent_id = Some(id.clone());
                child.arg_index = Some(index);
            }
        }

        id
    }

    fn build_structure(
        &mut self,
        shape: StructureKind,
        entries: Vec<(Option<String>, &Value)>,
    ) -> String {
        let mut elements = Vec::with_capacity(entries.len());
        let mut child_ids = Vec::new();

        for (key, value) in entries {
            let element_value = if value.is_object() || value.is_array() {
                let child_id = self.build(value);
                child_ids.push(child_id.clone());
                ElementValue::Branch { node: child_id }
            } else {
                ElementValue::Inline {
                    value: value.clone(),
                }
            };
            elements.push(StructureElement {
                key,
                value: element_value,
            });
        }

        let id = self.ids.new_id();
        let node = Node::structure(id.clone(), shape, elements);
        self.store.insert(node);

        for (index, child_id) in child_ids.iter().enumerate() {
            if let Some(child) = self.store.get_mut(child_id) {
                child.parent_id = Some(id.clone());
                child.arg_index = Some(index);
            }
        }

        id
    }
}
