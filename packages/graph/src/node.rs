use rulecanvas_registry::OperatorCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type tag of a literal node (kept alongside the value so the UI
/// can offer the right input widget even for `null`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralType {
    String,
    Number,
    Boolean,
    Null,
}

impl LiteralType {
    /// Infer the tag from a JSON value. Composite values are not legal
    /// literals; they fall back to `Null`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => LiteralType::String,
            Value::Number(_) => LiteralType::Number,
            Value::Bool(_) => LiteralType::Boolean,
            _ => LiteralType::Null,
        }
    }
}

/// Accessor flavor of a variable-access node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorOp {
    Var,
    Val,
    Exists,
}

impl AccessorOp {
    pub fn name(&self) -> &'static str {
        match self {
            AccessorOp::Var => "var",
            AccessorOp::Val => "val",
            AccessorOp::Exists => "exists",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "var" => Some(AccessorOp::Var),
            "val" => Some(AccessorOp::Val),
            "exists" => Some(AccessorOp::Exists),
            _ => None,
        }
    }
}

/// Path of a variable-access node: dot-notation string or ordered segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessPath {
    Dotted(String),
    Segments(Vec<Value>),
}

impl AccessPath {
    /// Path as a JSON value, in the shape the canonical format expects.
    pub fn to_value(&self) -> Value {
        match self {
            AccessPath::Dotted(path) => Value::String(path.clone()),
            AccessPath::Segments(segments) => Value::Array(segments.clone()),
        }
    }
}

/// Sub-role of a branch cell. `Arg` for plain operands; the decision roles
/// drive pair handling on `if`/`?:` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchRole {
    Arg,
    Condition,
    Then,
    Else,
}

/// One slot ("cell") on an operator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Cell {
    /// Literal operand embedded directly; no child node exists for it
    Inline { value: Value },

    /// Editable scalar field backed by the property panel
    Editable { value: Value },

    /// Reference to a child node. `node: None` is a cleared mandatory
    /// branch awaiting a replacement; it projects as `null`.
    Branch {
        node: Option<String>,
        role: BranchRole,
        label: Option<String>,
    },
}

impl Cell {
    /// Plain branch cell referencing `node_id`.
    pub fn branch(node_id: impl Into<String>) -> Self {
        Cell::Branch {
            node: Some(node_id.into()),
            role: BranchRole::Arg,
            label: None,
        }
    }

    /// Branch cell with a decision role and display label.
    pub fn decision_branch(node_id: impl Into<String>, role: BranchRole) -> Self {
        Cell::Branch {
            node: Some(node_id.into()),
            role,
            label: None,
        }
    }

    /// Referenced child id, if this is a branch cell with a live reference.
    pub fn branch_id(&self) -> Option<&str> {
        match self {
            Cell::Branch { node, .. } => node.as_deref(),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Cell::Branch { .. })
    }

    pub fn role(&self) -> Option<BranchRole> {
        match self {
            Cell::Branch { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Whether a structure node projects to a JSON array or object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Array,
    Object,
}

/// Element value of a structure node: inline JSON or a child reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementValue {
    Inline { value: Value },
    Branch { node: String },
}

/// One element of a structure node. `key` is set for object structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureElement {
    pub key: Option<String>,
    pub value: ElementValue,
}

impl StructureElement {
    pub fn branch_id(&self) -> Option<&str> {
        match &self.value {
            ElementValue::Branch { node } => Some(node),
            ElementValue::Inline { .. } => None,
        }
    }
}

/// Kind-specific node data (closed set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Atomic JSON value
    Literal {
        value: Value,
        literal_type: LiteralType,
    },

    /// `var`/`val`/`exists` accessor; has no children
    VarAccess {
        op: AccessorOp,
        path: AccessPath,
        /// Default value (`var`) or scope-jump parameter
        default: Option<Value>,
    },

    /// N-ary operator application with ordered cells
    Operator {
        name: String,
        category: OperatorCategory,
        cells: Vec<Cell>,
    },

    /// Object or array template whose elements may be expressions
    Structure {
        shape: StructureKind,
        elements: Vec<StructureElement>,
    },
}

/// A node of the rule graph.
///
/// `expression` caches the node's canonical projection; the mutation engine
/// re-establishes it at the end of every edit that touches the subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,

    /// Owning parent, `None` for a tree root
    pub parent_id: Option<String>,

    /// Position among siblings (operand order), `None` for roots
    pub arg_index: Option<usize>,

    pub kind: NodeKind,

    /// Cached canonical expression
    pub expression: Value,

    /// Cached display text for the UI
    pub label: Option<String>,
}

impl Node {
    /// Detached literal node. Expression cache starts out consistent since a
    /// literal projects to its own value.
    pub fn literal(id: impl Into<String>, value: Value) -> Self {
        let literal_type = LiteralType::of(&value);
        let label = display_text_for_literal(&value);
        Self {
            id: id.into(),
            parent_id: None,
            arg_index: None,
            expression: value.clone(),
            kind: NodeKind::Literal {
                value,
                literal_type,
            },
            label: Some(label),
        }
    }

    /// Detached variable-access node. The expression cache is filled by the
    /// caller via a projection refresh.
    pub fn var_access(id: impl Into<String>, op: AccessorOp, path: AccessPath) -> Self {
        let label = match &path {
            AccessPath::Dotted(p) => format!("{} {}", op.name(), p),
            AccessPath::Segments(_) => op.name().to_string(),
        };
        Self {
            id: id.into(),
            parent_id: None,
            arg_index: None,
            kind: NodeKind::VarAccess {
                op,
                path,
                default: None,
            },
            expression: Value::Null,
            label: Some(label),
        }
    }

    /// Detached operator node with the given cells.
    pub fn operator(
        id: impl Into<String>,
        name: impl Into<String>,
        category: OperatorCategory,
        cells: Vec<Cell>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            parent_id: None,
            arg_index: None,
            label: Some(name.clone()),
            kind: NodeKind::Operator {
                name,
                category,
                cells,
            },
            expression: Value::Null,
        }
    }

    /// Detached structure node.
    pub fn structure(
        id: impl Into<String>,
        shape: StructureKind,
        elements: Vec<StructureElement>,
    ) -> Self {
        let label = match shape {
            StructureKind::Array => "array",
            StructureKind::Object => "object",
        };
        Self {
            id: id.into(),
            parent_id: None,
            arg_index: None,
            kind: NodeKind::Structure { shape, elements },
            expression: Value::Null,
            label: Some(label.to_string()),
        }
    }

    /// Ids referenced by this node's slots, in slot order. Cleared branches
    /// are skipped.
    pub fn child_refs(&self) -> Vec<&str> {
        match &self.kind {
            NodeKind::Operator { cells, .. } => {
                cells.iter().filter_map(|c| c.branch_id()).collect()
            }
            NodeKind::Structure { elements, .. } => {
                elements.iter().filter_map(|e| e.branch_id()).collect()
            }
            NodeKind::Literal { .. } | NodeKind::VarAccess { .. } => Vec::new(),
        }
    }

    /// Whether this node is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Operator name, if this is an operator node.
    pub fn operator_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Operator { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this is a decision-style operator (`if`/`?:`).
    pub fn is_decision(&self) -> bool {
        matches!(
            &self.kind,
            NodeKind::Operator {
                category: OperatorCategory::Decision,
                ..
            }
        )
    }
}

/// Role and display label for each slot of a decision operator with
/// `slot_count` slots: condition/then pairs, with a trailing else when the
/// count is odd. The first condition is the primary "if"; later conditions
/// read as "else if".
pub fn decision_roles(slot_count: usize) -> Vec<(BranchRole, &'static str)> {
    let has_else = slot_count % 2 == 1 && slot_count >= 3;
    let paired = if has_else { slot_count - 1 } else { slot_count };

    let mut roles = Vec::with_capacity(slot_count);
    for index in 0..paired {
        if index % 2 == 0 {
            let label = if index == 0 { "if" } else { "else if" };
            roles.push((BranchRole::Condition, label));
        } else {
            roles.push((BranchRole::Then, "then"));
        }
    }
    if has_else {
        roles.push((BranchRole::Else, "else"));
    }
    roles
}

fn display_text_for_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_type_inference() {
        assert_eq!(LiteralType::of(&json!("hi")), LiteralType::String);
        assert_eq!(LiteralType::of(&json!(3)), LiteralType::Number);
        assert_eq!(LiteralType::of(&json!(true)), LiteralType::Boolean);
        assert_eq!(LiteralType::of(&Value::Null), LiteralType::Null);
    }

    #[test]
    fn test_literal_node_expression_is_consistent() {
        let node = Node::literal("n-1", json!(42));
        assert_eq!(node.expression, json!(42));
        assert!(node.is_root());
        assert_eq!(node.label.as_deref(), Some("42"));
    }

    #[test]
    fn test_child_refs_skip_cleared_branches() {
        let node = Node::operator(
            "n-1",
            "+",
            OperatorCategory::Arithmetic,
            vec![
                Cell::branch("n-2"),
                Cell::Branch {
                    node: None,
                    role: BranchRole::Arg,
                    label: None,
                },
                Cell::Inline { value: json!(1) },
                Cell::branch("n-3"),
            ],
        );

        assert_eq!(node.child_refs(), vec!["n-2", "n-3"]);
    }

    #[test]
    fn test_node_serialization_roundtrip() {
        let node = Node::operator(
            "abc-1",
            "and",
            OperatorCategory::Logic,
            vec![Cell::branch("abc-2"), Cell::branch("abc-3")],
        );

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn test_decision_roles_with_trailing_else() {
        let roles = decision_roles(5);
        assert_eq!(
            roles,
            vec![
                (BranchRole::Condition, "if"),
                (BranchRole::Then, "then"),
                (BranchRole::Condition, "else if"),
                (BranchRole::Then, "then"),
                (BranchRole::Else, "else"),
            ]
        );
    }

    #[test]
    fn test_decision_roles_without_else() {
        let roles = decision_roles(4);
        assert_eq!(roles.len(), 4);
        assert!(roles.iter().all(|(r, _)| *r != BranchRole::Else));
        assert_eq!(roles[2], (BranchRole::Condition, "else if"));
    }

    #[test]
    fn test_access_path_value_shapes() {
        let dotted = AccessPath::Dotted("user.name".to_string());
        assert_eq!(dotted.to_value(), json!("user.name"));

        let segments = AccessPath::Segments(vec![json!("user"), json!("name")]);
        assert_eq!(segments.to_value(), json!(["user", "name"]));
    }
}
