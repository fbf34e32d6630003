//! # Rulecanvas Operator Registry
//!
//! Static metadata about the operators that may appear in a rule expression:
//! which category an operator belongs to (drives editor defaults and styling)
//! and how many operands it accepts.
//!
//! The registry is read-only. The mutation engine consults it to decide
//! whether an operator can grow another argument and to pick a sensible
//! default operand when one is added. Operators that are not registered are
//! treated as opaque: arity checks are skipped and they are never considered
//! extendable.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Operator category, used for grouping in the UI and for choosing
/// default operand values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorCategory {
    /// Data accessors (`var`, `val`, `exists`, `missing`)
    Accessor,
    /// Boolean connectives (`and`, `or`, `!`)
    Logic,
    /// Comparisons (`==`, `<`, `>=`, ...)
    Comparison,
    /// Numeric operators (`+`, `-`, `min`, ...)
    Arithmetic,
    /// String operators (`cat`, `substr`, `in`)
    String,
    /// Branching operators (`if`, `?:`)
    Decision,
    /// Array operators (`map`, `filter`, `merge`, ...)
    Array,
    /// Operator is not in the registry
    Unknown,
}

impl OperatorCategory {
    /// Default literal operand synthesized when an argument is added to an
    /// operator of this category.
    pub fn default_literal(&self) -> Value {
        match self {
            OperatorCategory::Logic | OperatorCategory::Decision => json!(true),
            OperatorCategory::String => json!("text"),
            _ => json!(0),
        }
    }
}

/// Declared shape of an operator's operand count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Arity {
    /// Exactly `count` operands
    Fixed { count: usize },
    /// Between `min` and `max` operands (`max: None` = unbounded)
    Variadic { min: usize, max: Option<usize> },
    /// Condition/then pairs with an optional trailing else
    /// (`min`/`max` bound the total slot count)
    Pairs { min: usize, max: Option<usize> },
}

impl Arity {
    /// Smallest legal operand count.
    pub fn min_slots(&self) -> usize {
        match self {
            Arity::Fixed { count } => *count,
            Arity::Variadic { min, .. } | Arity::Pairs { min, .. } => *min,
        }
    }

    /// Largest legal operand count, `None` if unbounded.
    pub fn max_slots(&self) -> Option<usize> {
        match self {
            Arity::Fixed { count } => Some(*count),
            Arity::Variadic { max, .. } | Arity::Pairs { max, .. } => *max,
        }
    }

    /// Whether the operand list may grow at all.
    pub fn is_extendable(&self) -> bool {
        matches!(self, Arity::Variadic { .. } | Arity::Pairs { .. })
    }

    /// Whether operands are managed as condition/then pairs.
    pub fn is_paired(&self) -> bool {
        matches!(self, Arity::Pairs { .. })
    }
}

/// Metadata for one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    pub category: OperatorCategory,
    pub arity: Arity,
}

/// Lookup table from operator name to its metadata.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    ops: HashMap<String, OperatorDef>,
}

impl OperatorRegistry {
    /// Empty registry (every operator is opaque).
    pub fn empty() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    /// Registry seeded with the standard JsonLogic-style operator set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        let fixed = |count| Arity::Fixed { count };
        let variadic = |min, max| Arity::Variadic { min, max };

        // Accessors
        registry.register("var", OperatorCategory::Accessor, variadic(1, Some(2)));
        registry.register("val", OperatorCategory::Accessor, variadic(1, None));
        registry.register("exists", OperatorCategory::Accessor, variadic(1, None));
        registry.register("missing", OperatorCategory::Accessor, variadic(1, None));

        // Decision
        registry.register(
            "if",
            OperatorCategory::Decision,
            Arity::Pairs { min: 2, max: None },
        );
        registry.register(
            "?:",
            OperatorCategory::Decision,
            Arity::Pairs {
                min: 3,
                max: Some(3),
            },
        );

        // Logic
        registry.register("and", OperatorCategory::Logic, variadic(2, None));
        registry.register("or", OperatorCategory::Logic, variadic(2, None));
        registry.register("!", OperatorCategory::Logic, fixed(1));
        registry.register("!!", OperatorCategory::Logic, fixed(1));

        // Comparison
        registry.register("==", OperatorCategory::Comparison, fixed(2));
        registry.register("===", OperatorCategory::Comparison, fixed(2));
        registry.register("!=", OperatorCategory::Comparison, fixed(2));
        registry.register("!==", OperatorCategory::Comparison, fixed(2));
        registry.register("<", OperatorCategory::Comparison, variadic(2, Some(3)));
        registry.register("<=", OperatorCategory::Comparison, variadic(2, Some(3)));
        registry.register(">", OperatorCategory::Comparison, variadic(2, Some(3)));
        registry.register(">=", OperatorCategory::Comparison, variadic(2, Some(3)));

        // Arithmetic
        registry.register("+", OperatorCategory::Arithmetic, variadic(1, None));
        registry.register("*", OperatorCategory::Arithmetic, variadic(1, None));
        registry.register("-", OperatorCategory::Arithmetic, variadic(1, Some(2)));
        registry.register("/", OperatorCategory::Arithmetic, fixed(2));
        registry.register("%", OperatorCategory::Arithmetic, fixed(2));
        registry.register("min", OperatorCategory::Arithmetic, variadic(1, None));
        registry.register("max", OperatorCategory::Arithmetic, variadic(1, None));

        // String
        registry.register("cat", OperatorCategory::String, variadic(1, None));
        registry.register("substr", OperatorCategory::String, variadic(2, Some(3)));
        registry.register("in", OperatorCategory::String, fixed(2));

        // Array
        registry.register("merge", OperatorCategory::Array, variadic(1, None));
        registry.register("map", OperatorCategory::Array, fixed(2));
        registry.register("filter", OperatorCategory::Array, fixed(2));
        registry.register("reduce", OperatorCategory::Array, fixed(3));
        registry.register("all", OperatorCategory::Array, fixed(2));
        registry.register("some", OperatorCategory::Array, fixed(2));
        registry.register("none", OperatorCategory::Array, fixed(2));

        registry
    }

    /// Register (or replace) an operator definition.
    pub fn register(&mut self, name: &str, category: OperatorCategory, arity: Arity) {
        self.ops
            .insert(name.to_string(), OperatorDef { category, arity });
    }

    /// Look up an operator's metadata. `None` for unregistered names.
    pub fn get(&self, name: &str) -> Option<&OperatorDef> {
        self.ops.get(name)
    }

    /// Category for an operator, `Unknown` if not registered.
    pub fn category(&self, name: &str) -> OperatorCategory {
        self.get(name)
            .map(|def| def.category)
            .unwrap_or(OperatorCategory::Unknown)
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_lookup() {
        let registry = OperatorRegistry::standard();

        let plus = registry.get("+").unwrap();
        assert_eq!(plus.category, OperatorCategory::Arithmetic);
        assert_eq!(plus.arity.min_slots(), 1);
        assert_eq!(plus.arity.max_slots(), None);
        assert!(plus.arity.is_extendable());

        let eq = registry.get("==").unwrap();
        assert_eq!(eq.arity, Arity::Fixed { count: 2 });
        assert!(!eq.arity.is_extendable());
    }

    #[test]
    fn test_unknown_operator_is_opaque() {
        let registry = OperatorRegistry::standard();
        assert!(registry.get("frobnicate").is_none());
        assert_eq!(registry.category("frobnicate"), OperatorCategory::Unknown);
    }

    #[test]
    fn test_decision_operators_are_paired() {
        let registry = OperatorRegistry::standard();

        let if_op = registry.get("if").unwrap();
        assert_eq!(if_op.category, OperatorCategory::Decision);
        assert!(if_op.arity.is_paired());
        assert!(if_op.arity.is_extendable());
        assert_eq!(if_op.arity.min_slots(), 2);

        // Ternary is a decision operator but cannot grow past 3 slots
        let ternary = registry.get("?:").unwrap();
        assert_eq!(ternary.arity.max_slots(), Some(3));
    }

    #[test]
    fn test_default_literals_by_category() {
        assert_eq!(OperatorCategory::Arithmetic.default_literal(), json!(0));
        assert_eq!(OperatorCategory::Comparison.default_literal(), json!(0));
        assert_eq!(OperatorCategory::Logic.default_literal(), json!(true));
        assert_eq!(OperatorCategory::Decision.default_literal(), json!(true));
        assert_eq!(OperatorCategory::String.default_literal(), json!("text"));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = OperatorRegistry::empty();
        registry.register("+", OperatorCategory::Arithmetic, Arity::Fixed { count: 2 });
        registry.register(
            "+",
            OperatorCategory::Arithmetic,
            Arity::Variadic { min: 1, max: None },
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.get("+").unwrap().arity.is_extendable());
    }
}
