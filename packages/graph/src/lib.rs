//! # Rulecanvas Graph
//!
//! Node-graph data model for the visual rule editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ seed: canonical expression → node tree      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ graph: NodeStore + invariants               │
//! │  - Typed nodes (literal/accessor/operator/  │
//! │    structure) with ordered slots            │
//! │  - Integrity checking                       │
//! │  - Derived views (edges, trace resolution)  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ project: node tree → canonical expression   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The store is the source of truth**: expressions, edges, and trace
//!    highlights are derived views
//! 2. **Cached projections**: every node carries its canonical expression,
//!    re-established synchronously after each mutation
//! 3. **Value semantics**: mutations produce new store values; snapshots are
//!    unaffected by later edits

mod error;
mod id_generator;
mod node;
mod project;
mod seed;
mod store;
mod trace;

pub use error::GraphError;
pub use id_generator::{get_store_id, IdGenerator};
pub use node::{
    decision_roles, AccessPath, AccessorOp, BranchRole, Cell, ElementValue, LiteralType, Node,
    NodeKind, StructureElement, StructureKind,
};
pub use project::{project, project_shallow, refresh_from, refresh_subtree};
pub use seed::{seed, SeedResult};
pub use store::{Edge, NodeStore};
pub use trace::{resolve_steps, ExecutionStep, ResolvedStep};

// Re-export the registry types most graph consumers need
pub use rulecanvas_registry::{Arity, OperatorCategory, OperatorDef, OperatorRegistry};
