//! # Rulecanvas Editor
//!
//! Mutation engine and session state for the visual rule editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ EditSession                                 │
//! │  - store + registry + id generator          │
//! │  - snapshot history (undo/redo)             │
//! │  - clipboard + selection                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Mutation: validate → apply                  │
//! │  - add/remove argument, wrap, duplicate,    │
//! │    delete, slot and literal edits           │
//! │  - decision pairs handled as units          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ rulecanvas-graph: store, invariants,        │
//! │ projection refresh                          │
//! └─────────────────────────────────────────────┘
//! ```

mod clipboard;
mod clone;
mod errors;
mod mutations;
mod selection;
mod session;
mod undo_stack;

pub use clipboard::Clipboard;
pub use clone::{clone_subtree, ClonedSubtree};
pub use errors::EditorError;
pub use mutations::{Mutation, MutationError, MutationResult, NewNodeKind};
pub use selection::Selection;
pub use session::EditSession;
pub use undo_stack::UndoStack;
