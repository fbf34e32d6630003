//! Error types for the graph crate

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Store integrity violated: {0}")]
    Integrity(String),
}
