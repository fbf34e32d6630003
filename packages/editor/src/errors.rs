//! Error types for the editor

use crate::mutations::MutationError;
use rulecanvas_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}
