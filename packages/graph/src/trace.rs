//! Execution-trace adapter for the step debugger.
//!
//! The external evaluator emits an ordered list of steps, each naming the
//! expression-tree node it evaluated. The playback UI is out of scope; this
//! module only provides the stable mapping from trace identifiers to live
//! store nodes so the UI can highlight them.

use crate::node::Node;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of an execution trace, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Identifier of the evaluated node
    pub node_id: String,

    /// Value the evaluator produced for this node, if it recorded one
    pub value: Option<Value>,
}

/// A trace step resolved against the live store. Steps whose node no longer
/// exists resolve with `node: None` rather than being dropped, so playback
/// indices stay aligned with the original trace.
#[derive(Debug, Clone)]
pub struct ResolvedStep<'a> {
    pub step: &'a ExecutionStep,
    pub node: Option<&'a Node>,
}

/// Resolve every step against the store.
pub fn resolve_steps<'a>(store: &'a NodeStore, steps: &'a [ExecutionStep]) -> Vec<ResolvedStep<'a>> {
    steps
        .iter()
        .map(|step| ResolvedStep {
            step,
            node: store.get(&step.node_id),
        })
        .collect()
}
