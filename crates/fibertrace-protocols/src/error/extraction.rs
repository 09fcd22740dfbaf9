//! Per-node read errors raised while extracting metadata from the host tree.

use thiserror::Error;

use crate::node::{HookRef, NodeRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Field `{field}` of node {node} is unreadable")]
    Unreadable { node: NodeRef, field: &'static str },

    #[error("Node {0} is no longer readable")]
    Detached(NodeRef),

    #[error("Hook list of node {node} is corrupt at {hook:?}")]
    CorruptHookList { node: NodeRef, hook: Option<HookRef> },

    #[error("Element type of node {0} is unavailable")]
    TypeUnavailable(NodeRef),

    #[error("Native handle search exceeded {0} nodes")]
    SearchBudgetExceeded(usize),
}
