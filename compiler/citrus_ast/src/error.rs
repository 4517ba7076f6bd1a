//! Node model errors.

use thiserror::Error;

use crate::NodeId;

/// Contract violations raised by tree mutation and the copy protocol.
///
/// None of these are expected from well-formed input; the semantic layer
/// reports them as fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AstError {
    /// A tree operation was handed a missing node, a node that already has
    /// an owner, or an edge that would make the ownership relation cyclic.
    #[error("invalid argument to {op}: {reason} ({node:?})")]
    InvalidArgument {
        op: &'static str,
        reason: &'static str,
        node: NodeId,
    },

    /// `end_copy` or `copy_subtree` was called with no copy context open.
    #[error("copy context stack underflow")]
    CopyContextUnderflow,
}

impl AstError {
    pub(crate) fn invalid(op: &'static str, reason: &'static str, node: NodeId) -> Self {
        Self::InvalidArgument { op, reason, node }
    }
}
