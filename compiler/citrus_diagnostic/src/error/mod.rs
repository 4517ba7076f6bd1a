//! Error taxonomy for resolution and lowering.

use citrus_ast::{AstError, NodeId, SourceLoc};
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

/// A semantic failure.
///
/// `Code`, `AccessDenied` and `Undefined` fail the compilation unit but let
/// independent nodes keep resolving. `Fatal` is a compiler contract violation
/// and aborts at once.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SemaError {
    /// Ill-formed code: type or arity mismatch, calling a non-function,
    /// dereferencing a non-pointer, bad loop condition.
    #[error("{message}")]
    Code {
        nodes: SmallVec<[NodeId; 2]>,
        message: String,
        loc: SourceLoc,
    },

    /// A declaration exists but its protection level hides it from the
    /// requesting scope.
    #[error("{what} is not accessible from this scope")]
    AccessDenied {
        target: NodeId,
        from: NodeId,
        what: String,
        loc: SourceLoc,
    },

    /// No declaration matched a lookup.
    #[error("undefined symbol `{name}`")]
    Undefined {
        name: String,
        node: NodeId,
        loc: SourceLoc,
    },

    /// Internal invariant broken.
    #[error("internal compiler error: {message}")]
    Fatal { message: String },
}

impl SemaError {
    pub fn code(node: NodeId, loc: SourceLoc, message: impl Into<String>) -> Self {
        SemaError::Code {
            nodes: smallvec![node],
            message: message.into(),
            loc,
        }
    }

    /// A code error blaming two nodes, e.g. both sides of a mismatch.
    pub fn code2(a: NodeId, b: NodeId, loc: SourceLoc, message: impl Into<String>) -> Self {
        SemaError::Code {
            nodes: smallvec![a, b],
            message: message.into(),
            loc,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        SemaError::Fatal {
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SemaError::Fatal { .. })
    }

    /// Stable code for searchability.
    pub const fn error_code(&self) -> &'static str {
        match self {
            SemaError::Code { .. } => "E3001",
            SemaError::AccessDenied { .. } => "E3002",
            SemaError::Undefined { .. } => "E3003",
            SemaError::Fatal { .. } => "E9001",
        }
    }

    /// Source position, if the error has one.
    pub fn loc(&self) -> Option<SourceLoc> {
        match self {
            SemaError::Code { loc, .. }
            | SemaError::AccessDenied { loc, .. }
            | SemaError::Undefined { loc, .. } => Some(*loc),
            SemaError::Fatal { .. } => None,
        }
    }

    /// Offending nodes, most relevant first.
    pub fn nodes(&self) -> SmallVec<[NodeId; 2]> {
        match self {
            SemaError::Code { nodes, .. } => nodes.clone(),
            SemaError::AccessDenied { target, from, .. } => smallvec![*from, *target],
            SemaError::Undefined { node, .. } => smallvec![*node],
            SemaError::Fatal { .. } => SmallVec::new(),
        }
    }
}

impl From<AstError> for SemaError {
    fn from(err: AstError) -> Self {
        SemaError::Fatal {
            message: err.to_string(),
        }
    }
}
