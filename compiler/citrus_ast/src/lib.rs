//! Syntax tree for the Citrus semantic middle-end.
//!
//! Nodes live in a single [`Ast`] arena and are addressed by [`NodeId`].
//! Ownership edges (parent/child) form a tree; dependency edges and resolved
//! references are plain ids, never owning, so no reference cycle can exist.
//!
//! # Contents
//!
//! - [`NodeId`], [`SourceLoc`]: stable node identity and source position
//! - [`NodeKind`]: the sum type over every node variant
//! - [`Capabilities`]: per-kind capability set (named, typed, generic, ...)
//! - [`Ast`]: the arena plus tree mutation (`add_child`, `remove_child`,
//!   `add_dependency`)
//! - [`CopyStack`]: nested copy contexts used by [`Ast::copy_subtree`]
//! - [`TypeExpr`]: unresolved type annotations carried by declarations

mod caps;
mod copy;
mod error;
mod id;
mod kind;
mod tree;
mod type_expr;

pub use caps::Capabilities;
pub use copy::{CopyContext, CopyStack};
pub use error::AstError;
pub use id::{FileId, NodeId, SourceLoc};
pub use kind::{BinaryOp, FnDecl, Generics, NodeKind, Protection};
pub use tree::{Ast, Node, NodeState, Position};
pub use type_expr::TypeExpr;
