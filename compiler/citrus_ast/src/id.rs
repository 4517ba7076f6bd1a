//! Node identity and source positions.

use std::fmt;

/// Index of a node in the [`Ast`](crate::Ast) arena.
///
/// Ids are stable for the lifetime of the arena: nodes are never moved or
/// reused, so an id held in a cache or a dependency list stays meaningful
/// even after the tree around it changes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node". Passing it where a node is required is an
    /// invalid argument.
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "NodeId::NONE")
        } else {
            write!(f, "n{}", self.0)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Identifier of a source file, assigned by the driver.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct FileId(pub u32);

/// A position in source text. Line and column are 1-based; `0` means
/// "synthesized, no source position".
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SourceLoc {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    /// Location for compiler-synthesized nodes.
    pub const SYNTHESIZED: Self = Self {
        file: FileId(0),
        line: 0,
        column: 0,
    };

    pub const fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    pub const fn is_synthesized(self) -> bool {
        self.line == 0
    }
}
