//! Capability sets.
//!
//! Resolution sites ask "is this node protectable?" rather than matching on
//! variants, so a method can be named, typed, protectable and staticable at
//! once without a class hierarchy.

use bitflags::bitflags;

use crate::NodeKind;

bitflags! {
    /// Orthogonal interfaces a node kind may implement.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Exposes a symbol name; a lookup target.
        const NAMED = 1 << 0;
        /// Has a declared or inferred type.
        const TYPED = 1 << 1;
        /// Produces a value when lowered.
        const VALUED = 1 << 2;
        /// Carries a protection level.
        const PROTECTABLE = 1 << 3;
        /// May be declared static.
        const STATICABLE = 1 << 4;
        /// May carry generic parameters and an instance cache.
        const GENERIC = 1 << 5;
        /// Opens a lexical scope searched by name lookup.
        const SCOPE = 1 << 6;
    }
}

impl NodeKind {
    pub fn capabilities(&self) -> Capabilities {
        use Capabilities as C;
        match self {
            NodeKind::Root { .. } => C::NAMED | C::SCOPE,
            NodeKind::Block | NodeKind::Loop { .. } => C::SCOPE,
            NodeKind::Function(_) => C::NAMED | C::TYPED | C::VALUED | C::GENERIC | C::SCOPE,
            NodeKind::Method { .. } => {
                C::NAMED
                    | C::TYPED
                    | C::VALUED
                    | C::GENERIC
                    | C::SCOPE
                    | C::PROTECTABLE
                    | C::STATICABLE
            }
            NodeKind::Param { .. } | NodeKind::Var { .. } => C::NAMED | C::TYPED | C::VALUED,
            NodeKind::Class { .. } => C::NAMED | C::TYPED | C::GENERIC | C::SCOPE,
            NodeKind::MemberVar { .. } => C::NAMED | C::TYPED | C::VALUED | C::PROTECTABLE,
            NodeKind::Constructor { .. } => C::TYPED | C::VALUED | C::GENERIC,
            NodeKind::Return { .. } | NodeKind::Break | NodeKind::Continue => C::empty(),
            NodeKind::IntLit { .. }
            | NodeKind::FloatLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::Ident { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Deref { .. }
            | NodeKind::AddressOf { .. }
            | NodeKind::Member { .. }
            | NodeKind::Call { .. }
            | NodeKind::CtorCall { .. }
            | NodeKind::Storage => C::TYPED | C::VALUED,
        }
    }
}
