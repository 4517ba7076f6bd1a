//! Backend symbol names.
//!
//! Free functions keep their source name so they link against external
//! code, unless another function of the same name shares their scope.
//! Methods, constructors, overloads and generic instances are qualified by
//! their class and suffixed with their type signature, which keeps them
//! apart.

use citrus_ast::{NodeId, NodeKind};

use crate::Module;

impl Module {
    /// Symbol of a callable declaration.
    pub fn symbol(&self, id: NodeId) -> String {
        let (qualified, mangled) = match self.ast.kind(id) {
            NodeKind::Function(decl) => (
                decl.name.clone(),
                decl.generics.is_instance() || self.is_overloaded(id),
            ),
            NodeKind::Method { decl, .. } => {
                (format!("{}.{}", self.owner_name(id), decl.name), true)
            }
            NodeKind::Constructor { class, .. } => {
                let class = self.ast.name(*class).unwrap_or_default();
                (format!("{class}.new"), true)
            }
            kind => (kind.name().unwrap_or_default().to_owned(), false),
        };
        match self.ty(id) {
            Some(ty) if mangled && self.options.mangle_symbols => format!(
                "_C{}{qualified}{}",
                qualified.len(),
                self.pool.signature(ty)
            ),
            _ => qualified,
        }
    }

    /// Another concrete function in the same scope carries `id`'s name.
    fn is_overloaded(&self, id: NodeId) -> bool {
        let (Some(name), Some(scope)) = (self.ast.name(id), self.ast.parent(id)) else {
            return false;
        };
        self.ast.children(scope).iter().any(|&other| {
            other != id
                && matches!(self.ast.kind(other), NodeKind::Function(_))
                && self.ast.name(other) == Some(name)
                && !self.is_template(other)
                && !self.is_instance(other)
        })
    }

    fn owner_name(&self, id: NodeId) -> &str {
        self.ast
            .parent(id)
            .and_then(|class| self.ast.name(class))
            .unwrap_or_default()
    }
}
