//! Type annotations and declaration signatures.

use citrus_ast::{NodeId, NodeKind, TypeExpr};
use citrus_diagnostic::SemaError;
use citrus_types::Idx;

use crate::module::{Halt, InstanceKey, Resolve};
use crate::{Module, Query};

/// Built-in type names.
pub(crate) fn primitive(name: &str) -> Option<Idx> {
    Some(match name {
        "void" => Idx::VOID,
        "bool" => Idx::BOOL,
        "int8" => Idx::INT8,
        "int16" => Idx::INT16,
        "int32" | "int" => Idx::INT32,
        "int64" => Idx::INT64,
        "uint8" => Idx::UINT8,
        "uint16" => Idx::UINT16,
        "uint32" | "uint" => Idx::UINT32,
        "uint64" => Idx::UINT64,
        "float" => Idx::FLOAT,
        "double" => Idx::DOUBLE,
        _ => return None,
    })
}

fn is_class(ast: &citrus_ast::Ast, id: NodeId) -> bool {
    matches!(ast.kind(id), NodeKind::Class { .. })
}

impl Module {
    /// Interned type for an annotation written at `from`.
    ///
    /// Inside a template, names of its generic parameters become type
    /// variables owned by the template.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr, from: NodeId) -> Resolve<Idx> {
        match ty {
            TypeExpr::Concrete(idx) => Ok(*idx),
            TypeExpr::Pointer(inner) => {
                let inner = self.resolve_type(inner, from)?;
                Ok(self.pool.pointer_to(inner))
            }
            TypeExpr::Array(elem, len) => {
                let elem = self.resolve_type(elem, from)?;
                Ok(self.pool.array(elem, *len))
            }
            TypeExpr::Decl(decl) => self.signature(*decl),
            TypeExpr::Named(name) => {
                if let Some(idx) = primitive(name) {
                    return Ok(idx);
                }
                if let Some(owner) = self.type_param_owner(name, from) {
                    return Ok(self.pool.type_var(name.as_str(), owner.raw()));
                }
                let class = self.lookup_class(name, from)?;
                if self.is_template(class) {
                    return Err(self
                        .code_error(from, format!("generic class `{name}` needs type arguments"))
                        .into());
                }
                Ok(self.class_type(class))
            }
            TypeExpr::Applied(name, args) => {
                let mut key = InstanceKey::new();
                for arg in args {
                    key.push(self.resolve_type(arg, from)?);
                }
                let class = self.lookup_class(name, from)?;
                if !self.is_template(class) {
                    return Err(self
                        .code_error(from, format!("class `{name}` is not generic"))
                        .into());
                }
                // Still generic: we are inside a template, keep the placeholder.
                if key.iter().any(|&t| self.pool.is_generic(t)) {
                    return Ok(self.class_type(class));
                }
                let instance = self.instantiate(class, &key)?;
                Ok(self.class_type(instance))
            }
        }
    }

    /// Innermost enclosing node declaring generic parameter `name`.
    fn type_param_owner(&self, name: &str, from: NodeId) -> Option<NodeId> {
        let mut cur = Some(from);
        while let Some(node) = cur {
            let declares = self
                .ast
                .kind(node)
                .generics()
                .is_some_and(|g| g.params.iter().any(|p| p == name));
            if declares {
                return Some(node);
            }
            cur = self.ast.parent(node);
        }
        None
    }

    fn lookup_class(&mut self, name: &str, from: NodeId) -> Resolve<NodeId> {
        let query = Query::new(name).filtered(&is_class);
        match self.lookup(&query, Some(from))? {
            Some(class) => Ok(class),
            None => Err(self.undefined(name, from).into()),
        }
    }

    /// Named type of a class, interned on first use.
    pub(crate) fn class_type(&mut self, class: NodeId) -> Idx {
        if let Some(&ty) = self.types.get(&class) {
            return ty;
        }
        let name = self.ast.name(class).unwrap_or_default().to_owned();
        let ty = self.pool.named(name, class.raw());
        self.set_ty(class, ty);
        ty
    }

    /// Arrays passed by value decay to a pointer to their element.
    pub(crate) fn decay(&mut self, ty: Idx) -> Idx {
        match self.pool.base_ty(ty) {
            Some(elem) if self.pool.is_array_ty(ty) => self.pool.pointer_to(elem),
            _ => ty,
        }
    }

    /// Type of a declaration without resolving its body.
    ///
    /// Callables get their function type, classes their named type,
    /// parameters and fields their annotation. A failure is reported against
    /// the declaration itself, so dependents only see [`Halt::Failed`].
    pub(crate) fn signature(&mut self, id: NodeId) -> Resolve<Idx> {
        if let Some(&ty) = self.types.get(&id) {
            return Ok(ty);
        }
        if self.ast.state(id) == citrus_ast::NodeState::Failed {
            return Err(Halt::Failed);
        }
        match self.compute_signature(id) {
            Ok(ty) => {
                self.set_ty(id, ty);
                Ok(ty)
            }
            Err(Halt::Error(err)) => {
                self.ast.set_state(id, citrus_ast::NodeState::Failed);
                Err(self.report(err))
            }
            Err(halt) => Err(halt),
        }
    }

    fn compute_signature(&mut self, id: NodeId) -> Resolve<Idx> {
        match self.ast.kind(id).clone() {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => {
                let mut params = Vec::with_capacity(decl.params.len());
                for &param in &decl.params {
                    params.push(self.signature(param)?);
                }
                let ret = self.resolve_type(&decl.ret, id)?;
                Ok(self.pool.function(&params, ret, decl.variadic))
            }
            NodeKind::Class { .. } => Ok(self.class_type(id)),
            NodeKind::Constructor { class, method, .. } => {
                let class_ty = self.class_type(class);
                let this = self.pool.pointer_to(class_ty);
                let mut params = vec![this];
                let mut variadic = false;
                if let Some(method) = method {
                    let sig = self.signature(method)?;
                    let skip = usize::from(matches!(
                        self.ast.kind(method),
                        NodeKind::Method {
                            is_static: false,
                            ..
                        }
                    ));
                    params.extend(self.pool.fn_params(sig).iter().skip(skip).copied());
                    variadic = self.pool.fn_is_variadic(sig);
                }
                Ok(self.pool.function(&params, this, variadic))
            }
            NodeKind::Param { ty, .. } | NodeKind::MemberVar { ty, .. } => {
                self.resolve_type(&ty, id)
            }
            _ => {
                self.resolve_node(id)?;
                match self.types.get(&id) {
                    Some(&ty) => Ok(ty),
                    None => Err(SemaError::fatal(format!(
                        "{} has no signature",
                        self.describe(id)
                    ))
                    .into()),
                }
            }
        }
    }
}
