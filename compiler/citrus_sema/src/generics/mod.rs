//! Generic instantiation.
//!
//! A template is specialized by cloning its subtree, rewriting every
//! annotation that names one of its parameters, and attaching the clone
//! right after the template. Each `(template, type arguments)` pair is
//! cloned at most once; the clone is prepared at once and queued for
//! resolution.
//!
//! Constructors of generic classes combine two instantiations: the class is
//! specialized from the argument types, then the user-written constructor
//! method inside the clone is specialized in turn when it has its own
//! parameters. Both copies run inside one outer copy context so the method's
//! clone can be found from the template method.

mod unify;

use citrus_ast::{NodeId, NodeKind, Position, TypeExpr};
use citrus_diagnostic::SemaError;
use citrus_types::Idx;
use rustc_hash::FxHashMap;

use crate::module::{Halt, InstanceKey, Resolve};
use crate::Module;

use unify::unify;

impl Module {
    /// Clone of `template` for the given type arguments, created on first
    /// request.
    pub fn create_instance(&mut self, template: NodeId, args: &[Idx]) -> Result<NodeId, SemaError> {
        let key: InstanceKey = args.iter().copied().collect();
        self.instantiate(template, &key).map_err(Halt::into_error)
    }

    pub(crate) fn instantiate(&mut self, template: NodeId, key: &InstanceKey) -> Resolve<NodeId> {
        let params = match self.ast.kind(template).generics() {
            Some(generics) if generics.is_template() => generics.params.clone(),
            _ => {
                return Err(self
                    .code_error(template, format!("{} is not generic", self.describe(template)))
                    .into());
            }
        };
        if params.len() != key.len() {
            return Err(self
                .code_error(
                    template,
                    format!(
                        "{} expects {} type argument{}, got {}",
                        self.describe(template),
                        params.len(),
                        if params.len() == 1 { "" } else { "s" },
                        key.len()
                    ),
                )
                .into());
        }
        if let Some(&clone) = self.instances.get(&template).and_then(|cache| cache.get(key)) {
            tracing::debug!(?template, ?clone, "instance cache hit");
            return Ok(clone);
        }

        let bindings: FxHashMap<String, Idx> =
            params.iter().cloned().zip(key.iter().copied()).collect();
        self.copies.begin_copy();
        let cloned = self.clone_template(template, &bindings);
        let closed = self.copies.end_copy();
        let clone = cloned?;
        closed?;

        if let Some(generics) = self.ast.kind_mut(clone).generics_mut() {
            generics.params.clear();
            generics.instance_of = Some(template);
        }
        if let NodeKind::Class { name, .. } = self.ast.kind_mut(clone) {
            let args: Vec<String> = key.iter().map(|&t| self.pool.get_string(t)).collect();
            *name = format!("{name}<{}>", args.join(", "));
        }

        self.instances
            .entry(template)
            .or_default()
            .insert(key.clone(), clone);
        tracing::debug!(?template, ?clone, key = ?key, "instantiated template");
        self.prepare(clone)?;
        self.queue.push_back(clone);
        Ok(clone)
    }

    /// Copy `template` next to itself and bind its parameters.
    fn clone_template(
        &mut self,
        template: NodeId,
        bindings: &FxHashMap<String, Idx>,
    ) -> Resolve<NodeId> {
        let Some(parent) = self.ast.parent(template) else {
            return Err(SemaError::fatal(format!(
                "{} has no enclosing scope to hold its instances",
                self.describe(template)
            ))
            .into());
        };
        let clone = self.ast.copy_subtree(template, &mut self.copies)?;
        let at = self.ast.index_in_parent(template).map_or(Position::Back, |i| Position::Index(i + 1));
        self.ast.add_child(parent, clone, at)?;
        for id in self.ast.subtree(clone) {
            self.ast
                .kind_mut(id)
                .type_exprs_mut(&mut |ty: &mut TypeExpr| {
                    ty.substitute(bindings);
                });
        }
        Ok(clone)
    }

    /// True if some instance of `template` accepts the call shape `expected`.
    pub(crate) fn accepts_shape(&mut self, template: NodeId, expected: Idx) -> Resolve<bool> {
        let sig = self.signature(template)?;
        let mut bindings = FxHashMap::default();
        Ok(unify(&self.pool, sig, expected, template.raw(), &mut bindings))
    }

    /// Specialize a generic function or method for a call shape.
    pub(crate) fn instantiate_for(&mut self, template: NodeId, expected: Idx) -> Resolve<NodeId> {
        let key = self.infer_key(template, template, expected)?;
        self.instantiate(template, &key)
    }

    /// Type arguments of `owner`'s parameters that make the signature of
    /// `callable` accept `expected`.
    fn infer_key(&mut self, owner: NodeId, callable: NodeId, expected: Idx) -> Resolve<InstanceKey> {
        let sig = self.signature(callable)?;
        let mut bindings = FxHashMap::default();
        if !unify(&self.pool, sig, expected, owner.raw(), &mut bindings) {
            return Err(self
                .code_error(
                    callable,
                    format!(
                        "no instance of {} matches {}",
                        self.describe(callable),
                        self.pool.get_string(expected)
                    ),
                )
                .into());
        }

        let params = self
            .ast
            .kind(owner)
            .generics()
            .map(|g| g.params.clone())
            .unwrap_or_default();
        let mut key = InstanceKey::new();
        for param in &params {
            let var = self.pool.type_var(param.as_str(), owner.raw());
            match bindings.get(&var) {
                Some(&ty) => key.push(ty),
                None => {
                    return Err(self
                        .code_error(
                            callable,
                            format!(
                                "can not infer type parameter `{param}` of {}",
                                self.describe(owner)
                            ),
                        )
                        .into());
                }
            }
        }
        Ok(key)
    }

    /// A constructor call must go through [`Module::instantiate_constructor`].
    pub(crate) fn constructor_needs_instance(&self, ctor: NodeId) -> bool {
        match self.ast.kind(ctor) {
            NodeKind::Constructor { class, .. } => {
                self.is_template(*class) || self.is_template(ctor)
            }
            _ => false,
        }
    }

    /// Concrete constructor for `shape`, `fn(Class*, args...) -> ?`, from a
    /// constructor of a generic class or one wrapping a generic method.
    pub(crate) fn instantiate_constructor(&mut self, ctor: NodeId, shape: Idx) -> Resolve<NodeId> {
        let NodeKind::Constructor { class, method, .. } = *self.ast.kind(ctor) else {
            return Err(SemaError::fatal(format!("{} is not a constructor", self.describe(ctor))).into());
        };

        if !self.is_template(class) {
            let Some(method) = method else {
                return Ok(ctor);
            };
            let method_shape = self.method_shape(method, shape, None);
            let method_clone = self.instantiate_for(method, method_shape)?;
            return self.finish_constructor(ctor, class, method_clone);
        }

        let Some(method) = method else {
            return Err(SemaError::fatal(format!(
                "generic class {} can't use a default constructor",
                self.describe(class)
            ))
            .into());
        };
        let method_shape = self.method_shape(method, shape, None);
        let class_key = self.infer_key(class, method, method_shape)?;

        let ordinal = self.method_ordinal(class, method);
        self.copies.begin_copy();
        let found = self.specialize_class_for(class, &class_key, method, ordinal);
        let closed = self.copies.end_copy();
        let (class_clone, mut method_clone) = found?;
        closed?;

        if self.is_template(method_clone) {
            let method_shape = self.method_shape(method_clone, shape, Some(class_clone));
            method_clone = self.instantiate_for(method_clone, method_shape)?;
        }
        let instance = self.finish_constructor(ctor, class_clone, method_clone)?;

        let mut key = class_key;
        if let Some(template) = self.ast.kind(method_clone).generics().and_then(|g| g.instance_of) {
            if let Some((method_key, _)) = self
                .instances
                .get(&template)
                .and_then(|cache| cache.iter().find(|&(_, &c)| c == method_clone))
            {
                key.extend(method_key.iter().copied());
            }
        }
        self.instances.entry(ctor).or_default().insert(key, instance);
        Ok(instance)
    }

    /// Class instance plus the copy of `method` inside it.
    fn specialize_class_for(
        &mut self,
        class: NodeId,
        key: &InstanceKey,
        method: NodeId,
        ordinal: Option<usize>,
    ) -> Resolve<(NodeId, NodeId)> {
        let class_clone = self.instantiate(class, key)?;
        // A cached class was copied by an earlier call; fall back to the
        // method's position among the class's own methods.
        let method_clone = self.copies.get_copy(method).or_else(|| {
            ordinal.and_then(|n| self.declared_methods(class_clone).nth(n))
        });
        match method_clone {
            Some(clone) => Ok((class_clone, clone)),
            None => Err(SemaError::fatal(format!(
                "{} has no copy in {}",
                self.describe(method),
                self.describe(class_clone)
            ))
            .into()),
        }
    }

    fn finish_constructor(&mut self, template: NodeId, class: NodeId, method: NodeId) -> Resolve<NodeId> {
        let ctor = self.get_ctor_for_method(class, method)?;
        if let NodeKind::Constructor { instance_of, .. } = self.ast.kind_mut(ctor) {
            *instance_of = Some(template);
        }
        tracing::debug!(?template, ?ctor, "specialized constructor");
        Ok(ctor)
    }

    /// Call shape as seen by `method`: the receiver slot is dropped for
    /// static methods and retyped to `class` when given.
    fn method_shape(&mut self, method: NodeId, shape: Idx, class: Option<NodeId>) -> Idx {
        let is_static = matches!(self.ast.kind(method), NodeKind::Method { is_static: true, .. });
        let mut params: Vec<Idx> = self.pool.fn_params(shape).to_vec();
        if is_static {
            params.drain(..1.min(params.len()));
        } else if let (Some(class), Some(_)) = (class, params.first()) {
            let class_ty = self.class_type(class);
            params[0] = self.pool.pointer_to(class_ty);
        }
        self.pool.function(&params, Idx::INFER, false)
    }

    /// Methods written in `class`, excluding instances added later.
    fn declared_methods(&self, class: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.ast.children(class).iter().copied().filter(|&m| {
            matches!(self.ast.kind(m), NodeKind::Method { decl, .. } if !decl.generics.is_instance())
        })
    }

    fn method_ordinal(&self, class: NodeId, method: NodeId) -> Option<usize> {
        self.declared_methods(class).position(|m| m == method)
    }
}

#[cfg(test)]
mod tests;
