//! Call and constructor-call resolution.
//!
//! Arguments resolve before the callee: their types form the call shape
//! (`fn(args...) -> ?`) a generic callee is specialized against.

use citrus_ast::{Capabilities, NodeId, NodeKind, NodeState};
use citrus_diagnostic::SemaError;
use citrus_types::Idx;

use crate::module::{CallInfo, Resolve};
use crate::{Module, Query};

fn is_class(ast: &citrus_ast::Ast, id: NodeId) -> bool {
    matches!(ast.kind(id), NodeKind::Class { .. })
}

impl Module {
    pub(super) fn resolve_call(&mut self, id: NodeId) -> Resolve {
        let NodeKind::Call { callee, args } = self.ast.kind(id) else {
            return Ok(());
        };
        let (callee, args) = (*callee, args.clone());

        let arg_tys = self.argument_types(&args)?;
        let shape = self.pool.function(&arg_tys, Idx::INFER, false);
        self.resolve_expecting(callee, Some(shape))?;

        let target = match self.ast.kind(callee) {
            NodeKind::Ident { target, .. } | NodeKind::Member { target, .. } => *target,
            _ => None,
        };
        if let Some(target) = target {
            let caps = self.ast.capabilities(target);
            if !caps.contains(Capabilities::TYPED | Capabilities::VALUED) {
                return Err(self
                    .code_error(callee, format!("{} is not callable", self.describe(target)))
                    .into());
            }
        }

        let callee_ty = self.type_of(callee)?;
        let fn_ty = self.pool.strip_pointers(callee_ty);
        if !self.pool.is_function_ty(fn_ty) {
            return Err(self
                .code_error(
                    callee,
                    format!(
                        "can not call non-function type {}",
                        self.pool.get_string(callee_ty)
                    ),
                )
                .into());
        }

        // `obj.method(...)` passes the object address as `this`.
        let receiver = match self.ast.kind(callee) {
            NodeKind::Member {
                object,
                target: Some(target),
                ..
            } if matches!(
                self.ast.kind(*target),
                NodeKind::Method {
                    is_static: false,
                    ..
                }
            ) =>
            {
                Some(*object)
            }
            _ => None,
        };
        let skip = usize::from(receiver.is_some());
        self.check_arguments(id, fn_ty, skip, &args, &arg_tys)?;

        let direct = target.filter(|&t| {
            matches!(
                self.ast.kind(t),
                NodeKind::Function(_) | NodeKind::Method { .. }
            )
        });
        let ret = self.pool.fn_ret(fn_ty).unwrap_or(Idx::VOID);
        self.set_ty(id, ret);
        self.calls.insert(
            id,
            CallInfo {
                fn_ty,
                target: direct,
                receiver,
            },
        );
        Ok(())
    }

    /// `Name(args)`: pick a constructor of the named class, specializing it
    /// for generic classes, and type the hidden storage argument.
    pub(super) fn resolve_ctor_call(&mut self, id: NodeId) -> Resolve {
        let NodeKind::CtorCall {
            name,
            args,
            storage: Some(storage),
            ..
        } = self.ast.kind(id)
        else {
            return Err(SemaError::fatal("constructor call without storage").into());
        };
        let (name, storage) = (name.clone(), *storage);
        let user_args: Vec<NodeId> = args.iter().copied().filter(|&a| a != storage).collect();

        let arg_tys = self.argument_types(&user_args)?;
        let query = Query::new(&name).filtered(&is_class);
        let Some(class) = self.lookup(&query, Some(id))? else {
            return Err(self.undefined(&name, id).into());
        };

        let class_ty = self.class_type(class);
        let template_this = self.pool.pointer_to(class_ty);
        let mut params = vec![template_this];
        params.extend_from_slice(&arg_tys);
        let shape = self.pool.function(&params, Idx::INFER, false);

        // Constructors declared by the class itself, not specialized copies.
        let candidates: Vec<NodeId> = self
            .ast
            .children(class)
            .iter()
            .copied()
            .filter(|&c| {
                matches!(
                    self.ast.kind(c),
                    NodeKind::Constructor {
                        instance_of: None,
                        ..
                    }
                )
            })
            .collect();
        let mut chosen = None;
        for ctor in candidates {
            let sig = self.signature(ctor)?;
            let arity = self.pool.fn_params(sig).len();
            let fits = if self.pool.fn_is_variadic(sig) {
                params.len() >= arity
            } else {
                params.len() == arity
            };
            if fits {
                chosen = Some(ctor);
                break;
            }
        }
        let Some(mut ctor) = chosen else {
            return Err(self
                .code_error(
                    id,
                    format!(
                        "no constructor of `{name}` takes {} argument{}",
                        user_args.len(),
                        if user_args.len() == 1 { "" } else { "s" }
                    ),
                )
                .into());
        };
        if self.constructor_needs_instance(ctor) {
            ctor = self.instantiate_constructor(ctor, shape)?;
        }

        let sig = self.signature(ctor)?;
        self.check_arguments(id, sig, 1, &user_args, &arg_tys)?;
        let this = self.pool.fn_ret(sig).unwrap_or(template_this);

        self.set_ty(storage, this);
        self.ast.set_state(storage, NodeState::Resolved);
        if let NodeKind::CtorCall { target, .. } = self.ast.kind_mut(id) {
            *target = Some(ctor);
        }
        self.ast.add_dependency(id, ctor)?;
        self.set_ty(id, this);
        self.calls.insert(
            id,
            CallInfo {
                fn_ty: sig,
                target: Some(ctor),
                receiver: None,
            },
        );
        Ok(())
    }

    /// Resolve arguments in order; array types decay to element pointers.
    fn argument_types(&mut self, args: &[NodeId]) -> Resolve<Vec<Idx>> {
        let mut tys = Vec::with_capacity(args.len());
        for &arg in args {
            self.resolve_node(arg)?;
            let ty = self.type_of(arg)?;
            tys.push(self.decay(ty));
        }
        Ok(tys)
    }

    /// Arity and per-argument convertibility against `fn_ty`, whose first
    /// `skip` parameters are supplied implicitly.
    fn check_arguments(
        &mut self,
        call: NodeId,
        fn_ty: Idx,
        skip: usize,
        args: &[NodeId],
        arg_tys: &[Idx],
    ) -> Resolve {
        let params: Vec<Idx> = self.pool.fn_params(fn_ty).iter().skip(skip).copied().collect();
        let variadic = self.pool.fn_is_variadic(fn_ty);
        let arity_ok = if variadic {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !arity_ok {
            return Err(self
                .code_error(
                    call,
                    format!(
                        "expected {}{} argument{}, got {}",
                        if variadic { "at least " } else { "" },
                        params.len(),
                        if params.len() == 1 { "" } else { "s" },
                        args.len()
                    ),
                )
                .into());
        }
        for ((&arg, &arg_ty), &param) in args.iter().zip(arg_tys).zip(&params) {
            if !self.pool.is_castable(arg_ty, param) {
                return Err(self
                    .code_error(
                        arg,
                        format!(
                            "can not pass {} as an argument of type {}",
                            self.pool.get_string(arg_ty),
                            self.pool.get_string(param)
                        ),
                    )
                    .into());
            }
        }
        Ok(())
    }
}
