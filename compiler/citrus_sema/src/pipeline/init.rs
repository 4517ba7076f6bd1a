//! Initialize and dependency discovery, including the class model.
//!
//! Both steps only touch the node itself and nodes it creates, so they are
//! safe to rerun on a clone whose template was already initialized: every
//! synthesis here checks for its own earlier output first.

use citrus_ast::{NodeId, NodeKind, Position, SourceLoc, TypeExpr};
use citrus_diagnostic::SemaError;

use crate::Module;

impl Module {
    pub(super) fn initialize(&mut self, id: NodeId) -> Result<(), SemaError> {
        match self.ast.kind(id) {
            NodeKind::Method {
                is_static: false, ..
            } => self.inject_this(id),
            NodeKind::Class { .. } => self.synthesize_constructors(id),
            NodeKind::CtorCall { storage: None, .. } => self.attach_storage(id),
            _ => Ok(()),
        }
    }

    pub(super) fn find_dependencies(&mut self, id: NodeId) -> Result<(), SemaError> {
        let deps: Vec<NodeId> = match self.ast.kind(id) {
            NodeKind::Constructor {
                method: Some(method),
                ..
            } => vec![*method],
            NodeKind::Var {
                init: Some(init), ..
            } => vec![*init],
            NodeKind::Member { object, .. } => vec![*object],
            NodeKind::Call { callee, .. } => vec![*callee],
            NodeKind::Return { value: Some(value) } => vec![*value],
            _ => Vec::new(),
        };
        for dep in deps {
            self.ast.add_dependency(id, dep)?;
        }
        Ok(())
    }

    /// Give a non-static method its leading `this: Class*` parameter.
    fn inject_this(&mut self, method: NodeId) -> Result<(), SemaError> {
        let Some(class) = self
            .ast
            .parent(method)
            .filter(|&p| matches!(self.ast.kind(p), NodeKind::Class { .. }))
        else {
            return Err(SemaError::fatal(format!(
                "{} is not owned by a class",
                self.describe(method)
            )));
        };
        let first = self.ast.kind(method).fn_decl().and_then(|d| d.params.first().copied());
        if first.is_some_and(|p| self.ast.name(p) == Some("this")) {
            return Ok(());
        }

        let this = self.ast.alloc(
            NodeKind::Param {
                name: "this".to_owned(),
                ty: TypeExpr::pointer(TypeExpr::Decl(class)),
            },
            self.loc(method),
        );
        self.ast.add_child(method, this, Position::Front)?;
        if let Some(decl) = self.ast.kind_mut(method).fn_decl_mut() {
            decl.params.insert(0, this);
        }
        Ok(())
    }

    /// One constructor per method named like the class, or an implicit
    /// default constructor when there is none.
    fn synthesize_constructors(&mut self, class: NodeId) -> Result<(), SemaError> {
        let base = self.class_base_name(class);
        let members = self.ast.children(class).to_vec();
        let ctor_methods: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&m| {
                matches!(self.ast.kind(m), NodeKind::Method { decl, .. } if decl.name == base)
            })
            .collect();

        if ctor_methods.is_empty() {
            let has_default = members.iter().any(|&m| {
                matches!(self.ast.kind(m), NodeKind::Constructor { method: None, .. })
            });
            if !has_default {
                let ctor = self.ast.alloc(
                    NodeKind::Constructor {
                        class,
                        method: None,
                        instance_of: None,
                    },
                    SourceLoc::SYNTHESIZED,
                );
                self.ast.add_child(class, ctor, Position::Back)?;
            }
            return Ok(());
        }

        for method in ctor_methods {
            self.constructor_node(class, method)?;
        }
        Ok(())
    }

    /// Existing constructor of `class` wrapping `method`, or a new detached
    /// one attached at the end of the class. The flag is `true` if created.
    pub(crate) fn constructor_node(
        &mut self,
        class: NodeId,
        method: NodeId,
    ) -> Result<(NodeId, bool), SemaError> {
        let existing = self.ast.children(class).iter().copied().find(|&c| {
            matches!(self.ast.kind(c), NodeKind::Constructor { method: Some(m), .. } if *m == method)
        });
        if let Some(ctor) = existing {
            return Ok((ctor, false));
        }
        let ctor = self.ast.alloc(
            NodeKind::Constructor {
                class,
                method: Some(method),
                instance_of: None,
            },
            self.loc(method),
        );
        self.ast.add_child(class, ctor, Position::Back)?;
        Ok((ctor, true))
    }

    /// Constructor for `method` on `class`, created and queued if missing.
    pub fn get_ctor_for_method(&mut self, class: NodeId, method: NodeId) -> Result<NodeId, SemaError> {
        let (ctor, created) = self.constructor_node(class, method)?;
        if created {
            self.prepare(ctor)?;
            self.queue.push_back(ctor);
        }
        Ok(ctor)
    }

    /// Name constructor methods must carry: the template's name for
    /// instances, whose own name includes type arguments.
    pub(crate) fn class_base_name(&self, class: NodeId) -> String {
        let origin = self.origin(class);
        self.ast.name(origin).unwrap_or_default().to_owned()
    }

    /// Prepend the hidden storage argument of a constructor call.
    fn attach_storage(&mut self, call: NodeId) -> Result<(), SemaError> {
        let storage = self.ast.alloc(NodeKind::Storage, self.loc(call));
        self.ast.add_child(call, storage, Position::Front)?;
        if let NodeKind::CtorCall {
            args,
            storage: slot,
            ..
        } = self.ast.kind_mut(call)
        {
            args.insert(0, storage);
            *slot = Some(storage);
        }
        Ok(())
    }
}
