//! Pipeline coordinator.
//!
//! Four phases run over every node reachable from the roots:
//!
//! 1. **initialize**: per-node setup (`this` injection, constructor
//!    synthesis, constructor-call storage)
//! 2. **find dependencies**: register edges on nodes that must resolve first
//! 3. **resolve**: dependency-ordered typing and validation, on demand
//! 4. **build**: lowering of concrete callables; templates are skipped
//!
//! Clones created by instantiation are prepared (phases 1 and 2) at once and
//! queued for phase 3. Resolution is idempotent per node, so a clone reached
//! both through the tree walk and through the queue resolves once.

mod calls;
mod init;
mod resolve;
mod types;

pub(crate) use resolve::common_type;

use citrus_ast::{NodeId, NodeKind, NodeState};
use citrus_diagnostic::SemaError;
use citrus_ir::IrBackend;
use citrus_types::Idx;

use crate::lower;
use crate::module::{Halt, Resolve};
use crate::Module;

impl Module {
    /// Resolve then build the whole unit. Nothing is built while any error
    /// is on record, including ones from an earlier [`resolve`](Self::resolve).
    pub fn compile(&mut self, backend: &mut dyn IrBackend) -> Result<(), Vec<SemaError>> {
        self.resolve()?;
        if !self.errors.is_empty() {
            return Err(self.errors.clone());
        }
        self.build(backend).map_err(|err| vec![err])
    }

    /// Run initialize, dependency discovery and resolution.
    ///
    /// Returns the errors found by this run. With `batch_errors` off, stops
    /// at the first one. Nodes that failed earlier stay failed without being
    /// reported again; [`errors`](Self::errors) keeps the whole history.
    pub fn resolve(&mut self) -> Result<(), Vec<SemaError>> {
        let reported = self.errors.len();
        let roots = self.ast.roots().to_vec();
        let outcome = self
            .initialize_phase(&roots)
            .and_then(|()| self.dependency_phase(&roots))
            .and_then(|()| self.resolve_phase(&roots));
        if let Err(err) = outcome {
            self.errors.push(err);
        }
        match self.errors.get(reported..) {
            Some(fresh) if !fresh.is_empty() => Err(fresh.to_vec()),
            _ => Ok(()),
        }
    }

    // === Phases ===

    #[tracing::instrument(level = "debug", skip_all)]
    fn initialize_phase(&mut self, roots: &[NodeId]) -> Result<(), SemaError> {
        for &root in roots {
            self.initialize_tree(root)?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn dependency_phase(&mut self, roots: &[NodeId]) -> Result<(), SemaError> {
        for &root in roots {
            self.find_dependencies_tree(root)?;
        }
        Ok(())
    }

    /// Resolve every root, then drain the instantiation queue. Only an
    /// aborting error is returned; the rest are collected in `errors`.
    #[tracing::instrument(level = "debug", skip_all)]
    fn resolve_phase(&mut self, roots: &[NodeId]) -> Result<(), SemaError> {
        for &root in roots {
            match self.resolve_node(root) {
                Ok(()) | Err(Halt::Failed) => {}
                Err(Halt::Error(err) | Halt::Abort(err)) => return Err(err),
            }
        }
        while let Some(clone) = self.queue.pop_front() {
            tracing::debug!(?clone, "resolving queued instance");
            match self.resolve_node(clone) {
                Ok(()) | Err(Halt::Failed) => {}
                Err(Halt::Error(err) | Halt::Abort(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Lower every concrete callable. Any failure here is fatal.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(&mut self, backend: &mut dyn IrBackend) -> Result<(), SemaError> {
        let roots = self.ast.roots().to_vec();
        for root in roots {
            self.build_tree(root, backend)?;
        }
        Ok(())
    }

    // === Phase walks ===

    /// Initialize and register dependencies for a freshly attached subtree.
    pub(crate) fn prepare(&mut self, root: NodeId) -> Result<(), SemaError> {
        self.initialize_tree(root)?;
        self.find_dependencies_tree(root)
    }

    fn initialize_tree(&mut self, root: NodeId) -> Result<(), SemaError> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.ast.state(id) == NodeState::Uninitialized {
                self.initialize(id)?;
                self.ast.set_state(id, NodeState::Initialized);
            }
            // Children are read after initialize, which may add some.
            stack.extend(self.ast.children(id).iter().rev().copied());
        }
        Ok(())
    }

    fn find_dependencies_tree(&mut self, root: NodeId) -> Result<(), SemaError> {
        for id in self.ast.subtree(root) {
            if self.ast.state(id) == NodeState::Initialized {
                self.find_dependencies(id)?;
                self.ast.set_state(id, NodeState::DependenciesFound);
            }
        }
        Ok(())
    }

    // === Resolve ===

    pub(crate) fn resolve_node(&mut self, id: NodeId) -> Resolve {
        self.resolve_expecting(id, None)
    }

    /// Resolve `id` and everything it depends on. `expected` is the call
    /// shape when `id` is a callee.
    pub(crate) fn resolve_expecting(&mut self, id: NodeId, expected: Option<Idx>) -> Resolve {
        match self.ast.state(id) {
            NodeState::Resolved | NodeState::Built => return Ok(()),
            NodeState::Failed => return Err(Halt::Failed),
            NodeState::Resolving => {
                let err = SemaError::fatal(format!(
                    "dependency cycle through {} ({id:?})",
                    self.describe(id)
                ));
                return Err(Halt::Abort(err));
            }
            NodeState::Uninitialized | NodeState::Initialized => self.prepare(id)?,
            NodeState::DependenciesFound => {}
        }
        if self.in_template(id) {
            return Ok(());
        }

        self.ast.set_state(id, NodeState::Resolving);
        match self.resolve_inner(id, expected) {
            Ok(()) => {
                self.ast.set_state(id, NodeState::Resolved);
                Ok(())
            }
            Err(Halt::Failed) => {
                self.ast.set_state(id, NodeState::Failed);
                Err(Halt::Failed)
            }
            Err(Halt::Error(err)) => {
                self.ast.set_state(id, NodeState::Failed);
                Err(self.report(err))
            }
            Err(Halt::Abort(err)) => {
                self.ast.set_state(id, NodeState::Failed);
                Err(Halt::Abort(err))
            }
        }
    }

    /// Record a node's error. Fatal errors, and any error when batching is
    /// off, abort the unit.
    pub(crate) fn report(&mut self, err: SemaError) -> Halt {
        if err.is_fatal() || !self.options.batch_errors {
            return Halt::Abort(err);
        }
        tracing::debug!(code = err.error_code(), %err, "semantic error");
        self.errors.push(err);
        Halt::Failed
    }

    fn resolve_inner(&mut self, id: NodeId, expected: Option<Idx>) -> Resolve {
        // A callee resolves against the call shape, once the arguments have.
        let callee = match self.ast.kind(id) {
            NodeKind::Call { callee, .. } => Some(*callee),
            _ => None,
        };
        let deps = self.ast.dependencies(id).to_vec();
        for dep in deps.into_iter().filter(|&dep| Some(dep) != callee) {
            self.resolve_dependency(dep)?;
        }

        match self.ast.kind(id) {
            NodeKind::Root { .. } | NodeKind::Block | NodeKind::Class { .. } => {
                self.resolve_children(id, true)?;
                if matches!(self.ast.kind(id), NodeKind::Class { .. }) {
                    self.class_type(id);
                }
                Ok(())
            }
            NodeKind::Function(_) | NodeKind::Method { .. } => self.resolve_function(id),
            NodeKind::Constructor { .. } => self.signature(id).map(drop),
            NodeKind::Call { .. } => self.resolve_call(id),
            NodeKind::CtorCall { .. } => self.resolve_ctor_call(id),
            NodeKind::Ident { .. } => self.resolve_ident(id, expected),
            NodeKind::Member { object, .. } => {
                let object = *object;
                self.resolve_node(object)?;
                self.resolve_member(id, expected)
            }
            NodeKind::Loop { .. } => {
                self.resolve_children(id, false)?;
                self.resolve_loop(id)
            }
            _ => {
                self.resolve_children(id, false)?;
                self.resolve_kind(id)
            }
        }
    }

    /// Resolve children in order, re-reading the list as instantiation may
    /// insert siblings. Scopes keep going past a failed child so independent
    /// statements still report their own errors.
    fn resolve_children(&mut self, id: NodeId, keep_going: bool) -> Resolve {
        let mut failed = false;
        let mut i = 0;
        while let Some(&child) = self.ast.children(id).get(i) {
            match self.resolve_node(child) {
                Ok(()) => {}
                Err(Halt::Failed) if keep_going => failed = true,
                Err(halt) => return Err(halt),
            }
            i += 1;
        }
        if failed {
            Err(Halt::Failed)
        } else {
            Ok(())
        }
    }

    /// Make `dep` usable by a dependent: declarations only need their
    /// signature, anything else resolves fully.
    pub(crate) fn resolve_dependency(&mut self, dep: NodeId) -> Resolve {
        match self.ast.kind(dep) {
            NodeKind::Function(_)
            | NodeKind::Method { .. }
            | NodeKind::Class { .. }
            | NodeKind::Constructor { .. }
            | NodeKind::Param { .. }
            | NodeKind::MemberVar { .. } => self.signature(dep).map(drop),
            _ => self.resolve_node(dep),
        }
    }

    /// Type of a node a dependent is about to use.
    pub(crate) fn type_of(&mut self, id: NodeId) -> Resolve<Idx> {
        self.resolve_dependency(id)?;
        match self.types.get(&id) {
            Some(&ty) => Ok(ty),
            None => Err(Halt::Error(SemaError::fatal(format!(
                "{} has no type after resolution",
                self.describe(id)
            )))),
        }
    }

    // === Build ===

    fn build_tree(&mut self, id: NodeId, backend: &mut dyn IrBackend) -> Result<(), SemaError> {
        if self.in_template(id) {
            return Ok(());
        }
        match self.ast.kind(id) {
            NodeKind::Root { .. } | NodeKind::Class { .. } => {
                let children = self.ast.children(id).to_vec();
                for child in children {
                    self.build_tree(child, backend)?;
                }
                Ok(())
            }
            NodeKind::Function(_) | NodeKind::Method { .. } | NodeKind::Constructor { .. } => {
                match self.ast.state(id) {
                    NodeState::Built => return Ok(()),
                    NodeState::Resolved => {}
                    _ => {
                        return Err(SemaError::fatal(format!(
                            "{} reached build without being resolved",
                            self.describe(id)
                        )));
                    }
                }
                lower::lower_callable(self, backend, id)?;
                self.ast.set_state(id, NodeState::Built);
                Ok(())
            }
            NodeKind::Var { name, .. } => Err(SemaError::fatal(format!(
                "top-level variable `{name}` has no storage in the backend"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests;
