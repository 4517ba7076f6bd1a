//! The per-unit context threaded through every phase.

use std::collections::VecDeque;

use citrus_ast::{Ast, AstError, CopyStack, NodeId, NodeKind, SourceLoc};
use citrus_diagnostic::SemaError;
use citrus_ir::ValueId;
use citrus_types::{Idx, Pool};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{SemaOptions, Searcher};

/// Concrete type arguments of one instantiation, in generic parameter order.
pub(crate) type InstanceKey = SmallVec<[Idx; 2]>;

/// How a resolved call reaches its target.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CallInfo {
    /// Callee function type after unwrapping pointers.
    pub fn_ty: Idx,
    /// Declaration called by symbol, when statically known.
    pub target: Option<NodeId>,
    /// Object whose address is passed as the leading `this` argument.
    pub receiver: Option<NodeId>,
}

/// Why resolution of a node stopped.
#[derive(Debug)]
pub(crate) enum Halt {
    /// The node or something it depends on failed and was already reported.
    Failed,
    /// This node's own error, not reported yet.
    Error(SemaError),
    /// Stop the whole unit.
    Abort(SemaError),
}

impl Halt {
    /// Collapse into a single error for public entry points.
    pub(crate) fn into_error(self) -> SemaError {
        match self {
            Halt::Failed => SemaError::fatal("lookup reached a declaration that failed to resolve"),
            Halt::Error(err) | Halt::Abort(err) => err,
        }
    }
}

impl From<SemaError> for Halt {
    fn from(err: SemaError) -> Self {
        Halt::Error(err)
    }
}

impl From<AstError> for Halt {
    fn from(err: AstError) -> Self {
        Halt::Error(err.into())
    }
}

pub(crate) type Resolve<T = ()> = Result<T, Halt>;

/// Compilation-unit context.
///
/// Created once per unit and dropped when lowering completes. Holds every
/// piece of shared mutable state; nothing lives in globals.
pub struct Module {
    pub ast: Ast,
    pub pool: Pool,
    pub options: SemaOptions,
    pub(crate) copies: CopyStack,
    /// Template to (type arguments to clone).
    pub(crate) instances: FxHashMap<NodeId, FxHashMap<InstanceKey, NodeId>>,
    /// Clones waiting to be resolved.
    pub(crate) queue: VecDeque<NodeId>,
    pub(crate) types: FxHashMap<NodeId, Idx>,
    pub(crate) searcher: Searcher,
    pub(crate) errors: Vec<SemaError>,
    pub(crate) calls: FxHashMap<NodeId, CallInfo>,
    /// Backend value produced by each lowered expression.
    pub(crate) lowered: FxHashMap<NodeId, ValueId>,
}

impl Module {
    pub fn new(ast: Ast) -> Self {
        Self::with_options(ast, SemaOptions::default())
    }

    pub fn with_options(ast: Ast, options: SemaOptions) -> Self {
        Self {
            ast,
            pool: Pool::new(),
            options,
            copies: CopyStack::new(),
            instances: FxHashMap::default(),
            queue: VecDeque::new(),
            types: FxHashMap::default(),
            searcher: Searcher::new(),
            errors: Vec::new(),
            calls: FxHashMap::default(),
            lowered: FxHashMap::default(),
        }
    }

    // === Queries ===

    /// Resolved type of a node.
    pub fn ty(&self, id: NodeId) -> Option<Idx> {
        self.types.get(&id).copied()
    }

    /// Every clone created from `template`, oldest first.
    pub fn instances_of(&self, template: NodeId) -> Vec<NodeId> {
        let mut clones: Vec<NodeId> = self
            .instances
            .get(&template)
            .map(|cache| cache.values().copied().collect())
            .unwrap_or_default();
        clones.sort_unstable();
        clones
    }

    pub fn instance_count(&self, template: NodeId) -> usize {
        self.instances.get(&template).map_or(0, FxHashMap::len)
    }

    /// Backend value produced for an expression by the last build.
    pub fn lowered_value(&self, id: NodeId) -> Option<ValueId> {
        self.lowered.get(&id).copied()
    }

    /// Every error collected so far, across resolve runs.
    pub fn errors(&self) -> &[SemaError] {
        &self.errors
    }

    /// Number of open copy contexts. Zero between operations.
    pub fn copy_depth(&self) -> usize {
        self.copies.depth()
    }

    // === Internal helpers ===

    pub(crate) fn set_ty(&mut self, id: NodeId, ty: Idx) {
        self.types.insert(id, ty);
    }

    pub(crate) fn loc(&self, id: NodeId) -> SourceLoc {
        self.ast.loc(id)
    }

    pub(crate) fn code_error(&self, node: NodeId, message: impl Into<String>) -> SemaError {
        SemaError::code(node, self.loc(node), message)
    }

    pub(crate) fn undefined(&self, name: &str, node: NodeId) -> SemaError {
        SemaError::Undefined {
            name: name.to_owned(),
            node,
            loc: self.loc(node),
        }
    }

    /// Name for diagnostics: the declared name, or the variant label.
    pub(crate) fn describe(&self, id: NodeId) -> String {
        let kind = self.ast.kind(id);
        match kind.name() {
            Some(name) => format!("{} `{name}`", kind.label()),
            None => kind.label().to_owned(),
        }
    }

    /// Node carries unbound generic parameters of its own. A constructor
    /// wrapping a generic method counts as one.
    pub(crate) fn is_template(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Constructor {
                method: Some(method),
                ..
            } => self.is_template(*method),
            kind => kind.generics().is_some_and(citrus_ast::Generics::is_template),
        }
    }

    /// Node is a template or lies inside one.
    pub(crate) fn in_template(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if self.is_template(node) {
                return true;
            }
            cur = self.ast.parent(node);
        }
        false
    }

    /// Node was produced by instantiation.
    pub(crate) fn is_instance(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Constructor { instance_of, .. } => instance_of.is_some(),
            kind => kind.generics().is_some_and(citrus_ast::Generics::is_instance),
        }
    }

    /// Template a clone was made from, or the node itself.
    pub(crate) fn origin(&self, id: NodeId) -> NodeId {
        self.ast
            .kind(id)
            .generics()
            .and_then(|g| g.instance_of)
            .unwrap_or(id)
    }

    pub(crate) fn enclosing_class(&mut self, id: NodeId) -> Option<NodeId> {
        self.searcher
            .find_parent(&self.ast, id, |kind| matches!(kind, NodeKind::Class { .. }))
    }

    /// Nearest function, method or constructor around `id`.
    pub(crate) fn enclosing_callable(&mut self, id: NodeId) -> Option<NodeId> {
        self.searcher.find_parent(&self.ast, id, |kind| {
            matches!(
                kind,
                NodeKind::Function(_) | NodeKind::Method { .. } | NodeKind::Constructor { .. }
            )
        })
    }
}
