//! Scoped symbol lookup.
//!
//! A lookup walks upward from the requesting node through every enclosing
//! scope and scans each scope's declarations in source order. Declarations
//! after the requester are hidden unless forward references are allowed or
//! the declaration is callable or a type (those are visible throughout their
//! scope). Matching a generic template with an expected type yields the
//! specialized clone instead.
//!
//! With an expected call shape, declarations sharing a name are ranked by
//! how well they accept it: an exact parameter match beats a generic
//! template, which beats one reached through argument conversion. The
//! innermost scope holding any acceptable overload wins. When nothing
//! accepts the shape, the innermost declaration by name is returned so the
//! call site can report the mismatch, unless the query demands a type match.
//!
//! Parent lookups go through [`Searcher`], a memo keyed by child. Generic
//! instantiation mutates the tree while lookups are in flight, so a cached
//! parent is checked against the live child list before it is trusted.

use citrus_ast::{Ast, Capabilities, NodeId, NodeKind};
use citrus_diagnostic::SemaError;
use citrus_types::Idx;
use rustc_hash::FxHashMap;

use crate::module::{Halt, Resolve};
use crate::Module;

// ── Parent cache ────────────────────────────────────────────────────

/// Memoized parent-path queries.
#[derive(Clone, Debug, Default)]
pub struct Searcher {
    parents: FxHashMap<NodeId, NodeId>,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent of `node`, revalidating any cached entry.
    pub fn get_parent(&mut self, ast: &Ast, node: NodeId) -> Option<NodeId> {
        if let Some(&cached) = self.parents.get(&node) {
            if ast.children(cached).contains(&node) {
                return Some(cached);
            }
            tracing::trace!(?node, ?cached, "dropping stale parent cache entry");
            self.parents.remove(&node);
        }
        let parent = ast.parent(node)?;
        self.parents.insert(node, parent);
        Some(parent)
    }

    /// First proper ancestor of `node` whose kind satisfies `pred`.
    pub fn find_parent(
        &mut self,
        ast: &Ast,
        node: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut cur = node;
        while let Some(parent) = self.get_parent(ast, cur) {
            if pred(ast.kind(parent)) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// First proper ancestor of `node` having every capability in `caps`.
    pub fn find_parent_with(
        &mut self,
        ast: &Ast,
        node: NodeId,
        caps: Capabilities,
    ) -> Option<NodeId> {
        self.find_parent(ast, node, |kind| kind.capabilities().contains(caps))
    }

    pub fn cached_len(&self) -> usize {
        self.parents.len()
    }
}

// ── Queries ─────────────────────────────────────────────────────────

/// Rank of a declaration against a call shape, worst first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ShapeMatch {
    Mismatch,
    /// Accepted once arguments are converted.
    Convertible,
    /// A template that can be specialized for the shape.
    Generic,
    Exact,
}

/// Predicate restricting which declarations a lookup may return.
pub type SearchFilter<'a> = &'a dyn Fn(&Ast, NodeId) -> bool;

/// A name lookup request.
#[derive(Clone, Copy)]
pub struct Query<'a> {
    pub name: &'a str,
    /// Type the match must specialize to, e.g. the call shape a generic
    /// callee must accept.
    pub expected: Option<Idx>,
    /// Let declarations after the requester match.
    pub forward_refs: bool,
    /// Never fall back to a declaration that does not accept `expected`.
    pub force_type_match: bool,
    pub filter: Option<SearchFilter<'a>>,
}

impl<'a> Query<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            expected: None,
            forward_refs: true,
            force_type_match: false,
            filter: None,
        }
    }

    #[must_use]
    pub fn expecting(mut self, ty: Idx) -> Self {
        self.expected = Some(ty);
        self
    }

    #[must_use]
    pub fn expecting_opt(mut self, ty: Option<Idx>) -> Self {
        self.expected = ty;
        self
    }

    /// Only declarations textually before the requester.
    #[must_use]
    pub fn before_use(mut self) -> Self {
        self.forward_refs = false;
        self
    }

    #[must_use]
    pub fn type_match_only(mut self) -> Self {
        self.force_type_match = true;
        self
    }

    #[must_use]
    pub fn filtered(mut self, filter: SearchFilter<'a>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Module {
    /// Nearest declaration matching `query`, searched from `from`, or from
    /// every root when `from` is `None`.
    pub fn find_node(
        &mut self,
        query: &Query<'_>,
        from: Option<NodeId>,
    ) -> Result<Option<NodeId>, SemaError> {
        self.lookup(query, from).map_err(Halt::into_error)
    }

    /// Parent of `node` through the memoized cache.
    pub fn get_parent(&mut self, node: NodeId) -> Option<NodeId> {
        self.searcher.get_parent(&self.ast, node)
    }

    pub(crate) fn lookup(
        &mut self,
        query: &Query<'_>,
        from: Option<NodeId>,
    ) -> Resolve<Option<NodeId>> {
        let mut fallback = None;
        if let Some(from) = from {
            let mut limit = from;
            while let Some(scope) = self.searcher.get_parent(&self.ast, limit) {
                tracing::trace!(name = query.name, ?scope, "searching scope");
                let decls = self.ast.children(scope).to_vec();
                let cutoff = if query.forward_refs {
                    None
                } else {
                    decls.iter().position(|&d| d == limit)
                };
                if let Some(found) = self.scan(query, &decls, cutoff, &mut fallback)? {
                    return self.select(found, query.expected).map(Some);
                }
                limit = scope;
            }
        } else {
            let roots = self.ast.roots().to_vec();
            for root in roots {
                let decls = self.ast.children(root).to_vec();
                if let Some(found) = self.scan(query, &decls, None, &mut fallback)? {
                    return self.select(found, query.expected).map(Some);
                }
            }
        }

        match fallback {
            Some(found) if !query.force_type_match => {
                tracing::trace!(name = query.name, ?found, "no overload accepts the call shape");
                self.select(found, query.expected).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Best declaration in `decls` matching `query`. Entries at or after
    /// `cutoff` only match if they are always visible. The first name match
    /// that rejects the expected shape is kept in `fallback`.
    fn scan(
        &mut self,
        query: &Query<'_>,
        decls: &[NodeId],
        cutoff: Option<usize>,
        fallback: &mut Option<NodeId>,
    ) -> Resolve<Option<NodeId>> {
        let mut candidates = Vec::new();
        for (i, &candidate) in decls.iter().enumerate() {
            if !self.declares(candidate, query.name) || self.is_instance(candidate) {
                continue;
            }
            if cutoff.is_some_and(|cut| i >= cut) && !self.always_visible(candidate) {
                continue;
            }
            if query.filter.is_some_and(|filter| !filter(&self.ast, candidate)) {
                continue;
            }
            candidates.push(candidate);
        }
        let Some(expected) = query.expected else {
            return Ok(candidates.first().copied());
        };
        let ranked = candidates.iter().map(|&c| (c, expected));
        let best = self.best_overload(ranked)?;
        match best {
            Some((found, ShapeMatch::Mismatch)) => {
                fallback.get_or_insert(found);
                Ok(None)
            }
            Some((found, _)) => Ok(Some(found)),
            None => Ok(None),
        }
    }

    /// Highest-ranked `(candidate, shape)` pair; the earliest wins a tie.
    pub(crate) fn best_overload(
        &mut self,
        candidates: impl IntoIterator<Item = (NodeId, Idx)>,
    ) -> Resolve<Option<(NodeId, ShapeMatch)>> {
        let mut best: Option<(NodeId, ShapeMatch)> = None;
        for (candidate, shape) in candidates {
            let rank = self.shape_match(candidate, shape)?;
            if best.is_none_or(|(_, top)| rank > top) {
                best = Some((candidate, rank));
            }
            if rank == ShapeMatch::Exact {
                break;
            }
        }
        Ok(best)
    }

    /// How well declaration `candidate` accepts the call shape `expected`.
    ///
    /// Only callables are ranked; anything else, such as a variable holding
    /// a function pointer, is taken as is.
    pub(crate) fn shape_match(&mut self, candidate: NodeId, expected: Idx) -> Resolve<ShapeMatch> {
        if self.ast.kind(candidate).fn_decl().is_none() {
            return Ok(ShapeMatch::Exact);
        }
        if self.is_template(candidate) {
            return Ok(if self.accepts_shape(candidate, expected)? {
                ShapeMatch::Generic
            } else {
                ShapeMatch::Mismatch
            });
        }

        let sig = self.signature(candidate)?;
        let params = self.pool.fn_params(sig).to_vec();
        let variadic = self.pool.fn_is_variadic(sig);
        let args = self.pool.fn_params(expected).to_vec();
        let arity_ok = if variadic {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !arity_ok {
            return Ok(ShapeMatch::Mismatch);
        }
        let mut exact = !variadic;
        for (&arg, &param) in args.iter().zip(&params) {
            if arg == param {
                continue;
            }
            if !self.pool.is_castable(arg, param) {
                return Ok(ShapeMatch::Mismatch);
            }
            exact = false;
        }
        Ok(if exact {
            ShapeMatch::Exact
        } else {
            ShapeMatch::Convertible
        })
    }

    /// Declaration `id` can be found by bare name `name`.
    ///
    /// Fields and instance methods need an object and are reached through
    /// member access instead.
    fn declares(&self, id: NodeId, name: &str) -> bool {
        match self.ast.kind(id) {
            NodeKind::MemberVar { .. } | NodeKind::Method { is_static: false, .. } => false,
            kind => kind.name() == Some(name),
        }
    }

    fn always_visible(&self, id: NodeId) -> bool {
        matches!(
            self.ast.kind(id),
            NodeKind::Function(_)
                | NodeKind::Method { .. }
                | NodeKind::Class { .. }
                | NodeKind::Constructor { .. }
        ) || self.is_template(id)
    }

    /// Specialize a generic match when a concrete shape was requested.
    fn select(&mut self, candidate: NodeId, expected: Option<Idx>) -> Resolve<NodeId> {
        match expected {
            Some(expected)
                if self.is_template(candidate)
                    && self.ast.kind(candidate).fn_decl().is_some() =>
            {
                self.instantiate_for(candidate, expected)
            }
            _ => Ok(candidate),
        }
    }

    /// Fail with `AccessDenied` if `target` is private and `from` is not
    /// inside the class that owns it.
    pub(crate) fn check_access(&mut self, target: NodeId, from: NodeId) -> Resolve {
        let private = self.ast.kind(target).protection() == Some(citrus_ast::Protection::Private);
        if !private {
            return Ok(());
        }
        let owner = self.ast.parent(target).map(|c| self.origin(c));
        let requester = self.enclosing_class(from).map(|c| self.origin(c));
        if owner.is_some() && owner == requester {
            return Ok(());
        }
        Err(Halt::Error(SemaError::AccessDenied {
            target,
            from,
            what: self.describe(target),
            loc: self.loc(from),
        }))
    }
}
