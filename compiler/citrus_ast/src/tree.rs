//! The node arena and tree mutation.
//!
//! The arena owns every node of a compilation unit. Parent/child edges are
//! kept consistent in both directions by `add_child` and `remove_child`;
//! nothing else writes them.

use smallvec::SmallVec;

use crate::{AstError, Capabilities, NodeId, NodeKind, SourceLoc};

/// Lifecycle of a node through the pipeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeState {
    #[default]
    Uninitialized,
    Initialized,
    /// Dependencies registered; waiting to be resolved.
    DependenciesFound,
    /// On the resolve stack. Seeing this state again means a cycle.
    Resolving,
    Resolved,
    /// Resolution failed; dependents are skipped.
    Failed,
    Built,
}

/// Where `add_child` inserts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
    Back,
    Front,
    /// Insert at this index, shifting later children.
    Index(usize),
}

#[derive(Clone, Debug)]
pub struct Node {
    parent: NodeId,
    children: Vec<NodeId>,
    dependencies: SmallVec<[NodeId; 2]>,
    pub state: NodeState,
    pub loc: SourceLoc,
    pub kind: NodeKind,
}

impl Node {
    fn new(kind: NodeKind, loc: SourceLoc) -> Self {
        Self {
            parent: NodeId::NONE,
            children: Vec::new(),
            dependencies: SmallVec::new(),
            state: NodeState::Uninitialized,
            loc,
            kind,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        (!self.parent.is_none()).then_some(self.parent)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }
}

/// Arena of nodes for one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a compilation unit never holds u32::MAX nodes"
    )]
    pub fn alloc(&mut self, kind: NodeKind, loc: SourceLoc) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, loc));
        id
    }

    /// True if `id` names a node of this arena.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Register a detached node as a top-level tree.
    pub fn add_root(&mut self, id: NodeId) -> Result<(), AstError> {
        self.check("add_root", id)?;
        if self.nodes[id.index()].parent().is_some() {
            return Err(AstError::invalid("add_root", "node already has a parent", id));
        }
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        Ok(())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // === Accessors ===

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        self.nodes[id.index()].state
    }

    pub fn set_state(&mut self, id: NodeId, state: NodeState) {
        self.nodes[id.index()].state = state;
    }

    pub fn loc(&self, id: NodeId) -> SourceLoc {
        self.nodes[id.index()].loc
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn dependencies(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].dependencies
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].kind.name()
    }

    pub fn capabilities(&self, id: NodeId) -> Capabilities {
        self.nodes[id.index()].kind.capabilities()
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// Every node of the subtree rooted at `root`, in preorder.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // === Mutation ===

    /// Attach `child` under `parent`.
    ///
    /// Fails if either id is missing, if `child` already has an owner, or if
    /// `child` is `parent` or one of its ancestors.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        at: Position,
    ) -> Result<(), AstError> {
        self.check("add_child", parent)?;
        self.check("add_child", child)?;
        if self.nodes[child.index()].parent().is_some() {
            return Err(AstError::invalid("add_child", "child already has a parent", child));
        }
        if self.is_ancestor(child, parent) {
            return Err(AstError::invalid("add_child", "edge would form a cycle", child));
        }

        let children = &mut self.nodes[parent.index()].children;
        let index = match at {
            Position::Back => children.len(),
            Position::Front => 0,
            Position::Index(i) if i <= children.len() => i,
            Position::Index(_) => {
                return Err(AstError::invalid("add_child", "index out of range", parent));
            }
        };
        children.insert(index, child);
        self.nodes[child.index()].parent = parent;
        self.roots.retain(|&r| r != child);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns `false` if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        let children = &mut self.nodes[parent.index()].children;
        let Some(pos) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(pos);
        self.nodes[child.index()].parent = NodeId::NONE;
        true
    }

    /// Record that `node` needs `dep` resolved first. Duplicates are ignored.
    pub fn add_dependency(&mut self, node: NodeId, dep: NodeId) -> Result<(), AstError> {
        self.check("add_dependency", node)?;
        self.check("add_dependency", dep)?;
        if node == dep {
            return Err(AstError::invalid("add_dependency", "node cannot depend on itself", node));
        }
        let deps = &mut self.nodes[node.index()].dependencies;
        if !deps.contains(&dep) {
            deps.push(dep);
        }
        Ok(())
    }

    pub(crate) fn set_links(
        &mut self,
        id: NodeId,
        parent: NodeId,
        children: Vec<NodeId>,
        dependencies: SmallVec<[NodeId; 2]>,
    ) {
        let node = &mut self.nodes[id.index()];
        node.parent = parent;
        node.children = children;
        node.dependencies = dependencies;
    }

    fn check(&self, op: &'static str, id: NodeId) -> Result<(), AstError> {
        if id.is_none() {
            return Err(AstError::invalid(op, "null node", id));
        }
        if !self.contains(id) {
            return Err(AstError::invalid(op, "node not in arena", id));
        }
        Ok(())
    }
}
