//! Copy protocol.
//!
//! A copy runs inside a [`CopyContext`] that records old-to-new node
//! mappings. Contexts nest: instantiating a generic method of a generic class
//! copies the class in an outer context and may copy the method again in an
//! inner one. Closing an inner context merges its mappings outward so the
//! enclosing operation can still find every copy made on its behalf.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Ast, AstError, NodeId, NodeState};

/// Old-to-new mappings of one copy scope.
#[derive(Clone, Debug, Default)]
pub struct CopyContext {
    map: FxHashMap<NodeId, NodeId>,
}

impl CopyContext {
    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.map.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Stack of open copy contexts, owned by the module.
#[derive(Clone, Debug, Default)]
pub struct CopyStack {
    contexts: Vec<CopyContext>,
}

impl CopyStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a nested copy scope.
    pub fn begin_copy(&mut self) {
        self.contexts.push(CopyContext::default());
    }

    /// Close the innermost scope, merging its mappings into the enclosing one.
    pub fn end_copy(&mut self) -> Result<CopyContext, AstError> {
        let top = self.contexts.pop().ok_or(AstError::CopyContextUnderflow)?;
        if let Some(outer) = self.contexts.last_mut() {
            outer.map.extend(top.map.iter().map(|(&k, &v)| (k, v)));
        }
        Ok(top)
    }

    /// Newest copy of `old` in any open scope, innermost first.
    pub fn get_copy(&self, old: NodeId) -> Option<NodeId> {
        self.contexts.iter().rev().find_map(|ctx| ctx.get(old))
    }

    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_active(&self) -> bool {
        !self.contexts.is_empty()
    }

    fn record(&mut self, old: NodeId, new: NodeId) -> Result<(), AstError> {
        let top = self
            .contexts
            .last_mut()
            .ok_or(AstError::CopyContextUnderflow)?;
        top.map.insert(old, new);
        Ok(())
    }
}

impl Ast {
    /// Copy the subtree rooted at `root` into fresh, detached nodes.
    ///
    /// Requires an open copy context. References to nodes inside the subtree
    /// are remapped to their copies; references to anything outside are kept.
    /// Copies start [`NodeState::Uninitialized`] and have no parent.
    pub fn copy_subtree(&mut self, root: NodeId, stack: &mut CopyStack) -> Result<NodeId, AstError> {
        if !stack.is_active() {
            return Err(AstError::CopyContextUnderflow);
        }
        if root.is_none() || !self.contains(root) {
            return Err(AstError::invalid("copy_subtree", "null node", root));
        }

        // Pass 1: allocate every copy so internal references can be mapped.
        let originals = self.subtree(root);
        let mut pairs = Vec::with_capacity(originals.len());
        for &old in &originals {
            let node = self.node(old);
            let (kind, loc) = (node.kind.clone(), node.loc);
            let new = self.alloc(kind, loc);
            stack.record(old, new)?;
            pairs.push((old, new));
        }

        // Pass 2: rewrite links and embedded ids through the copy stack.
        let remap = |id: NodeId| stack.get_copy(id).unwrap_or(id);
        for &(old, new) in &pairs {
            let src = self.node(old);
            let parent = if old == root {
                NodeId::NONE
            } else {
                src.parent().map_or(NodeId::NONE, remap)
            };
            let children: Vec<NodeId> = src.children().iter().map(|&c| remap(c)).collect();
            let deps: SmallVec<[NodeId; 2]> =
                src.dependencies().iter().map(|&d| remap(d)).collect();

            self.set_links(new, parent, children, deps);
            let node = self.node_mut(new);
            node.kind.visit_ids_mut(&mut |id| *id = remap(*id));
            node.state = NodeState::Uninitialized;
        }

        Ok(remap(root))
    }

    /// Copy `root` in its own copy scope.
    pub fn copy_node(&mut self, root: NodeId, stack: &mut CopyStack) -> Result<NodeId, AstError> {
        stack.begin_copy();
        let copied = self.copy_subtree(root, stack);
        stack.end_copy()?;
        copied
    }
}

#[cfg(test)]
mod tests;
