use pretty_assertions::assert_eq;

use super::*;
use crate::{FnDecl, Generics, NodeKind, Position, SourceLoc, TypeExpr};

/// `fn id<T>(x: T) -> T { return x; }`, with the ident pointing at `x` and a
/// dependency on an external node.
fn generic_id(ast: &mut Ast) -> (NodeId, NodeId, NodeId, NodeId) {
    let external = ast.alloc(NodeKind::Block, SourceLoc::SYNTHESIZED);

    let mut decl = FnDecl::new("id", TypeExpr::named("T"));
    decl.generics = Generics::new(["T"]);
    let func = ast.alloc(NodeKind::Function(decl), SourceLoc::SYNTHESIZED);
    let param = ast.alloc(
        NodeKind::Param {
            name: "x".into(),
            ty: TypeExpr::named("T"),
        },
        SourceLoc::SYNTHESIZED,
    );
    let body = ast.alloc(NodeKind::Block, SourceLoc::SYNTHESIZED);
    let ident = ast.alloc(
        NodeKind::Ident {
            name: "x".into(),
            target: Some(param),
        },
        SourceLoc::SYNTHESIZED,
    );
    let ret = ast.alloc(NodeKind::Return { value: Some(ident) }, SourceLoc::SYNTHESIZED);

    ast.add_child(func, param, Position::Back).ok();
    ast.add_child(func, body, Position::Back).ok();
    ast.add_child(body, ret, Position::Back).ok();
    ast.add_child(ret, ident, Position::Back).ok();
    if let Some(decl) = ast.kind_mut(func).fn_decl_mut() {
        decl.params.push(param);
        decl.body = Some(body);
    }
    ast.add_dependency(ident, param).ok();
    ast.add_dependency(ident, external).ok();

    (func, param, ident, external)
}

#[test]
fn copy_requires_open_context() {
    let mut ast = Ast::new();
    let (func, ..) = generic_id(&mut ast);
    let mut stack = CopyStack::new();

    assert_eq!(
        ast.copy_subtree(func, &mut stack),
        Err(AstError::CopyContextUnderflow)
    );
    assert_eq!(stack.end_copy().err(), Some(AstError::CopyContextUnderflow));
}

#[test]
fn copy_preserves_shape() {
    let mut ast = Ast::new();
    let (func, ..) = generic_id(&mut ast);
    let mut stack = CopyStack::new();

    let copy = match ast.copy_node(func, &mut stack) {
        Ok(copy) => copy,
        Err(err) => panic!("copy failed: {err}"),
    };

    assert_ne!(copy, func);
    assert_eq!(ast.parent(copy), None);
    assert_eq!(ast.subtree(copy).len(), ast.subtree(func).len());
    for (old, new) in ast.subtree(func).into_iter().zip(ast.subtree(copy)) {
        assert_eq!(ast.children(old).len(), ast.children(new).len());
        assert_eq!(ast.kind(old).label(), ast.kind(new).label());
        assert_eq!(ast.state(new), NodeState::Uninitialized);
    }
    assert_eq!(stack.depth(), 0);
}

#[test]
fn copy_remaps_internal_references_only() {
    let mut ast = Ast::new();
    let (func, param, ident, external) = generic_id(&mut ast);
    let mut stack = CopyStack::new();

    stack.begin_copy();
    let copy = ast.copy_subtree(func, &mut stack);
    let new_param = stack.get_copy(param);
    let new_ident = stack.get_copy(ident);
    stack.end_copy().ok();

    let (Ok(copy), Some(new_param), Some(new_ident)) = (copy, new_param, new_ident) else {
        panic!("copy did not record mappings");
    };

    // Declared members follow the copy.
    let decl = ast.kind(copy).fn_decl().cloned();
    assert_eq!(decl.map(|d| d.params.to_vec()), Some(vec![new_param]));

    // The ident now targets the copied parameter.
    assert_eq!(
        ast.kind(new_ident),
        &NodeKind::Ident {
            name: "x".into(),
            target: Some(new_param),
        }
    );

    // Internal dependency remapped, external one kept.
    assert_eq!(ast.dependencies(new_ident), &[new_param, external]);

    // The original is untouched.
    assert_eq!(ast.dependencies(ident), &[param, external]);
    assert_eq!(ast.parent(param), Some(func));
}

#[test]
fn decl_type_references_follow_the_copy() {
    let mut ast = Ast::new();
    let class = ast.alloc(
        NodeKind::Class {
            name: "Point".into(),
            generics: Generics::default(),
        },
        SourceLoc::SYNTHESIZED,
    );
    let this = ast.alloc(
        NodeKind::Param {
            name: "this".into(),
            ty: TypeExpr::pointer(TypeExpr::Decl(class)),
        },
        SourceLoc::SYNTHESIZED,
    );
    ast.add_child(class, this, Position::Back).ok();

    let mut stack = CopyStack::new();
    stack.begin_copy();
    let copy = ast.copy_subtree(class, &mut stack);
    let new_this = stack.get_copy(this);
    stack.end_copy().ok();

    let (Ok(copy), Some(new_this)) = (copy, new_this) else {
        panic!("copy failed");
    };
    assert_eq!(
        ast.kind(new_this),
        &NodeKind::Param {
            name: "this".into(),
            ty: TypeExpr::pointer(TypeExpr::Decl(copy)),
        }
    );
}

#[test]
fn nested_contexts_merge_outward() {
    let mut ast = Ast::new();
    let (func, param, ..) = generic_id(&mut ast);
    let mut stack = CopyStack::new();

    stack.begin_copy();
    stack.begin_copy();
    let inner = ast.copy_subtree(func, &mut stack);
    assert_eq!(stack.depth(), 2);
    let closed = stack.end_copy();
    assert!(closed.is_ok_and(|ctx| ctx.len() == ast.subtree(func).len()));

    // Mappings of the closed scope stay visible to the enclosing one.
    assert_eq!(stack.get_copy(func), inner.ok());
    assert!(stack.get_copy(param).is_some());

    stack.end_copy().ok();
    assert_eq!(stack.get_copy(func), None);
}

// === Property tests ===

#[allow(
    clippy::disallowed_types,
    reason = "proptest macros internally use Arc"
)]
mod proptest_copy {
    use proptest::prelude::*;

    use crate::{Ast, CopyStack, NodeId, NodeKind, Position, SourceLoc};

    /// Build a random tree: node `i` attaches under node `parents[i] % i`.
    fn build(parents: &[usize]) -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let root = ast.alloc(NodeKind::Block, SourceLoc::SYNTHESIZED);
        let mut ids = vec![root];
        for (i, &p) in parents.iter().enumerate() {
            let id = ast.alloc(NodeKind::Block, SourceLoc::SYNTHESIZED);
            let parent = ids[p % (i + 1)];
            ast.add_child(parent, id, Position::Back).ok();
            // Depend on the previous node: sometimes a sibling, sometimes not.
            ast.add_dependency(id, ids[i]).ok();
            ids.push(id);
        }
        (ast, root)
    }

    proptest! {
        #[test]
        fn copy_has_same_shape(parents in proptest::collection::vec(0usize..64, 0..40)) {
            let (mut ast, root) = build(&parents);
            let mut stack = CopyStack::new();
            let copy = ast.copy_node(root, &mut stack);
            prop_assert!(copy.is_ok());
            let copy = copy.unwrap_or(NodeId::NONE);

            let old = ast.subtree(root);
            let new = ast.subtree(copy);
            prop_assert_eq!(old.len(), new.len());
            for (o, n) in old.iter().zip(&new) {
                prop_assert_eq!(ast.children(*o).len(), ast.children(*n).len());
                prop_assert_eq!(ast.dependencies(*o).len(), ast.dependencies(*n).len());
                // Every dependency of a copy points into the copied subtree.
                for dep in ast.dependencies(*n) {
                    prop_assert!(ast.is_ancestor(copy, *dep));
                }
            }
        }
    }
}
