//! Tree construction for tests, standing in for the parser.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(dead_code, reason = "not every test module uses every builder")]

use citrus_ast::{
    Ast, BinaryOp, FileId, FnDecl, Generics, NodeId, NodeKind, Position, Protection, SourceLoc,
    TypeExpr,
};
use smallvec::SmallVec;

use crate::{Module, SemaOptions};

/// Parse the small type syntax tests use: `int32`, `T*`, `int8[4]`,
/// `Box<int32>`.
pub(crate) fn ty(text: &str) -> TypeExpr {
    let text = text.trim();
    if let Some(inner) = text.strip_suffix('*') {
        return TypeExpr::pointer(ty(inner));
    }
    if let Some(head) = text.strip_suffix(']') {
        let open = head.rfind('[').unwrap();
        let len = head[open + 1..].parse().unwrap();
        return TypeExpr::array(ty(&head[..open]), len);
    }
    if let Some(head) = text.strip_suffix('>') {
        let open = head.find('<').unwrap();
        let args = head[open + 1..].split(',').map(ty).collect();
        return TypeExpr::Applied(head[..open].to_owned(), args);
    }
    TypeExpr::named(text)
}

/// Builds one compilation unit rooted at `main`.
pub(crate) struct AstBuilder {
    pub ast: Ast,
    pub root: NodeId,
    line: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        let mut ast = Ast::new();
        let root = ast.alloc(
            NodeKind::Root {
                name: "main".to_owned(),
            },
            SourceLoc::new(FileId(1), 1, 1),
        );
        ast.add_root(root).unwrap();
        Self { ast, root, line: 1 }
    }

    pub fn finish(self) -> Module {
        Module::new(self.ast)
    }

    pub fn finish_with(self, options: SemaOptions) -> Module {
        Module::with_options(self.ast, options)
    }

    /// Allocate a node owning `children`, in order.
    pub fn node(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        self.line += 1;
        let id = self.ast.alloc(kind, SourceLoc::new(FileId(1), self.line, 1));
        for &child in children {
            self.ast.add_child(id, child, Position::Back).unwrap();
        }
        id
    }

    /// Attach a declaration or statement to the root.
    pub fn top_level(&mut self, id: NodeId) -> NodeId {
        self.ast.add_child(self.root, id, Position::Back).unwrap();
        id
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block, &stmts)
    }

    // === Declarations ===

    fn fn_decl(
        &mut self,
        name: &str,
        generics: &[&str],
        params: &[(&str, &str)],
        ret: &str,
        body: Option<Vec<NodeId>>,
    ) -> (FnDecl, Vec<NodeId>) {
        let mut decl = FnDecl::new(name, ty(ret));
        decl.generics = Generics::new(generics.iter().copied());
        let mut children = Vec::new();
        for &(pname, pty) in params {
            let param = self.node(
                NodeKind::Param {
                    name: pname.to_owned(),
                    ty: ty(pty),
                },
                &[],
            );
            decl.params.push(param);
            children.push(param);
        }
        if let Some(stmts) = body {
            let block = self.block(stmts);
            decl.body = Some(block);
            children.push(block);
        }
        (decl, children)
    }

    pub fn function(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
        ret: &str,
        body: Vec<NodeId>,
    ) -> NodeId {
        self.generic_function(name, &[], params, ret, body)
    }

    pub fn generic_function(
        &mut self,
        name: &str,
        generics: &[&str],
        params: &[(&str, &str)],
        ret: &str,
        body: Vec<NodeId>,
    ) -> NodeId {
        let (decl, children) = self.fn_decl(name, generics, params, ret, Some(body));
        let id = self.node(NodeKind::Function(decl), &children);
        self.top_level(id)
    }

    /// Body-less declaration of an external function.
    pub fn extern_fn(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
        ret: &str,
        variadic: bool,
    ) -> NodeId {
        let (mut decl, children) = self.fn_decl(name, &[], params, ret, None);
        decl.variadic = variadic;
        let id = self.node(NodeKind::Function(decl), &children);
        self.top_level(id)
    }

    pub fn class(&mut self, name: &str, generics: &[&str]) -> NodeId {
        let id = self.node(
            NodeKind::Class {
                name: name.to_owned(),
                generics: Generics::new(generics.iter().copied()),
            },
            &[],
        );
        self.top_level(id)
    }

    pub fn member_var(&mut self, class: NodeId, name: &str, ty_text: &str, private: bool) -> NodeId {
        let id = self.node(
            NodeKind::MemberVar {
                name: name.to_owned(),
                ty: ty(ty_text),
                protection: if private {
                    Protection::Private
                } else {
                    Protection::Public
                },
            },
            &[],
        );
        self.ast.add_child(class, id, Position::Back).unwrap();
        id
    }

    pub fn method(
        &mut self,
        class: NodeId,
        name: &str,
        params: &[(&str, &str)],
        ret: &str,
        body: Vec<NodeId>,
    ) -> NodeId {
        self.generic_method(class, name, &[], params, ret, body)
    }

    pub fn generic_method(
        &mut self,
        class: NodeId,
        name: &str,
        generics: &[&str],
        params: &[(&str, &str)],
        ret: &str,
        body: Vec<NodeId>,
    ) -> NodeId {
        let (decl, children) = self.fn_decl(name, generics, params, ret, Some(body));
        let id = self.node(
            NodeKind::Method {
                decl,
                protection: Protection::Public,
                is_static: false,
            },
            &children,
        );
        self.ast.add_child(class, id, Position::Back).unwrap();
        id
    }

    // === Statements ===

    pub fn var(&mut self, name: &str, ty_text: Option<&str>, init: Option<NodeId>) -> NodeId {
        let children: Vec<NodeId> = init.into_iter().collect();
        self.node(
            NodeKind::Var {
                name: name.to_owned(),
                ty: ty_text.map(ty),
                init,
            },
            &children,
        )
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        let children: Vec<NodeId> = value.into_iter().collect();
        self.node(NodeKind::Return { value }, &children)
    }

    pub fn brk(&mut self) -> NodeId {
        self.node(NodeKind::Break, &[])
    }

    pub fn cont(&mut self) -> NodeId {
        self.node(NodeKind::Continue, &[])
    }

    pub fn loop_(
        &mut self,
        initializers: Vec<NodeId>,
        condition: Option<NodeId>,
        afterthought: Option<NodeId>,
        body: Vec<NodeId>,
        post_check: bool,
    ) -> NodeId {
        let mut children = initializers.clone();
        children.extend(condition);
        children.extend(afterthought);
        children.extend(body.iter().copied());
        self.node(
            NodeKind::Loop {
                initializers: SmallVec::from_vec(initializers),
                condition,
                afterthought,
                body,
                post_check,
            },
            &children,
        )
    }

    // === Expressions ===

    pub fn int(&mut self, value: i64) -> NodeId {
        self.node(NodeKind::IntLit { value, ty: None }, &[])
    }

    pub fn int_typed(&mut self, value: i64, ty_text: &str) -> NodeId {
        self.node(
            NodeKind::IntLit {
                value,
                ty: Some(ty(ty_text)),
            },
            &[],
        )
    }

    pub fn float(&mut self, value: f64) -> NodeId {
        self.node(NodeKind::FloatLit { value, ty: None }, &[])
    }

    pub fn float_typed(&mut self, value: f64, ty_text: &str) -> NodeId {
        self.node(
            NodeKind::FloatLit {
                value,
                ty: Some(ty(ty_text)),
            },
            &[],
        )
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.node(NodeKind::BoolLit { value }, &[])
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.node(
            NodeKind::Ident {
                name: name.to_owned(),
                target: None,
            },
            &[],
        )
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.node(NodeKind::Binary { op, lhs, rhs }, &[lhs, rhs])
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let mut children = vec![callee];
        children.extend(args.iter().copied());
        self.node(
            NodeKind::Call {
                callee,
                args: SmallVec::from_vec(args),
            },
            &children,
        )
    }

    /// `name(args)` with a bare identifier callee.
    pub fn call_named(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    pub fn ctor_call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let children = args.clone();
        self.node(
            NodeKind::CtorCall {
                name: name.to_owned(),
                args: SmallVec::from_vec(args),
                storage: None,
                target: None,
            },
            &children,
        )
    }

    pub fn member(&mut self, object: NodeId, name: &str) -> NodeId {
        self.node(
            NodeKind::Member {
                object,
                name: name.to_owned(),
                target: None,
            },
            &[object],
        )
    }

    pub fn deref(&mut self, operand: NodeId) -> NodeId {
        self.node(NodeKind::Deref { operand }, &[operand])
    }

    pub fn addr(&mut self, operand: NodeId) -> NodeId {
        self.node(NodeKind::AddressOf { operand }, &[operand])
    }
}
