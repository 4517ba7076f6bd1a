//! Node variants.
//!
//! Every id stored inside a variant is either an owned child of the node
//! (listed in its `children` too) or a non-owning reference. Both kinds are
//! visited by [`NodeKind::visit_ids_mut`] so the copy protocol can remap them.

use smallvec::SmallVec;

use crate::{NodeId, TypeExpr};

/// Member visibility.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Protection {
    #[default]
    Public,
    Private,
}

/// Binary operators, including assignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Assign,
}

impl BinaryOp {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Assign => "=",
        }
    }
}

/// Generic parameters of a generic-capable entity.
///
/// A node with non-empty `params` is a template. A clone produced by
/// instantiation has empty `params` and `instance_of` pointing back at its
/// template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Generics {
    pub params: SmallVec<[String; 2]>,
    pub instance_of: Option<NodeId>,
}

impl Generics {
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            instance_of: None,
        }
    }

    #[inline]
    pub fn is_template(&self) -> bool {
        !self.params.is_empty()
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        self.instance_of.is_some()
    }
}

/// Shared shape of functions and methods.
///
/// Children are the parameters in order, followed by the body block.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: SmallVec<[NodeId; 4]>,
    pub ret: TypeExpr,
    /// `None` declares an external function.
    pub body: Option<NodeId>,
    pub variadic: bool,
    pub generics: Generics,
}

impl FnDecl {
    pub fn new(name: impl Into<String>, ret: TypeExpr) -> Self {
        Self {
            name: name.into(),
            params: SmallVec::new(),
            ret,
            body: None,
            variadic: false,
            generics: Generics::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A compilation unit.
    Root { name: String },
    /// A statement list opening a scope.
    Block,
    Function(FnDecl),
    Param { name: String, ty: TypeExpr },
    /// Local variable; top-level vars are rejected at build time.
    Var {
        name: String,
        ty: Option<TypeExpr>,
        init: Option<NodeId>,
    },
    /// Children are member variables, methods and constructors.
    Class { name: String, generics: Generics },
    MemberVar {
        name: String,
        ty: TypeExpr,
        protection: Protection,
    },
    Method {
        decl: FnDecl,
        protection: Protection,
        is_static: bool,
    },
    /// Callable constructor of `class`, synthesized during initialization.
    /// `method` is the user-written body, if any.
    Constructor {
        class: NodeId,
        method: Option<NodeId>,
        /// Constructor of the template class this one was specialized from.
        instance_of: Option<NodeId>,
    },
    Return { value: Option<NodeId> },
    Break,
    Continue,
    /// Children are the initializers, condition, afterthought, then body.
    Loop {
        initializers: SmallVec<[NodeId; 2]>,
        condition: Option<NodeId>,
        afterthought: Option<NodeId>,
        body: Vec<NodeId>,
        /// Evaluate the condition after the body (do-while).
        post_check: bool,
    },
    IntLit { value: i64, ty: Option<TypeExpr> },
    FloatLit { value: f64, ty: Option<TypeExpr> },
    BoolLit { value: bool },
    /// Reference to a named declaration; `target` is filled by resolution.
    Ident { name: String, target: Option<NodeId> },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Deref { operand: NodeId },
    AddressOf { operand: NodeId },
    Member {
        object: NodeId,
        name: String,
        target: Option<NodeId>,
    },
    /// Children are the callee expression, then the arguments.
    Call {
        callee: NodeId,
        args: SmallVec<[NodeId; 4]>,
    },
    /// `Name(args)`. After initialization the first argument is the hidden
    /// [`NodeKind::Storage`] the object is built in.
    CtorCall {
        name: String,
        args: SmallVec<[NodeId; 4]>,
        storage: Option<NodeId>,
        target: Option<NodeId>,
    },
    /// Stack storage for a constructed object.
    Storage,
}

impl NodeKind {
    /// Symbol name of named entities.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Root { name }
            | NodeKind::Param { name, .. }
            | NodeKind::Var { name, .. }
            | NodeKind::Class { name, .. }
            | NodeKind::MemberVar { name, .. } => Some(name),
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => Some(&decl.name),
            _ => None,
        }
    }

    pub fn fn_decl(&self) -> Option<&FnDecl> {
        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => Some(decl),
            _ => None,
        }
    }

    pub fn fn_decl_mut(&mut self) -> Option<&mut FnDecl> {
        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => Some(decl),
            _ => None,
        }
    }

    pub fn generics(&self) -> Option<&Generics> {
        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => Some(&decl.generics),
            NodeKind::Class { generics, .. } => Some(generics),
            _ => None,
        }
    }

    pub fn generics_mut(&mut self) -> Option<&mut Generics> {
        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => Some(&mut decl.generics),
            NodeKind::Class { generics, .. } => Some(generics),
            _ => None,
        }
    }

    pub fn protection(&self) -> Option<Protection> {
        match self {
            NodeKind::MemberVar { protection, .. } | NodeKind::Method { protection, .. } => {
                Some(*protection)
            }
            _ => None,
        }
    }

    /// Short variant name for diagnostics and logs.
    pub const fn label(&self) -> &'static str {
        match self {
            NodeKind::Root { .. } => "root",
            NodeKind::Block => "block",
            NodeKind::Function(_) => "function",
            NodeKind::Param { .. } => "parameter",
            NodeKind::Var { .. } => "variable",
            NodeKind::Class { .. } => "class",
            NodeKind::MemberVar { .. } => "member variable",
            NodeKind::Method { .. } => "method",
            NodeKind::Constructor { .. } => "constructor",
            NodeKind::Return { .. } => "return",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Loop { .. } => "loop",
            NodeKind::IntLit { .. } => "integer literal",
            NodeKind::FloatLit { .. } => "float literal",
            NodeKind::BoolLit { .. } => "bool literal",
            NodeKind::Ident { .. } => "identifier",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Deref { .. } => "dereference",
            NodeKind::AddressOf { .. } => "address-of",
            NodeKind::Member { .. } => "member access",
            NodeKind::Call { .. } => "call",
            NodeKind::CtorCall { .. } => "constructor call",
            NodeKind::Storage => "storage",
        }
    }

    /// Visit every node id held by this variant, owned or not.
    pub fn visit_ids_mut(&mut self, f: &mut impl FnMut(&mut NodeId)) {
        fn opt(id: &mut Option<NodeId>, f: &mut impl FnMut(&mut NodeId)) {
            if let Some(id) = id {
                f(id);
            }
        }

        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => {
                decl.params.iter_mut().for_each(&mut *f);
                opt(&mut decl.body, f);
                opt(&mut decl.generics.instance_of, f);
            }
            NodeKind::Class { generics, .. } => opt(&mut generics.instance_of, f),
            NodeKind::Var { init, .. } => opt(init, f),
            NodeKind::Constructor {
                class,
                method,
                instance_of,
            } => {
                f(class);
                opt(method, f);
                opt(instance_of, f);
            }
            NodeKind::Return { value } => opt(value, f),
            NodeKind::Loop {
                initializers,
                condition,
                afterthought,
                body,
                ..
            } => {
                initializers.iter_mut().for_each(&mut *f);
                opt(condition, f);
                opt(afterthought, f);
                body.iter_mut().for_each(&mut *f);
            }
            NodeKind::Ident { target, .. } => opt(target, f),
            NodeKind::Binary { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            NodeKind::Deref { operand } | NodeKind::AddressOf { operand } => f(operand),
            NodeKind::Member { object, target, .. } => {
                f(object);
                opt(target, f);
            }
            NodeKind::Call { callee, args } => {
                f(callee);
                args.iter_mut().for_each(&mut *f);
            }
            NodeKind::CtorCall {
                args,
                storage,
                target,
                ..
            } => {
                args.iter_mut().for_each(&mut *f);
                opt(storage, f);
                opt(target, f);
            }
            NodeKind::Root { .. }
            | NodeKind::Block
            | NodeKind::Param { .. }
            | NodeKind::MemberVar { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::IntLit { .. }
            | NodeKind::FloatLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::Storage => {}
        }

        self.type_exprs_mut(&mut |ty| ty.visit_ids_mut(&mut *f));
    }

    /// Visit every type annotation held by this variant.
    pub fn type_exprs_mut(&mut self, f: &mut impl FnMut(&mut TypeExpr)) {
        match self {
            NodeKind::Function(decl) | NodeKind::Method { decl, .. } => f(&mut decl.ret),
            NodeKind::Param { ty, .. } | NodeKind::MemberVar { ty, .. } => f(ty),
            NodeKind::Var { ty: Some(ty), .. }
            | NodeKind::IntLit { ty: Some(ty), .. }
            | NodeKind::FloatLit { ty: Some(ty), .. } => f(ty),
            _ => {}
        }
    }
}
