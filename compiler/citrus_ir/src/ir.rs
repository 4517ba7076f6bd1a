//! Recorded IR: functions made of basic blocks.
//!
//! - **[`IrModule`]**: every function declared or defined by one unit
//! - **[`IrFunction`]**: signature plus blocks in layout order
//! - **[`IrBlock`]**: body instructions and exactly one terminator
//! - **[`Instr`]** / **[`Terminator`]**: the instruction set the lowering needs
//!
//! Values are numbered per function via [`ValueId`]; parameters take the
//! first ids.

use std::fmt::{self, Write};

use citrus_types::{CastOp, Idx, Pool};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Value produced by an instruction or bound to a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Basic block within one function. Ids follow creation order; layout order
/// is kept separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Function within a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FuncId(u32);

impl FuncId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Instructions ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
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
}

impl BinOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Lt => "lt",
            BinOp::Le => "le",
            BinOp::Gt => "gt",
            BinOp::Ge => "ge",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
        }
    }
}

/// Call target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    /// Call a function by symbol.
    Direct(String),
    /// Call through a function pointer value.
    Indirect(ValueId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Stack slot for one value of type `ty`.
    Alloca { dst: ValueId, ty: Idx },
    Load { dst: ValueId, ty: Idx, ptr: ValueId },
    Store { value: ValueId, ptr: ValueId },
    Cast {
        dst: ValueId,
        op: CastOp,
        value: ValueId,
        to: Idx,
    },
    Call {
        dst: ValueId,
        ret: Idx,
        callee: Callee,
        args: Vec<ValueId>,
    },
    /// Binary operation on operands of type `ty`.
    Binary {
        dst: ValueId,
        op: BinOp,
        ty: Idx,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Address of field `field` of the object at `base`.
    FieldAddr {
        dst: ValueId,
        base: ValueId,
        class: Idx,
        field: u32,
    },
    Const {
        dst: ValueId,
        ty: Idx,
        value: Constant,
    },
    /// Address of a function, for indirect calls.
    FuncRef { dst: ValueId, symbol: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Br { target: BlockId },
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret { value: Option<ValueId> },
    Unreachable,
}

impl Terminator {
    /// Blocks this terminator may transfer control to.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br { target } => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret { .. } | Terminator::Unreachable => Vec::new(),
        }
    }
}

// ── Containers ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct IrBlock {
    pub id: BlockId,
    pub name: String,
    pub body: Vec<Instr>,
    pub terminator: Terminator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrFunction {
    pub symbol: String,
    pub params: Vec<(ValueId, Idx)>,
    pub ret: Idx,
    pub variadic: bool,
    /// Blocks in layout order. Empty for external declarations.
    pub blocks: Vec<IrBlock>,
}

impl IrFunction {
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&IrBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_named(&self, name: &str) -> Option<&IrBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Every instruction of every block, in layout order.
    pub fn instrs(&self) -> impl Iterator<Item = &Instr> {
        self.blocks.iter().flat_map(|b| b.body.iter())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IrModule {
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn function(&self, symbol: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }

    /// Textual form, with types printed through `pool`.
    pub fn dump(&self, pool: &Pool) -> String {
        let mut out = String::new();
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write_function(&mut out, func, pool);
        }
        out
    }
}

fn write_function(out: &mut String, func: &IrFunction, pool: &Pool) -> fmt::Result {
    let keyword = if func.is_declaration() {
        "declare"
    } else {
        "define"
    };
    write!(out, "{keyword} {} @{}(", pool.get_string(func.ret), func.symbol)?;
    for (i, (value, ty)) in func.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write!(out, "{} %{}", pool.get_string(*ty), value.raw())?;
    }
    if func.variadic {
        out.push_str(if func.params.is_empty() { "..." } else { ", ..." });
    }
    out.push(')');
    if func.is_declaration() {
        out.push('\n');
        return Ok(());
    }
    out.push_str(" {\n");
    for block in &func.blocks {
        writeln!(out, "{}:", block.name)?;
        for instr in &block.body {
            out.push_str("  ");
            write_instr(out, instr, pool)?;
            out.push('\n');
        }
        out.push_str("  ");
        write_terminator(out, &block.terminator, func)?;
        out.push('\n');
    }
    out.push_str("}\n");
    Ok(())
}

fn write_instr(out: &mut String, instr: &Instr, pool: &Pool) -> fmt::Result {
    match instr {
        Instr::Alloca { dst, ty } => write!(out, "%{} = alloca {}", dst.raw(), pool.get_string(*ty)),
        Instr::Load { dst, ty, ptr } => write!(
            out,
            "%{} = load {}, %{}",
            dst.raw(),
            pool.get_string(*ty),
            ptr.raw()
        ),
        Instr::Store { value, ptr } => write!(out, "store %{}, %{}", value.raw(), ptr.raw()),
        Instr::Cast { dst, op, value, to } => write!(
            out,
            "%{} = {} %{} to {}",
            dst.raw(),
            op.mnemonic(),
            value.raw(),
            pool.get_string(*to)
        ),
        Instr::Call {
            dst,
            ret,
            callee,
            args,
        } => {
            write!(out, "%{} = call {} ", dst.raw(), pool.get_string(*ret))?;
            match callee {
                Callee::Direct(symbol) => write!(out, "@{symbol}(")?,
                Callee::Indirect(value) => write!(out, "%{}(", value.raw())?,
            }
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "%{}", arg.raw())?;
            }
            out.push(')');
            Ok(())
        }
        Instr::Binary {
            dst,
            op,
            ty,
            lhs,
            rhs,
        } => write!(
            out,
            "%{} = {} {} %{}, %{}",
            dst.raw(),
            op.mnemonic(),
            pool.get_string(*ty),
            lhs.raw(),
            rhs.raw()
        ),
        Instr::FieldAddr {
            dst,
            base,
            class,
            field,
        } => write!(
            out,
            "%{} = fieldaddr {}, %{}, {field}",
            dst.raw(),
            pool.get_string(*class),
            base.raw()
        ),
        Instr::Const { dst, ty, value } => {
            write!(out, "%{} = const {} ", dst.raw(), pool.get_string(*ty))?;
            match value {
                Constant::Int(v) => write!(out, "{v}"),
                Constant::Float(v) => write!(out, "{v:?}"),
                Constant::Bool(v) => write!(out, "{v}"),
            }
        }
        Instr::FuncRef { dst, symbol } => write!(out, "%{} = funcref @{symbol}", dst.raw()),
    }
}

fn write_terminator(out: &mut String, term: &Terminator, func: &IrFunction) -> fmt::Result {
    let name = |id: BlockId| func.block(id).map_or("<missing>", |b| b.name.as_str());
    match term {
        Terminator::Br { target } => write!(out, "br {}", name(*target)),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            out,
            "condbr %{}, {}, {}",
            cond.raw(),
            name(*then_block),
            name(*else_block)
        ),
        Terminator::Ret { value: Some(v) } => write!(out, "ret %{}", v.raw()),
        Terminator::Ret { value: None } => write!(out, "ret void"),
        Terminator::Unreachable => write!(out, "unreachable"),
    }
}
