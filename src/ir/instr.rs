//! IR Instructions
//!
//! Instruction definitions for the Slanguage IR. Display impls render each
//! instruction in LLVM textual syntax; operand types are taken from the
//! operands themselves.

use super::types::{BlockId, IrType, VReg, Value};
use std::fmt;

/// An instruction in the IR
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Result register (None for void instructions)
    pub result: Option<VReg>,
    /// The instruction kind
    pub kind: InstrKind,
}

impl Instruction {
    pub fn new(result: Option<VReg>, kind: InstrKind) -> Self {
        Self { result, kind }
    }
}

/// Kinds of instructions
#[derive(Debug, Clone)]
pub enum InstrKind {
    // ============ Integer arithmetic ============
    Add(Value, Value),
    Sub(Value, Value),
    Mul(Value, Value),
    SDiv(Value, Value),
    SRem(Value, Value),

    // ============ Floating point ============
    FAdd(Value, Value),
    FSub(Value, Value),
    FMul(Value, Value),
    FDiv(Value, Value),
    FRem(Value, Value),
    FNeg(Value),

    // ============ Bitwise ============
    /// Exclusive or; boolean negation is `xor i1 x, true`
    Xor(Value, Value),

    // ============ Comparison ============
    ICmp(CmpOp, Value, Value),
    FCmp(CmpOp, Value, Value),

    // ============ Memory ============
    /// Allocate one stack slot of the given type
    Alloca(IrType),
    /// Load a value of the given type through a pointer
    Load(IrType, Value),
    /// Store a value through a pointer (value, ptr)
    Store(Value, Value),

    // ============ Calls ============
    Call {
        func: String,
        ret: IrType,
        args: Vec<Value>,
    },
}

/// Comparison operators (signed; floats map to the ordered predicates)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// The `icmp` predicate keyword
    pub fn icmp_keyword(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "slt",
            CmpOp::Le => "sle",
            CmpOp::Gt => "sgt",
            CmpOp::Ge => "sge",
        }
    }

    /// The `fcmp` predicate keyword
    pub fn fcmp_keyword(&self) -> &'static str {
        match self {
            CmpOp::Eq => "oeq",
            CmpOp::Ne => "one",
            CmpOp::Lt => "olt",
            CmpOp::Le => "ole",
            CmpOp::Gt => "ogt",
            CmpOp::Ge => "oge",
        }
    }
}

/// Block terminators
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Return from function
    Ret(Option<Value>),
    /// Unconditional branch
    Br(BlockId),
    /// Conditional branch
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// No path reaches here
    Unreachable,
}

fn write_binary(
    f: &mut fmt::Formatter<'_>,
    op: &str,
    a: &Value,
    b: &Value,
) -> fmt::Result {
    write!(f, "{} {} {}, {}", op, a.ty(), a, b)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{} = ", result)?;
        }
        match &self.kind {
            InstrKind::Add(a, b) => write_binary(f, "add", a, b),
            InstrKind::Sub(a, b) => write_binary(f, "sub", a, b),
            InstrKind::Mul(a, b) => write_binary(f, "mul", a, b),
            InstrKind::SDiv(a, b) => write_binary(f, "sdiv", a, b),
            InstrKind::SRem(a, b) => write_binary(f, "srem", a, b),
            InstrKind::FAdd(a, b) => write_binary(f, "fadd", a, b),
            InstrKind::FSub(a, b) => write_binary(f, "fsub", a, b),
            InstrKind::FMul(a, b) => write_binary(f, "fmul", a, b),
            InstrKind::FDiv(a, b) => write_binary(f, "fdiv", a, b),
            InstrKind::FRem(a, b) => write_binary(f, "frem", a, b),
            InstrKind::FNeg(v) => write!(f, "fneg {} {}", v.ty(), v),
            InstrKind::Xor(a, b) => write_binary(f, "xor", a, b),
            InstrKind::ICmp(op, a, b) => {
                write!(f, "icmp {} {} {}, {}", op.icmp_keyword(), a.ty(), a, b)
            }
            InstrKind::FCmp(op, a, b) => {
                write!(f, "fcmp {} {} {}, {}", op.fcmp_keyword(), a.ty(), a, b)
            }
            InstrKind::Alloca(ty) => write!(f, "alloca {}", ty),
            InstrKind::Load(ty, ptr) => write!(f, "load {}, {} {}", ty, ptr.ty(), ptr),
            InstrKind::Store(value, ptr) => {
                write!(f, "store {} {}, {} {}", value.ty(), value, ptr.ty(), ptr)
            }
            InstrKind::Call { func, ret, args } => {
                write!(f, "call {} @{}(", ret, func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", arg.ty(), arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(None) => write!(f, "ret void"),
            Terminator::Ret(Some(v)) => write!(f, "ret {} {}", v.ty(), v),
            Terminator::Br(block) => write!(f, "br label %{}", block),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond, then_block, else_block
            ),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}
