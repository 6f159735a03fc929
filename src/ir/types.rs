//! IR Types
//!
//! Type and value representations for the Slanguage IR. The IR is a small
//! block-structured subset of LLVM IR, rich enough to express everything
//! the code generator emits and serialized textually by [`super::llvm`].

use std::fmt;

/// A virtual register (SSA value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%v{}", self.0)
    }
}

/// A basic block label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// IR types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    /// Void type (function returns only)
    Void,
    /// Boolean (i1)
    Bool,
    /// 8-bit integer (chars)
    I8,
    /// 32-bit signed integer
    I32,
    /// 64-bit float (double)
    F64,
    /// Pointer to another type
    Ptr(Box<IrType>),
    /// Array of elements (string constant globals)
    Array(Box<IrType>, usize),
}

impl IrType {
    pub fn ptr(inner: IrType) -> Self {
        IrType::Ptr(Box::new(inner))
    }

    /// Is this type an integer? (i1 is kept separate)
    pub fn is_int(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I32)
    }

    /// Is this type a float?
    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Bool => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::F64 => write!(f, "double"),
            // Opaque pointers, as current LLVM spells them
            IrType::Ptr(_) => write!(f, "ptr"),
            IrType::Array(elem, size) => write!(f, "[{} x {}]", size, elem),
        }
    }
}

/// An instruction operand: a register or an immediate constant
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A virtual register of the given type
    Reg(VReg, IrType),
    /// Integer constant (i8/i32)
    ConstInt(i64, IrType),
    /// Double constant
    ConstFloat(f64),
    /// Boolean constant
    ConstBool(bool),
    /// Address of a global (always pointer-typed)
    Global(String, IrType),
}

impl Value {
    /// The IR type of this operand
    pub fn ty(&self) -> IrType {
        match self {
            Value::Reg(_, ty) => ty.clone(),
            Value::ConstInt(_, ty) => ty.clone(),
            Value::ConstFloat(_) => IrType::F64,
            Value::ConstBool(_) => IrType::Bool,
            Value::Global(_, ty) => ty.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Reg(reg, _) => write!(f, "{}", reg),
            Value::ConstInt(v, _) => write!(f, "{}", v),
            // Exact bit pattern; decimal doubles do not always round-trip
            Value::ConstFloat(v) => write!(f, "0x{:016X}", v.to_bits()),
            Value::ConstBool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            Value::Global(name, _) => write!(f, "@{}", name),
        }
    }
}

/// A module contains functions and global string constants
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }
}

/// A function in the IR
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<(VReg, IrType)>,
    pub ret_type: IrType,
    pub blocks: Vec<BasicBlock>,
    pub is_external: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<(VReg, IrType)>, ret_type: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            ret_type,
            blocks: Vec::new(),
            is_external: false,
        }
    }
}

/// A basic block: a sequence of instructions plus one terminator
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<super::Instruction>,
    pub terminator: Option<super::Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

/// A private constant global holding a zero-terminated string literal
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub value: String,
}
