//! IR Builder
//!
//! Helper for constructing IR instructions and basic blocks. The builder
//! owns the module under construction and an insertion point (the current
//! block of the current function); the lowering pass drives it.

use super::instr::{CmpOp, InstrKind, Instruction, Terminator};
use super::types::{BasicBlock, BlockId, Function, Global, IrType, Module, VReg, Value};

/// Builder for constructing IR
pub struct IrBuilder {
    /// Next virtual register ID (per function)
    next_vreg: u32,
    /// Next block ID (per function)
    next_block: u32,
    /// Next string constant ID (per module)
    next_string: u32,
    /// Current module being built
    module: Module,
    /// Current function being built
    current_fn: Option<Function>,
    /// Current block being built
    current_block: Option<BasicBlock>,
}

impl IrBuilder {
    /// Create a new IR builder
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            next_vreg: 0,
            next_block: 0,
            next_string: 0,
            module: Module::new(module_name),
            current_fn: None,
            current_block: None,
        }
    }

    /// Finish building and return the module
    pub fn finish(mut self) -> Module {
        self.finish_function();
        self.module
    }

    fn fresh_vreg(&mut self) -> VReg {
        let vreg = VReg(self.next_vreg);
        self.next_vreg += 1;
        vreg
    }

    fn fresh_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    // ============ Function Building ============

    /// Start building a new function; registers and blocks are numbered per
    /// function. Creates the entry block and returns the parameter vregs.
    pub fn start_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret_type: IrType,
    ) -> Vec<VReg> {
        self.finish_function();
        self.next_vreg = 0;
        self.next_block = 0;

        let param_vregs: Vec<(VReg, IrType)> = params
            .into_iter()
            .map(|ty| (self.fresh_vreg(), ty))
            .collect();
        let vregs: Vec<VReg> = param_vregs.iter().map(|(v, _)| *v).collect();

        self.current_fn = Some(Function::new(name, param_vregs, ret_type));

        let entry = self.fresh_block();
        self.current_block = Some(BasicBlock::new(entry));

        vregs
    }

    /// Finish the current function
    pub fn finish_function(&mut self) {
        if let Some(block) = self.current_block.take() {
            if let Some(ref mut func) = self.current_fn {
                func.blocks.push(block);
            }
        }
        if let Some(func) = self.current_fn.take() {
            self.module.functions.push(func);
        }
    }

    /// Declare an external function (an extern `plug` prototype)
    pub fn declare_external(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret_type: IrType,
    ) {
        let mut func = Function::new(name, vec![], ret_type);
        func.is_external = true;
        func.params = params.into_iter().map(|ty| (VReg(0), ty)).collect();
        self.module.functions.push(func);
    }

    /// Add a private zero-terminated string constant and return a pointer
    /// to it
    pub fn add_string_constant(&mut self, value: &str) -> Value {
        let name = format!(".str.{}", self.next_string);
        self.next_string += 1;

        self.module.globals.push(Global {
            name: name.clone(),
            value: value.to_string(),
        });

        Value::Global(name, IrType::ptr(IrType::I8))
    }

    // ============ Block Building ============

    /// Create a new block and return its ID
    pub fn create_block(&mut self) -> BlockId {
        self.fresh_block()
    }

    /// Start building a block (finishes the current block first)
    pub fn start_block(&mut self, id: BlockId) {
        if let Some(block) = self.current_block.take() {
            if let Some(ref mut func) = self.current_fn {
                func.blocks.push(block);
            }
        }
        self.current_block = Some(BasicBlock::new(id));
    }

    /// Whether the current block already has a terminator
    pub fn is_terminated(&self) -> bool {
        match self.current_block {
            Some(ref block) => block.terminator.is_some(),
            None => true,
        }
    }

    // ============ Instruction Emission ============

    fn emit(&mut self, result: Option<VReg>, kind: InstrKind) {
        if let Some(ref mut block) = self.current_block {
            block.instructions.push(Instruction::new(result, kind));
        }
    }

    fn emit_with_result(&mut self, ty: IrType, kind: InstrKind) -> Value {
        let result = self.fresh_vreg();
        self.emit(Some(result), kind);
        Value::Reg(result, ty)
    }

    // ============ Arithmetic ============

    pub fn add(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::Add(a, b))
    }

    pub fn sub(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::Sub(a, b))
    }

    pub fn mul(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::Mul(a, b))
    }

    pub fn sdiv(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::SDiv(a, b))
    }

    pub fn srem(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::SRem(a, b))
    }

    /// Integer negation: `sub ty 0, v`
    pub fn neg(&mut self, v: Value) -> Value {
        let zero = Value::ConstInt(0, v.ty());
        self.sub(zero, v)
    }

    pub fn fadd(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::FAdd(a, b))
    }

    pub fn fsub(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::FSub(a, b))
    }

    pub fn fmul(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::FMul(a, b))
    }

    pub fn fdiv(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::FDiv(a, b))
    }

    pub fn frem(&mut self, a: Value, b: Value) -> Value {
        self.emit_with_result(a.ty(), InstrKind::FRem(a, b))
    }

    pub fn fneg(&mut self, v: Value) -> Value {
        self.emit_with_result(v.ty(), InstrKind::FNeg(v))
    }

    /// Boolean negation: `xor i1 v, true`
    pub fn not(&mut self, v: Value) -> Value {
        self.emit_with_result(v.ty(), InstrKind::Xor(v, Value::ConstBool(true)))
    }

    // ============ Comparison ============

    pub fn icmp(&mut self, op: CmpOp, a: Value, b: Value) -> Value {
        self.emit_with_result(IrType::Bool, InstrKind::ICmp(op, a, b))
    }

    pub fn fcmp(&mut self, op: CmpOp, a: Value, b: Value) -> Value {
        self.emit_with_result(IrType::Bool, InstrKind::FCmp(op, a, b))
    }

    // ============ Memory ============

    /// Allocate a stack slot in the current function's entry block
    pub fn alloca(&mut self, ty: IrType) -> VReg {
        let result = self.fresh_vreg();
        let instr = Instruction::new(Some(result), InstrKind::Alloca(ty));
        match self.current_fn.as_mut().and_then(|f| f.blocks.first_mut()) {
            Some(entry) => entry.instructions.push(instr),
            // The entry block is still the current block
            None => {
                if let Some(block) = self.current_block.as_mut() {
                    block.instructions.push(instr);
                }
            }
        }
        result
    }

    pub fn load(&mut self, ty: IrType, ptr: Value) -> Value {
        self.emit_with_result(ty.clone(), InstrKind::Load(ty, ptr))
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        self.emit(None, InstrKind::Store(value, ptr));
    }

    // ============ Calls ============

    /// Emit a call; returns None when the callee returns void
    pub fn call(&mut self, func: impl Into<String>, ret: IrType, args: Vec<Value>) -> Option<Value> {
        let kind = InstrKind::Call {
            func: func.into(),
            ret: ret.clone(),
            args,
        };
        if ret == IrType::Void {
            self.emit(None, kind);
            None
        } else {
            Some(self.emit_with_result(ret, kind))
        }
    }

    // ============ Terminators ============

    pub fn ret(&mut self, value: Option<Value>) {
        if let Some(ref mut block) = self.current_block {
            block.terminator = Some(Terminator::Ret(value));
        }
    }

    pub fn br(&mut self, target: BlockId) {
        if let Some(ref mut block) = self.current_block {
            block.terminator = Some(Terminator::Br(target));
        }
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        if let Some(ref mut block) = self.current_block {
            block.terminator = Some(Terminator::CondBr {
                cond,
                then_block,
                else_block,
            });
        }
    }

    pub fn unreachable(&mut self) {
        if let Some(ref mut block) = self.current_block {
            block.terminator = Some(Terminator::Unreachable);
        }
    }
}
