//! AST lowering
//!
//! Walks the module AST and drives the [`IrBuilder`] to produce an IR
//! module. The lowerer keeps a per-function scope map from variable names
//! to their stack slots and a stack of loop contexts (condition block,
//! merge block) so `ghost` and `rizz` know where to branch.

use std::collections::HashMap;

use super::builder::IrBuilder;
use super::instr::CmpOp;
use super::types::{BlockId, IrType, Module, VReg, Value};
use crate::ast::{self, BinOp, Expr, Stmt, UnaryOp, VALUE_SINK, VOID_TYPE};
use thiserror::Error;

/// Code generation errors
///
/// All of these are fatal for the running compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("unknown type name: {0}")]
    UnknownType(String),

    #[error("unknown variable name: {0}")]
    UnknownVariable(String),

    #[error("unknown function referenced: {0}")]
    UnknownFunction(String),

    #[error("function {name} is defined more than once")]
    DuplicateFunction { name: String },

    #[error("call to {name} expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of call to {name} has type {found}, expected {expected}")]
    ArgumentTypeMismatch {
        name: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("mismatched operand types for {op}: {lhs} and {rhs}")]
    MixedOperands {
        op: String,
        lhs: String,
        rhs: String,
    },

    #[error("unsupported operand type for {op}: {ty}")]
    UnsupportedOperand { op: String, ty: String },

    #[error("condition must be a bool, got {0}")]
    NonBoolCondition(String),

    #[error("cannot store {found} into {name} of type {expected}")]
    StoreTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("return value has type {found}, expected {expected}")]
    ReturnTypeMismatch { expected: String, found: String },

    #[error("ghost outside of a loop")]
    BreakOutsideLoop,

    #[error("rizz outside of a loop")]
    ContinueOutsideLoop,

    #[error("call to {0} used as a value but it returns npc")]
    VoidValue(String),
}

/// Map a surface type name to its IR type
fn map_type(name: &str) -> Result<IrType, CodegenError> {
    match name {
        "int" => Ok(IrType::I32),
        "float" => Ok(IrType::F64),
        "bool" => Ok(IrType::Bool),
        "char" => Ok(IrType::I8),
        "string" => Ok(IrType::ptr(IrType::I8)),
        VOID_TYPE => Ok(IrType::Void),
        other => Err(CodegenError::UnknownType(other.to_string())),
    }
}

/// A registered function signature
#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<IrType>,
    ret: IrType,
}

/// Branch targets for the innermost enclosing loop
#[derive(Debug, Clone, Copy)]
struct LoopContext {
    /// Block to jump to on `rizz` (condition check)
    condition_block: BlockId,
    /// Block to jump to on `ghost` (loop exit)
    merge_block: BlockId,
}

/// Lower a module AST to an IR module
pub fn lower_module(module: &ast::Module) -> Result<Module, CodegenError> {
    Lowerer::new(&module.name).lower(module)
}

/// Lowers AST to IR
pub struct Lowerer {
    builder: IrBuilder,
    /// Map from variable names to their stack slots and value types
    locals: HashMap<String, (VReg, IrType)>,
    /// Map from function names to their signatures
    signatures: HashMap<String, FnSig>,
    /// Stack of loop contexts for `ghost`/`rizz`
    loop_stack: Vec<LoopContext>,
    /// Return type of the function currently being lowered
    current_ret: IrType,
}

impl Lowerer {
    pub fn new(module_name: &str) -> Self {
        Self {
            builder: IrBuilder::new(module_name),
            locals: HashMap::new(),
            signatures: HashMap::new(),
            loop_stack: Vec::new(),
            current_ret: IrType::Void,
        }
    }

    /// Lower the whole module: register every signature first so calls can
    /// reference functions declared later in the file, then emit each
    /// declaration in source order.
    pub fn lower(mut self, module: &ast::Module) -> Result<Module, CodegenError> {
        for func in &module.functions {
            let params = func
                .proto
                .params
                .iter()
                .map(|p| map_type(&p.ty))
                .collect::<Result<Vec<_>, _>>()?;
            let ret = map_type(&func.proto.return_type)?;
            let sig = FnSig { params, ret };
            if self
                .signatures
                .insert(func.proto.name.clone(), sig)
                .is_some()
            {
                return Err(CodegenError::DuplicateFunction {
                    name: func.proto.name.clone(),
                });
            }
        }

        for func in &module.functions {
            let sig = self.signatures[&func.proto.name].clone();
            match &func.body {
                None => {
                    self.builder
                        .declare_external(&func.proto.name, sig.params, sig.ret);
                }
                Some(body) => self.lower_function(&func.proto, &sig, body)?,
            }
        }

        Ok(self.builder.finish())
    }

    /// Lower one function definition: entry block, fresh scope, one slot
    /// per parameter, the body, and an implicit return for void functions.
    fn lower_function(
        &mut self,
        proto: &ast::Prototype,
        sig: &FnSig,
        body: &Stmt,
    ) -> Result<(), CodegenError> {
        let param_vregs =
            self.builder
                .start_function(&proto.name, sig.params.clone(), sig.ret.clone());
        self.locals.clear();
        self.current_ret = sig.ret.clone();

        for (param, (vreg, ty)) in proto
            .params
            .iter()
            .zip(param_vregs.into_iter().zip(sig.params.iter().cloned()))
        {
            let slot = self.builder.alloca(ty.clone());
            self.builder
                .store(Value::Reg(vreg, ty.clone()), slot_ptr(slot, &ty));
            self.locals.insert(param.name.clone(), (slot, ty));
        }

        self.lower_stmt(body)?;

        if !self.builder.is_terminated() {
            if self.current_ret == IrType::Void {
                self.builder.ret(None);
            } else {
                // The parser's return-path check keeps this unreachable
                self.builder.unreachable();
            }
        }

        self.builder.finish_function();
        Ok(())
    }

    // ============ Statements ============

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Declare { name, ty } => {
                let ty = map_type(ty)?;
                let slot = self.builder.alloca(ty.clone());
                self.locals.insert(name.clone(), (slot, ty));
            }

            Stmt::DeclareInit { name, ty, value } => {
                let ty = map_type(ty)?;
                let v = self.lower_expr(value)?;
                if v.ty() != ty {
                    return Err(CodegenError::StoreTypeMismatch {
                        name: name.clone(),
                        expected: ty.to_string(),
                        found: v.ty().to_string(),
                    });
                }
                let slot = self.builder.alloca(ty.clone());
                self.builder.store(v, slot_ptr(slot, &ty));
                self.locals.insert(name.clone(), (slot, ty));
            }

            Stmt::Assign { name, value } if name == VALUE_SINK => {
                // Call used as a statement; the produced value is dropped.
                match value {
                    Expr::Call { callee, args } => {
                        self.lower_call(callee, args)?;
                    }
                    other => {
                        self.lower_expr(other)?;
                    }
                }
            }

            Stmt::Assign { name, value } => {
                let v = self.lower_expr(value)?;
                let (slot, ty) = self
                    .locals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CodegenError::UnknownVariable(name.clone()))?;
                if v.ty() != ty {
                    return Err(CodegenError::StoreTypeMismatch {
                        name: name.clone(),
                        expected: ty.to_string(),
                        found: v.ty().to_string(),
                    });
                }
                self.builder.store(v, slot_ptr(slot, &ty));
            }

            Stmt::Compound(statements) => {
                for statement in statements {
                    self.lower_stmt(statement)?;
                    // A return/ghost/rizz terminated the block; anything
                    // after it in this compound is dead.
                    if self.builder.is_terminated() {
                        break;
                    }
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch)?,

            Stmt::While { condition, body } => self.lower_while(condition, body)?,

            Stmt::Break => {
                let ctx = self
                    .loop_stack
                    .last()
                    .copied()
                    .ok_or(CodegenError::BreakOutsideLoop)?;
                self.builder.br(ctx.merge_block);
            }

            Stmt::Continue => {
                let ctx = self
                    .loop_stack
                    .last()
                    .copied()
                    .ok_or(CodegenError::ContinueOutsideLoop)?;
                self.builder.br(ctx.condition_block);
            }

            Stmt::Return(expr) => {
                let v = self.lower_expr(expr)?;
                if v.ty() != self.current_ret {
                    return Err(CodegenError::ReturnTypeMismatch {
                        expected: self.current_ret.to_string(),
                        found: v.ty().to_string(),
                    });
                }
                self.builder.ret(Some(v));
            }
        }
        Ok(())
    }

    /// Conditional: then/else/merge triple. Branches that did not already
    /// terminate fall through to merge; the builder is left at merge. When
    /// both branches terminate, merge stays an unreferenced block.
    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<(), CodegenError> {
        let cond = self.lower_condition(condition)?;

        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        self.builder.cond_br(cond, then_block, else_block);

        self.builder.start_block(then_block);
        self.lower_stmt(then_branch)?;
        if !self.builder.is_terminated() {
            self.builder.br(merge_block);
        }

        self.builder.start_block(else_block);
        self.lower_stmt(else_branch)?;
        if !self.builder.is_terminated() {
            self.builder.br(merge_block);
        }

        self.builder.start_block(merge_block);
        Ok(())
    }

    /// While loop: cond/body/merge triple with the loop context pushed
    /// around the body (stack discipline for nested loops).
    fn lower_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), CodegenError> {
        let condition_block = self.builder.create_block();
        let body_block = self.builder.create_block();
        let merge_block = self.builder.create_block();

        self.builder.br(condition_block);
        self.builder.start_block(condition_block);
        let cond = self.lower_condition(condition)?;
        self.builder.cond_br(cond, body_block, merge_block);

        self.builder.start_block(body_block);
        self.loop_stack.push(LoopContext {
            condition_block,
            merge_block,
        });
        let body_result = self.lower_stmt(body);
        self.loop_stack.pop();
        body_result?;
        if !self.builder.is_terminated() {
            self.builder.br(condition_block);
        }

        self.builder.start_block(merge_block);
        Ok(())
    }

    fn lower_condition(&mut self, condition: &Expr) -> Result<Value, CodegenError> {
        let cond = self.lower_expr(condition)?;
        if cond.ty() != IrType::Bool {
            return Err(CodegenError::NonBoolCondition(cond.ty().to_string()));
        }
        Ok(cond)
    }

    // ============ Expressions ============

    fn lower_expr(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        match expr {
            Expr::Int(v) => Ok(Value::ConstInt(*v as i64, IrType::I32)),
            Expr::Float(v) => Ok(Value::ConstFloat(*v)),
            Expr::Bool(b) => Ok(Value::ConstBool(*b)),
            Expr::Char(c) => Ok(Value::ConstInt(*c as u8 as i64, IrType::I8)),
            Expr::Str(s) => Ok(self.builder.add_string_constant(s)),

            Expr::Variable(name) => {
                let (slot, ty) = self
                    .locals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CodegenError::UnknownVariable(name.clone()))?;
                Ok(self.builder.load(ty.clone(), slot_ptr(slot, &ty)))
            }

            Expr::Unary { op, operand } => {
                let v = self.lower_expr(operand)?;
                match op {
                    UnaryOp::Plus => Ok(v),
                    UnaryOp::Neg if v.ty().is_float() => Ok(self.builder.fneg(v)),
                    UnaryOp::Neg if v.ty().is_int() => Ok(self.builder.neg(v)),
                    UnaryOp::Not if v.ty() == IrType::Bool => Ok(self.builder.not(v)),
                    _ => Err(CodegenError::UnsupportedOperand {
                        op: op.to_string(),
                        ty: v.ty().to_string(),
                    }),
                }
            }

            Expr::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs),

            Expr::Call { callee, args } => match self.lower_call(callee, args)? {
                Some(v) => Ok(v),
                None => Err(CodegenError::VoidValue(callee.clone())),
            },
        }
    }

    /// Binary operations dispatch on the operand type: integer variants
    /// for i32 (and i8), floating variants for double. Mixed operand
    /// types are rejected rather than coerced.
    fn lower_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Value, CodegenError> {
        let lv = self.lower_expr(lhs)?;
        let rv = self.lower_expr(rhs)?;
        if lv.ty() != rv.ty() {
            return Err(CodegenError::MixedOperands {
                op: op.to_string(),
                lhs: lv.ty().to_string(),
                rhs: rv.ty().to_string(),
            });
        }
        let ty = lv.ty();

        if op.is_comparison() {
            let cmp = match op {
                BinOp::Eq => CmpOp::Eq,
                BinOp::Ne => CmpOp::Ne,
                BinOp::Lt => CmpOp::Lt,
                BinOp::Le => CmpOp::Le,
                BinOp::Gt => CmpOp::Gt,
                BinOp::Ge => CmpOp::Ge,
                _ => unreachable!("non-comparison handled above"),
            };
            if ty.is_float() {
                return Ok(self.builder.fcmp(cmp, lv, rv));
            }
            if ty.is_int() || ty == IrType::Bool {
                return Ok(self.builder.icmp(cmp, lv, rv));
            }
        } else if ty.is_float() {
            return Ok(match op {
                BinOp::Add => self.builder.fadd(lv, rv),
                BinOp::Sub => self.builder.fsub(lv, rv),
                BinOp::Mul => self.builder.fmul(lv, rv),
                BinOp::Div => self.builder.fdiv(lv, rv),
                BinOp::Rem => self.builder.frem(lv, rv),
                _ => unreachable!("comparison handled above"),
            });
        } else if ty.is_int() {
            return Ok(match op {
                BinOp::Add => self.builder.add(lv, rv),
                BinOp::Sub => self.builder.sub(lv, rv),
                BinOp::Mul => self.builder.mul(lv, rv),
                BinOp::Div => self.builder.sdiv(lv, rv),
                BinOp::Rem => self.builder.srem(lv, rv),
                _ => unreachable!("comparison handled above"),
            });
        }

        Err(CodegenError::UnsupportedOperand {
            op: op.to_string(),
            ty: ty.to_string(),
        })
    }

    /// Look the callee up among the registered signatures, check arity and
    /// argument types, and evaluate arguments left to right. Returns None
    /// when the callee returns void.
    fn lower_call(
        &mut self,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<Value>, CodegenError> {
        let sig = self
            .signatures
            .get(callee)
            .cloned()
            .ok_or_else(|| CodegenError::UnknownFunction(callee.to_string()))?;

        if sig.params.len() != args.len() {
            return Err(CodegenError::ArityMismatch {
                name: callee.to_string(),
                expected: sig.params.len(),
                found: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (arg, expected)) in args.iter().zip(&sig.params).enumerate() {
            let v = self.lower_expr(arg)?;
            if v.ty() != *expected {
                return Err(CodegenError::ArgumentTypeMismatch {
                    name: callee.to_string(),
                    index: index + 1,
                    expected: expected.to_string(),
                    found: v.ty().to_string(),
                });
            }
            values.push(v);
        }

        Ok(self.builder.call(callee, sig.ret, values))
    }
}

fn slot_ptr(slot: VReg, ty: &IrType) -> Value {
    Value::Reg(slot, IrType::ptr(ty.clone()))
}
