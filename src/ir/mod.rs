//! Slanguage Intermediate Representation
//!
//! A small block-structured IR for the Slanguage compiler, close enough to
//! LLVM that [`llvm::emit_module`] can serialize it as legal LLVM assembly
//! without an LLVM dependency.

mod instr;
mod types;
mod builder;
mod lower;
mod llvm;

// Re-export in pipeline order
pub use instr::*;
pub use types::*;
pub use builder::*;
pub use lower::*;
pub use llvm::*;
