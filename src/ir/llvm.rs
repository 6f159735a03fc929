//! Textual LLVM IR emission
//!
//! Serializes a finished IR [`Module`] as LLVM assembly: string constant
//! globals, `declare` lines for externs, and `define` bodies with labeled
//! basic blocks. Pointers are emitted in the opaque `ptr` spelling.

use super::types::{Function, Global, IrType, Module};
use std::fmt::Write;

/// Render the module as textual LLVM IR
pub fn emit_module(module: &Module) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "; ModuleID = '{}'", module.name);
    let _ = writeln!(out, "source_filename = \"{}\"", module.name);

    if !module.globals.is_empty() {
        let _ = writeln!(out);
        for global in &module.globals {
            emit_global(&mut out, global);
        }
    }

    for func in &module.functions {
        let _ = writeln!(out);
        if func.is_external {
            emit_declaration(&mut out, func);
        } else {
            emit_definition(&mut out, func);
        }
    }

    out
}

fn emit_global(out: &mut String, global: &Global) {
    let ty = IrType::Array(Box::new(IrType::I8), global.value.len() + 1);
    let _ = writeln!(
        out,
        "@{} = private unnamed_addr constant {} c\"{}\"",
        global.name,
        ty,
        escape_string(&global.value),
    );
}

fn emit_declaration(out: &mut String, func: &Function) {
    let params: Vec<String> = func.params.iter().map(|(_, ty)| ty.to_string()).collect();
    let _ = writeln!(
        out,
        "declare {} @{}({})",
        func.ret_type,
        func.name,
        params.join(", ")
    );
}

fn emit_definition(out: &mut String, func: &Function) {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|(vreg, ty)| format!("{} {}", ty, vreg))
        .collect();
    let _ = writeln!(
        out,
        "define {} @{}({}) {{",
        func.ret_type,
        func.name,
        params.join(", ")
    );

    for block in &func.blocks {
        let _ = writeln!(out, "{}:", block.id);
        for instr in &block.instructions {
            let _ = writeln!(out, "  {}", instr);
        }
        if let Some(ref term) = block.terminator {
            let _ = writeln!(out, "  {}", term);
        }
    }

    let _ = writeln!(out, "}}");
}

/// Escape a string for a `c"..."` constant, appending the zero terminator.
/// Printable ASCII passes through; everything else (and `"` / `\`) becomes
/// `\XX` hex.
fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 3);
    for byte in value.bytes().chain(std::iter::once(0)) {
        match byte {
            b'"' | b'\\' => {
                let _ = write!(escaped, "\\{:02X}", byte);
            }
            0x20..=0x7e => escaped.push(byte as char),
            _ => {
                let _ = write!(escaped, "\\{:02X}", byte);
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::lower_module;
    use crate::parser;

    fn emit_source(source: &str) -> String {
        let ast = parser::parse(source).expect("parsing failed");
        emit_module(&lower_module(&ast).expect("lowering failed"))
    }

    #[test]
    fn test_module_header() {
        let ir = emit_source("spillingTheTeaAbout demo");
        assert!(ir.starts_with("; ModuleID = 'demo'\n"));
        assert!(ir.contains("source_filename = \"demo\""));
    }

    #[test]
    fn test_string_global_is_zero_terminated() {
        let ir = emit_source(
            "spillingTheTeaAbout demo \
             plug puts(s: string): int \
             pluh main(): int { puts(\"hey\") yeet 0 }",
        );
        assert!(ir.contains(
            "@.str.0 = private unnamed_addr constant [4 x i8] c\"hey\\00\""
        ));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(escape_string("hi"), "hi\\00");
        assert_eq!(escape_string("a\"b"), "a\\22b\\00");
        assert_eq!(escape_string("a\\b"), "a\\5Cb\\00");
        assert_eq!(escape_string("line\nbreak"), "line\\0Abreak\\00");
    }

    #[test]
    fn test_float_constants_use_bit_patterns() {
        let ir = emit_source("spillingTheTeaAbout demo pluh f(): float { yeet 2.0 }");
        assert!(ir.contains(&format!("ret double 0x{:016X}", 2.0f64.to_bits())));
    }

    #[test]
    fn test_every_block_is_labeled_and_terminated() {
        let ir = emit_source(
            "spillingTheTeaAbout demo \
             pluh f(a: int): int { \
                 fr? a < 0 { yeet 0 } \
                 holdUp a > 0 { a = a - 1 } \
                 yeet a \
             }",
        );
        let body: Vec<&str> = ir
            .lines()
            .skip_while(|l| !l.starts_with("define"))
            .collect();
        let labels = body.iter().filter(|l| l.ends_with(':')).count();
        let terminators = body
            .iter()
            .filter(|l| {
                let l = l.trim_start();
                l.starts_with("ret ") || l.starts_with("br ") || l == "unreachable"
            })
            .count();
        assert_eq!(labels, terminators);
    }

    #[test]
    fn test_definition_signature_shape() {
        let ir = emit_source(
            "spillingTheTeaAbout demo pluh f(a: int, b: float): int { yeet a }",
        );
        assert!(ir.contains("define i32 @f(i32 %v0, double %v1) {"));
    }
}
