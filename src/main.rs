//! Slanguage Compiler CLI
//!
//! The `slangc` command is the entry point for the Slanguage compiler: it
//! reads one source file, runs the lexer/parser/code-generator pipeline,
//! and writes the emitted LLVM IR to the output file.

use clap::Parser;
use slanguage::{ir, lexer, parser};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slangc")]
#[command(version = slanguage::VERSION)]
#[command(about = "The Slanguage Compiler", long_about = None)]
struct Cli {
    /// Slanguage source file to compile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Rename the emitted IR file
    #[arg(short = 'r', value_name = "NAME", default_value = "output.ll")]
    rename: PathBuf,

    /// Also print the emitted IR on standard output
    #[arg(short = 'e')]
    emit_ir: bool,

    /// Enable verbose debug output
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> miette::Result<()> {
    // clap exits 0 for -h and 2 for usage errors; the compiler's contract
    // is exit code 1 for both, after the usage output.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let source = fs::read_to_string(&cli.input)
        .map_err(|e| miette::miette!("error opening file {}: {}", cli.input.display(), e))?;

    if cli.verbose {
        println!("=== Tokens ===");
        match lexer::lex(&source) {
            Ok(tokens) => {
                for token in &tokens {
                    println!(
                        "{:>4}..{:<4} {:?} {:?}",
                        token.span.start,
                        token.span.end,
                        token.kind,
                        token.text(&source)
                    );
                }
            }
            Err(err) => eprintln!("lex error: {}", err),
        }
    }

    let ast = parser::parse(&source).map_err(|e| miette::miette!("parse error: {}", e))?;

    if cli.verbose {
        println!("\n=== AST ===");
        println!("{:#?}", ast);
    }

    let module = ir::lower_module(&ast).map_err(|e| miette::miette!("codegen error: {}", e))?;
    let ir_text = ir::emit_module(&module);

    if cli.emit_ir {
        print!("{}", ir_text);
    }

    fs::write(&cli.rename, &ir_text)
        .map_err(|e| miette::miette!("error writing {}: {}", cli.rename.display(), e))?;

    Ok(())
}
