//! Jack Compiler Library
//!
//! Compiles Jack class source text to Hack VM stack-machine instructions.
//!
//! # Key Concepts
//!
//! The pipeline is four stages, leaves first:
//!
//! 1. [`lexer`] splits source text into a flat [`token::Token`] stream.
//! 2. [`parser`] shapes that stream into a [`tree::ParseNode`] tree rooted
//!    at a `class` node (spec's §6 grammar).
//! 3. [`symbol_table`] classifies every identifier the tree references into
//!    a `{kind, type, index}` triple.
//! 4. [`codegen`] walks the tree, consulting the symbol table, and emits VM
//!    text — the only stage that encodes the Jack object model
//!    (constructor allocation, method `this` binding, array indexing, call
//!    dispatch).
//!
//! [`compile_source`] runs all four in sequence; [`compile_file`] adds file
//! I/O on top for the CLI driver.

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod symbol_table;
pub mod token;
pub mod tree;
pub mod types;

pub use codegen::compile_class;
pub use error::CompileError;
pub use lexer::{tokenize, LexError};
pub use parser::{parse, ParseError};
pub use printer::print_tree;
pub use symbol_table::{Symbol, SymbolKind, SymbolTable};
pub use tree::{NodeKind, ParseNode};
pub use types::Type;

use std::fmt;
use std::fs;
use std::path::Path;

/// The union of every way compiling a single class can fail, in pipeline
/// order: a lexical error can only happen before a parse error, which can
/// only happen before a core [`CompileError`].
#[derive(Debug)]
pub enum JackError {
    Lex(LexError),
    Parse(ParseError),
    Compile(CompileError),
    Io(String),
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JackError::Lex(e) => write!(f, "{e}"),
            JackError::Parse(e) => write!(f, "{e}"),
            JackError::Compile(e) => write!(f, "{e}"),
            JackError::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<LexError> for JackError {
    fn from(e: LexError) -> Self {
        JackError::Lex(e)
    }
}

impl From<ParseError> for JackError {
    fn from(e: ParseError) -> Self {
        JackError::Parse(e)
    }
}

impl From<CompileError> for JackError {
    fn from(e: CompileError) -> Self {
        JackError::Compile(e)
    }
}

/// Compile one class's full Jack source text to VM text.
///
/// Runs lex → parse → codegen; does not touch the filesystem. This is the
/// entry point the core's own tests and the fuzz suite drive directly.
pub fn compile_source(source: &str) -> Result<String, JackError> {
    let tokens = tokenize(source)?;
    let class = parse(tokens)?;
    Ok(compile_class(&class)?)
}

/// Compile one `.jack` source file to VM text, without writing it anywhere.
/// Shared by [`compile_file`] and any caller that wants to post-process the
/// output before deciding where it goes.
pub fn compile_file_to_string(source_path: &Path) -> Result<String, JackError> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| JackError::Io(format!("failed to read '{}': {e}", source_path.display())))?;
    compile_source(&source)
}

/// Compile a `.jack` source file, writing the resulting VM text to
/// `output_path`. The `jackc` CLI binary calls this once per input file,
/// adjacent-`.vm`-per-`.jack` per spec's §6 CLI contract.
pub fn compile_file(source_path: &Path, output_path: &Path) -> Result<(), JackError> {
    let vm_code = compile_file_to_string(source_path)?;
    fs::write(output_path, vm_code)
        .map_err(|e| JackError::Io(format!("failed to write '{}': {e}", output_path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_source_runs_the_full_pipeline() {
        let vm = compile_source("class Main { function void main() { return; } }").unwrap();
        assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
    }

    #[test]
    fn lex_errors_surface_through_jack_error() {
        let err = compile_source("class C { \"unterminated").unwrap_err();
        assert!(matches!(err, JackError::Lex(_)));
    }

    #[test]
    fn parse_errors_surface_through_jack_error() {
        let err = compile_source("class {").unwrap_err();
        assert!(matches!(err, JackError::Parse(_)));
    }

    #[test]
    fn compile_errors_surface_through_jack_error() {
        let err = compile_source("class C { function void f() { let y = 1; return; } }").unwrap_err();
        assert!(matches!(err, JackError::Compile(CompileError::UnresolvedIdentifier(_))));
    }

    #[test]
    fn compile_file_writes_adjacent_vm_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Main.jack");
        let output = dir.path().join("Main.vm");
        fs::write(&input, "class Main { function void main() { return; } }").unwrap();

        compile_file(&input, &output).unwrap();

        let vm = fs::read_to_string(&output).unwrap();
        assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
    }
}
