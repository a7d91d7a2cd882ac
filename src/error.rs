//! Core-level errors (spec's §7).
//!
//! Distinct from [`crate::lexer::LexError`] and [`crate::parser::ParseError`]:
//! those fail before a tree exists. `CompileError` is raised while walking an
//! already-built [`crate::tree::ParseNode`] tree and turning it into VM text.

use std::fmt;

/// Something went wrong turning a parse tree into VM code.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A name (variable, subroutine, or class) has no entry in scope.
    UnresolvedIdentifier(String),
    /// The parse tree does not match the shape the compiler expects at this
    /// point — e.g. a `term` node with an unrecognized child arrangement.
    MalformedTree(String),
    /// A symbol lexeme appeared where an operator was expected but does not
    /// name one.
    InvalidOperator(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnresolvedIdentifier(name) => {
                write!(f, "unresolved identifier '{name}'")
            }
            CompileError::MalformedTree(detail) => {
                write!(f, "malformed parse tree: {detail}")
            }
            CompileError::InvalidOperator(lexeme) => {
                write!(f, "invalid operator '{lexeme}'")
            }
        }
    }
}

impl std::error::Error for CompileError {}
