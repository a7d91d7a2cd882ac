//! The parse tree the core consumes (spec's §3 "Parse Node", §6 grammar).
//!
//! Deliberately a generic tagged n-ary tree rather than a typed AST — see
//! SPEC_FULL.md for why. Terminal nodes (one variant per [`crate::token::TokenKind`])
//! carry a lexeme and no children; nonterminal nodes (one variant per grammar
//! rule in spec's §6) carry children and no value. Children order is
//! semantically significant throughout.

use std::fmt;

/// A node's grammar classification: either a terminal tag (identical to a
/// token tag) or a nonterminal naming the grammar rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    // Terminals — tags identical to token tags.
    Keyword,
    Symbol,
    Identifier,
    IntegerConstant,
    StringConstant,

    // Nonterminals — grammar rules from spec's §6.
    Class,
    ClassVarDec,
    SubroutineDec,
    ParameterList,
    SubroutineBody,
    VarDec,
    Statements,
    LetStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ReturnStatement,
    Expression,
    Term,
    ExpressionList,
}

impl NodeKind {
    /// True for the five terminal tags.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeKind::Keyword
                | NodeKind::Symbol
                | NodeKind::Identifier
                | NodeKind::IntegerConstant
                | NodeKind::StringConstant
        )
    }

    /// The grammar name, as it would appear in an error message or a tree
    /// dump — matches the node names spec's §6 uses.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Keyword => "keyword",
            NodeKind::Symbol => "symbol",
            NodeKind::Identifier => "identifier",
            NodeKind::IntegerConstant => "integerConstant",
            NodeKind::StringConstant => "stringConstant",
            NodeKind::Class => "class",
            NodeKind::ClassVarDec => "classVarDec",
            NodeKind::SubroutineDec => "subroutineDec",
            NodeKind::ParameterList => "parameterList",
            NodeKind::SubroutineBody => "subroutineBody",
            NodeKind::VarDec => "varDec",
            NodeKind::Statements => "statements",
            NodeKind::LetStatement => "letStatement",
            NodeKind::IfStatement => "ifStatement",
            NodeKind::WhileStatement => "whileStatement",
            NodeKind::DoStatement => "doStatement",
            NodeKind::ReturnStatement => "returnStatement",
            NodeKind::Expression => "expression",
            NodeKind::Term => "term",
            NodeKind::ExpressionList => "expressionList",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A node in the parse tree. Terminal nodes have `value: Some(lexeme)` and
/// empty `children`; nonterminal nodes have `value: None` and the rule's
/// children in grammar order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub value: Option<String>,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    /// Build a terminal node from a token's kind and lexeme.
    pub fn terminal(kind: NodeKind, value: impl Into<String>) -> Self {
        debug_assert!(kind.is_terminal(), "terminal() called with nonterminal kind {kind}");
        ParseNode {
            kind,
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Build a nonterminal node from its ordered children.
    pub fn nonterminal(kind: NodeKind, children: Vec<ParseNode>) -> Self {
        debug_assert!(!kind.is_terminal(), "nonterminal() called with terminal kind {kind}");
        ParseNode {
            kind,
            value: None,
            children,
        }
    }

    /// True if this is the terminal `symbol` node with the given lexeme.
    pub fn is_symbol(&self, lexeme: &str) -> bool {
        self.kind == NodeKind::Symbol && self.value.as_deref() == Some(lexeme)
    }

    /// True if this is the terminal `keyword` node with the given lexeme.
    pub fn is_keyword(&self, lexeme: &str) -> bool {
        self.kind == NodeKind::Keyword && self.value.as_deref() == Some(lexeme)
    }

    /// The lexeme of a terminal node, or `None` for a nonterminal.
    pub fn lexeme(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// First direct child of the given kind, if any — mirrors the original
    /// Go implementation's `Node.Find` (see `original_source/parser/node.go`).
    pub fn find(&self, kind: NodeKind) -> Option<&ParseNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All direct children of the given kind, in order — mirrors
    /// `Node.FindAll` in the original.
    pub fn find_all(&self, kind: NodeKind) -> Vec<&ParseNode> {
        self.children.iter().filter(|c| c.kind == kind).collect()
    }

    /// Index of the first direct child that is the symbol terminal
    /// `lexeme`, if any. Used by the call-dispatch classification in §4.4.
    pub fn index_of_symbol(&self, lexeme: &str) -> Option<usize> {
        self.children.iter().position(|c| c.is_symbol(lexeme))
    }
}
