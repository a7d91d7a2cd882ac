//! Recursive-descent parser for Jack source (spec's §6 parse-tree contract).
//!
//! An external collaborator per the core's purview — the codegen never sees
//! a [`Token`](crate::token::Token), only the [`ParseNode`] trees built here.
//! Grammar and node shapes follow spec's §6 verbatim; this module owns no
//! semantic knowledge (no symbol table, no VM segments).

use crate::token::{Token, TokenKind};
use crate::tree::{NodeKind, ParseNode};

/// A syntax error: the token stream does not match the Jack grammar at the
/// current position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse a full class from its token stream.
pub fn parse(tokens: Vec<Token>) -> Result<ParseNode, ParseError> {
    let mut parser = Parser { tokens, pos: 0 };
    let class = parser.parse_class()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("unexpected trailing tokens after class declaration"));
    }
    Ok(class)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

const CLASS_VAR_KEYWORDS: &[&str] = &["static", "field"];
const SUBROUTINE_KEYWORDS: &[&str] = &["constructor", "function", "method"];
const TYPE_KEYWORDS: &[&str] = &["int", "char", "boolean"];
const BINARY_OPS: &str = "+-*/&|<>=";
const UNARY_OPS: &str = "-~";
const STATEMENT_KEYWORDS: &[&str] = &["let", "if", "while", "do", "return"];

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.current_line(),
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check_symbol(&self, lexeme: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Symbol && t.lexeme == lexeme)
    }

    fn check_keyword(&self, lexeme: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Keyword && t.lexeme == lexeme)
    }

    fn check_keyword_in(&self, set: &[&str]) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Keyword && set.contains(&t.lexeme.as_str()))
    }

    fn expect_symbol(&mut self, lexeme: &str) -> Result<ParseNode, ParseError> {
        if self.check_symbol(lexeme) {
            Ok(ParseNode::terminal(NodeKind::Symbol, self.advance().unwrap().lexeme))
        } else {
            Err(self.error(format!("expected symbol '{lexeme}'")))
        }
    }

    fn expect_keyword_in(&mut self, set: &[&str]) -> Result<ParseNode, ParseError> {
        if self.check_keyword_in(set) {
            Ok(ParseNode::terminal(NodeKind::Keyword, self.advance().unwrap().lexeme))
        } else {
            Err(self.error(format!("expected one of {set:?}")))
        }
    }

    fn expect_identifier(&mut self) -> Result<ParseNode, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => {
                Ok(ParseNode::terminal(NodeKind::Identifier, self.advance().unwrap().lexeme))
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// A `<type>` node: `int` / `char` / `boolean` keyword, or a class-name
    /// identifier.
    fn parse_type(&mut self) -> Result<ParseNode, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Keyword && TYPE_KEYWORDS.contains(&t.lexeme.as_str()) => {
                Ok(ParseNode::terminal(NodeKind::Keyword, self.advance().unwrap().lexeme))
            }
            Some(t) if t.kind == TokenKind::Identifier => {
                Ok(ParseNode::terminal(NodeKind::Identifier, self.advance().unwrap().lexeme))
            }
            _ => Err(self.error("expected a type")),
        }
    }

    fn parse_class(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![
            self.expect_keyword_in(&["class"])?,
            self.expect_identifier()?,
            self.expect_symbol("{")?,
        ];

        while self.check_keyword_in(CLASS_VAR_KEYWORDS) {
            children.push(self.parse_class_var_dec()?);
        }
        while self.check_keyword_in(SUBROUTINE_KEYWORDS) {
            children.push(self.parse_subroutine_dec()?);
        }
        children.push(self.expect_symbol("}")?);

        Ok(ParseNode::nonterminal(NodeKind::Class, children))
    }

    fn parse_class_var_dec(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![
            self.expect_keyword_in(CLASS_VAR_KEYWORDS)?,
            self.parse_type()?,
            self.expect_identifier()?,
        ];
        while self.check_symbol(",") {
            children.push(self.expect_symbol(",")?);
            children.push(self.expect_identifier()?);
        }
        children.push(self.expect_symbol(";")?);
        Ok(ParseNode::nonterminal(NodeKind::ClassVarDec, children))
    }

    fn parse_subroutine_dec(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.expect_keyword_in(SUBROUTINE_KEYWORDS)?];

        // Return type: `void` or a <type>.
        if self.check_keyword("void") {
            children.push(ParseNode::terminal(NodeKind::Keyword, self.advance().unwrap().lexeme));
        } else {
            children.push(self.parse_type()?);
        }

        children.push(self.expect_identifier()?);
        children.push(self.expect_symbol("(")?);
        children.push(self.parse_parameter_list()?);
        children.push(self.expect_symbol(")")?);
        children.push(self.parse_subroutine_body()?);

        Ok(ParseNode::nonterminal(NodeKind::SubroutineDec, children))
    }

    fn parse_parameter_list(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = Vec::new();
        if self.check_symbol(")") {
            return Ok(ParseNode::nonterminal(NodeKind::ParameterList, children));
        }

        children.push(self.parse_type()?);
        children.push(self.expect_identifier()?);
        while self.check_symbol(",") {
            children.push(self.expect_symbol(",")?);
            children.push(self.parse_type()?);
            children.push(self.expect_identifier()?);
        }

        Ok(ParseNode::nonterminal(NodeKind::ParameterList, children))
    }

    fn parse_subroutine_body(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.expect_symbol("{")?];
        while self.check_keyword("var") {
            children.push(self.parse_var_dec()?);
        }
        children.push(self.parse_statements()?);
        children.push(self.expect_symbol("}")?);
        Ok(ParseNode::nonterminal(NodeKind::SubroutineBody, children))
    }

    fn parse_var_dec(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![
            self.expect_keyword_in(&["var"])?,
            self.parse_type()?,
            self.expect_identifier()?,
        ];
        while self.check_symbol(",") {
            children.push(self.expect_symbol(",")?);
            children.push(self.expect_identifier()?);
        }
        children.push(self.expect_symbol(";")?);
        Ok(ParseNode::nonterminal(NodeKind::VarDec, children))
    }

    fn parse_statements(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = Vec::new();
        while self.check_keyword_in(STATEMENT_KEYWORDS) {
            children.push(self.parse_statement()?);
        }
        Ok(ParseNode::nonterminal(NodeKind::Statements, children))
    }

    fn parse_statement(&mut self) -> Result<ParseNode, ParseError> {
        match self.peek().map(|t| t.lexeme.as_str()) {
            Some("let") => self.parse_let_statement(),
            Some("if") => self.parse_if_statement(),
            Some("while") => self.parse_while_statement(),
            Some("do") => self.parse_do_statement(),
            Some("return") => self.parse_return_statement(),
            _ => Err(self.error("expected a statement")),
        }
    }

    fn parse_let_statement(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.expect_keyword_in(&["let"])?, self.expect_identifier()?];
        if self.check_symbol("[") {
            children.push(self.expect_symbol("[")?);
            children.push(self.parse_expression()?);
            children.push(self.expect_symbol("]")?);
        }
        children.push(self.expect_symbol("=")?);
        children.push(self.parse_expression()?);
        children.push(self.expect_symbol(";")?);
        Ok(ParseNode::nonterminal(NodeKind::LetStatement, children))
    }

    fn parse_if_statement(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![
            self.expect_keyword_in(&["if"])?,
            self.expect_symbol("(")?,
            self.parse_expression()?,
            self.expect_symbol(")")?,
            self.expect_symbol("{")?,
            self.parse_statements()?,
            self.expect_symbol("}")?,
        ];
        if self.check_keyword("else") {
            children.push(ParseNode::terminal(NodeKind::Keyword, self.advance().unwrap().lexeme));
            children.push(self.expect_symbol("{")?);
            children.push(self.parse_statements()?);
            children.push(self.expect_symbol("}")?);
        }
        Ok(ParseNode::nonterminal(NodeKind::IfStatement, children))
    }

    fn parse_while_statement(&mut self) -> Result<ParseNode, ParseError> {
        let children = vec![
            self.expect_keyword_in(&["while"])?,
            self.expect_symbol("(")?,
            self.parse_expression()?,
            self.expect_symbol(")")?,
            self.expect_symbol("{")?,
            self.parse_statements()?,
            self.expect_symbol("}")?,
        ];
        Ok(ParseNode::nonterminal(NodeKind::WhileStatement, children))
    }

    fn parse_do_statement(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.expect_keyword_in(&["do"])?];
        children.extend(self.parse_call_children()?);
        children.push(self.expect_symbol(";")?);
        Ok(ParseNode::nonterminal(NodeKind::DoStatement, children))
    }

    fn parse_return_statement(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.expect_keyword_in(&["return"])?];
        if !self.check_symbol(";") {
            children.push(self.parse_expression()?);
        }
        children.push(self.expect_symbol(";")?);
        Ok(ParseNode::nonterminal(NodeKind::ReturnStatement, children))
    }

    fn parse_expression(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.parse_term()?];
        while let Some(t) = self.peek() {
            if t.kind == TokenKind::Symbol && BINARY_OPS.contains(t.lexeme.as_str()) && t.lexeme.len() == 1 {
                children.push(ParseNode::terminal(NodeKind::Symbol, self.advance().unwrap().lexeme));
                children.push(self.parse_term()?);
            } else {
                break;
            }
        }
        Ok(ParseNode::nonterminal(NodeKind::Expression, children))
    }

    fn parse_term(&mut self) -> Result<ParseNode, ParseError> {
        let children = match self.peek() {
            Some(t) if t.kind == TokenKind::IntegerConstant => {
                vec![ParseNode::terminal(NodeKind::IntegerConstant, self.advance().unwrap().lexeme)]
            }
            Some(t) if t.kind == TokenKind::StringConstant => {
                vec![ParseNode::terminal(NodeKind::StringConstant, self.advance().unwrap().lexeme)]
            }
            Some(t) if t.kind == TokenKind::Keyword && ["true", "false", "null", "this"].contains(&t.lexeme.as_str()) => {
                vec![ParseNode::terminal(NodeKind::Keyword, self.advance().unwrap().lexeme)]
            }
            Some(t) if t.kind == TokenKind::Symbol && t.lexeme == "(" => {
                vec![
                    self.expect_symbol("(")?,
                    self.parse_expression()?,
                    self.expect_symbol(")")?,
                ]
            }
            Some(t) if t.kind == TokenKind::Symbol && UNARY_OPS.contains(t.lexeme.as_str()) && t.lexeme.len() == 1 => {
                vec![
                    ParseNode::terminal(NodeKind::Symbol, self.advance().unwrap().lexeme),
                    self.parse_term()?,
                ]
            }
            Some(t) if t.kind == TokenKind::Identifier => self.parse_identifier_term()?,
            _ => return Err(self.error("expected a term")),
        };
        Ok(ParseNode::nonterminal(NodeKind::Term, children))
    }

    /// The four shapes a term starting with an identifier can take: a bare
    /// variable, an array access `v[e]`, an unqualified call `f(args)`, or
    /// a qualified call `R.f(args)`.
    fn parse_identifier_term(&mut self) -> Result<Vec<ParseNode>, ParseError> {
        if self.peek_nth_is_symbol(1, "[") {
            let name = self.expect_identifier()?;
            let bracket_open = self.expect_symbol("[")?;
            let index = self.parse_expression()?;
            let bracket_close = self.expect_symbol("]")?;
            return Ok(vec![name, bracket_open, index, bracket_close]);
        }

        if self.peek_nth_is_symbol(1, "(") || self.peek_nth_is_symbol(1, ".") {
            return self.parse_call_children();
        }

        Ok(vec![self.expect_identifier()?])
    }

    fn peek_nth_is_symbol(&self, offset: usize, lexeme: &str) -> bool {
        matches!(self.tokens.get(self.pos + offset), Some(t) if t.kind == TokenKind::Symbol && t.lexeme == lexeme)
    }

    /// Parses the flat child sequence of a subroutine call: either
    /// `identifier, "(", expressionList, ")"` (unqualified) or
    /// `identifier, ".", identifier, "(", expressionList, ")"` (qualified).
    /// Shared by `term` and `doStatement`, which embed these children
    /// directly rather than wrapping them in their own node.
    fn parse_call_children(&mut self) -> Result<Vec<ParseNode>, ParseError> {
        let mut children = vec![self.expect_identifier()?];
        if self.check_symbol(".") {
            children.push(self.expect_symbol(".")?);
            children.push(self.expect_identifier()?);
        }
        children.push(self.expect_symbol("(")?);
        children.push(self.parse_expression_list()?);
        children.push(self.expect_symbol(")")?);
        Ok(children)
    }

    fn parse_expression_list(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = Vec::new();
        if self.check_symbol(")") {
            return Ok(ParseNode::nonterminal(NodeKind::ExpressionList, children));
        }
        children.push(self.parse_expression()?);
        while self.check_symbol(",") {
            children.push(self.expect_symbol(",")?);
            children.push(self.parse_expression()?);
        }
        Ok(ParseNode::nonterminal(NodeKind::ExpressionList, children))
    }
}
