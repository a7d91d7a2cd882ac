//! The core: translates a completed parse tree into Hack VM text (spec's §4).
//!
//! This is the only module that touches [`SymbolTable`] and [`ParseNode`]
//! together. Expression compilation, statement compilation, and the
//! class/subroutine driver are kept as free functions over a shared `&mut
//! Context` rather than methods on a god object, following
//! `original_source/compiler/compiler.go`'s flat function layout — re-expressed
//! in safe Rust (slice recursion instead of in-place child-list mutation,
//! since the tree must not be mutated).

use crate::error::CompileError;
use crate::symbol_table::{SymbolKind, SymbolTable};
use crate::tree::{NodeKind, ParseNode};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Per-class mutable state threaded through compilation: the label counters,
/// reset at each subroutine boundary (spec's §3 "Lifecycle", §9).
#[derive(Default)]
struct LabelCounters {
    counts: HashMap<&'static str, usize>,
}

impl LabelCounters {
    fn reset(&mut self) {
        self.counts.clear();
    }

    fn fresh(&mut self, base: &'static str) -> String {
        let count = self.counts.entry(base).or_insert(0);
        let label = format!("{base}{count}");
        *count += 1;
        label
    }
}

/// Compile a single `class` parse tree into VM text.
///
/// This is the crate's main entry point for the core in isolation; see
/// [`crate::compile_source`] for the lexer+parser+codegen pipeline.
pub fn compile_class(class: &ParseNode) -> Result<String, CompileError> {
    if class.kind != NodeKind::Class {
        return Err(CompileError::MalformedTree(format!(
            "expected a class node, found {}",
            class.kind
        )));
    }

    let class_name = class
        .find(NodeKind::Identifier)
        .and_then(|n| n.lexeme())
        .ok_or_else(|| CompileError::MalformedTree("class node missing its name".to_string()))?;

    let mut class_table = SymbolTable::start_class(class_name);
    for var_dec in class.find_all(NodeKind::ClassVarDec) {
        define_class_var(&mut class_table, var_dec)?;
    }

    let mut output = String::new();
    for subroutine in class.find_all(NodeKind::SubroutineDec) {
        compile_subroutine(subroutine, &class_table, &mut output)?;
    }

    Ok(output)
}

fn define_class_var(table: &mut SymbolTable, node: &ParseNode) -> Result<(), CompileError> {
    let kind_lexeme = node
        .children
        .first()
        .and_then(|n| n.lexeme())
        .ok_or_else(|| CompileError::MalformedTree("classVarDec missing static/field keyword".to_string()))?;
    let kind = match kind_lexeme {
        "static" => SymbolKind::Static,
        "field" => SymbolKind::Field,
        other => return Err(CompileError::MalformedTree(format!("unexpected classVarDec kind '{other}'"))),
    };
    let type_name = crate::types::Type::from_lexeme(
        node.children
            .get(1)
            .and_then(|n| n.lexeme())
            .ok_or_else(|| CompileError::MalformedTree("classVarDec missing type".to_string()))?,
    );

    for ident in node.find_all(NodeKind::Identifier) {
        let name = ident
            .lexeme()
            .ok_or_else(|| CompileError::MalformedTree("classVarDec identifier missing lexeme".to_string()))?;
        table.define(name, type_name.clone(), kind);
    }
    Ok(())
}

/// Builds the subroutine's scope on top of `class_table`'s entries, then
/// emits the prologue and body. Spec §4.1's subroutine-table construction
/// rules and §4.5's driver are both implemented here since they share the
/// same walk over `subroutine`'s children.
fn compile_subroutine(
    subroutine: &ParseNode,
    class_table: &SymbolTable,
    output: &mut String,
) -> Result<(), CompileError> {
    let mut table = class_table.clone();
    table.start_subroutine();
    let mut labels = LabelCounters::default();
    labels.reset();

    let subroutine_kind = subroutine
        .children
        .first()
        .and_then(|n| n.lexeme())
        .ok_or_else(|| CompileError::MalformedTree("subroutineDec missing its kind keyword".to_string()))?
        .to_string();

    if subroutine_kind == "method" {
        table.define("this", crate::types::Type::Class(table.find_class().to_string()), SymbolKind::Argument);
    }

    let parameter_list = subroutine
        .find(NodeKind::ParameterList)
        .ok_or_else(|| CompileError::MalformedTree("subroutineDec missing parameterList".to_string()))?;
    define_parameters(&mut table, parameter_list)?;

    let body = subroutine
        .find(NodeKind::SubroutineBody)
        .ok_or_else(|| CompileError::MalformedTree("subroutineDec missing subroutineBody".to_string()))?;
    for var_dec in body.find_all(NodeKind::VarDec) {
        define_local_var(&mut table, var_dec)?;
    }

    let name = subroutine
        .children
        .get(2)
        .and_then(|n| n.lexeme())
        .ok_or_else(|| CompileError::MalformedTree("subroutineDec missing its name".to_string()))?;

    let local_count = table.count(SymbolKind::Local);
    writeln!(output, "function {}.{} {}", table.find_class(), name, local_count)
        .expect("writing to a String never fails");

    match subroutine_kind.as_str() {
        "constructor" => {
            let field_count = class_table.count(SymbolKind::Field);
            writeln!(output, "push constant {field_count}").unwrap();
            writeln!(output, "call Memory.alloc 1").unwrap();
            writeln!(output, "pop pointer 0").unwrap();
        }
        "method" => {
            writeln!(output, "push argument 0").unwrap();
            writeln!(output, "pop pointer 0").unwrap();
        }
        "function" => {}
        other => return Err(CompileError::MalformedTree(format!("unknown subroutine kind '{other}'"))),
    }

    let statements = body
        .find(NodeKind::Statements)
        .ok_or_else(|| CompileError::MalformedTree("subroutineBody missing statements".to_string()))?;
    compile_statements(statements, &table, &mut labels, output)?;

    Ok(())
}

fn define_parameters(table: &mut SymbolTable, parameter_list: &ParseNode) -> Result<(), CompileError> {
    let children = &parameter_list.children;
    let mut i = 0;
    while i < children.len() {
        if children[i].is_symbol(",") {
            // Tolerate a stray separator (see DESIGN.md's Open Question
            // resolution) rather than assuming a fixed stride.
            i += 1;
            continue;
        }
        let type_name = crate::types::Type::from_lexeme(
            children[i]
                .lexeme()
                .ok_or_else(|| CompileError::MalformedTree("parameterList entry missing a type".to_string()))?,
        );
        let name_node = children.get(i + 1).ok_or_else(|| {
            CompileError::MalformedTree("parameterList type with no following identifier".to_string())
        })?;
        let name = name_node
            .lexeme()
            .ok_or_else(|| CompileError::MalformedTree("parameterList identifier missing lexeme".to_string()))?;
        table.define(name, type_name, SymbolKind::Argument);
        i += 2;
    }
    Ok(())
}

fn define_local_var(table: &mut SymbolTable, node: &ParseNode) -> Result<(), CompileError> {
    let type_name = crate::types::Type::from_lexeme(
        node.children
            .get(1)
            .and_then(|n| n.lexeme())
            .ok_or_else(|| CompileError::MalformedTree("varDec missing type".to_string()))?,
    );
    for ident in node.find_all(NodeKind::Identifier) {
        let name = ident
            .lexeme()
            .ok_or_else(|| CompileError::MalformedTree("varDec identifier missing lexeme".to_string()))?;
        table.define(name, type_name.clone(), SymbolKind::Local);
    }
    Ok(())
}

fn compile_statements(
    statements: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    for statement in &statements.children {
        match statement.kind {
            NodeKind::LetStatement => compile_let(statement, table, labels, output)?,
            NodeKind::IfStatement => compile_if(statement, table, labels, output)?,
            NodeKind::WhileStatement => compile_while(statement, table, labels, output)?,
            NodeKind::DoStatement => compile_do(statement, table, labels, output)?,
            NodeKind::ReturnStatement => compile_return(statement, table, labels, output)?,
            other => {
                return Err(CompileError::MalformedTree(format!(
                    "statements node contains unexpected child {other}"
                )))
            }
        }
    }
    Ok(())
}

fn compile_let(
    statement: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    let lhs = statement
        .find(NodeKind::Identifier)
        .and_then(|n| n.lexeme())
        .ok_or_else(|| CompileError::MalformedTree("letStatement missing its target identifier".to_string()))?;
    let symbol = table.resolve(lhs)?;

    if statement.index_of_symbol("[").is_some() {
        let expressions = statement.find_all(NodeKind::Expression);
        let (index_expr, value_expr) = match expressions.as_slice() {
            [a, b] => (*a, *b),
            _ => {
                return Err(CompileError::MalformedTree(
                    "array letStatement must have an index expression and a value expression".to_string(),
                ))
            }
        };
        compile_expression(index_expr, table, labels, output)?;
        writeln!(output, "push {} {}", symbol.kind.segment(), symbol.index).unwrap();
        writeln!(output, "add").unwrap();
        compile_expression(value_expr, table, labels, output)?;
        writeln!(output, "pop temp 0").unwrap();
        writeln!(output, "pop pointer 1").unwrap();
        writeln!(output, "push temp 0").unwrap();
        writeln!(output, "pop that 0").unwrap();
    } else {
        let expr = statement
            .find(NodeKind::Expression)
            .ok_or_else(|| CompileError::MalformedTree("letStatement missing its value expression".to_string()))?;
        compile_expression(expr, table, labels, output)?;
        writeln!(output, "pop {} {}", symbol.kind.segment(), symbol.index).unwrap();
    }

    Ok(())
}

fn compile_if(
    statement: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    let condition = statement
        .find(NodeKind::Expression)
        .ok_or_else(|| CompileError::MalformedTree("ifStatement missing its condition".to_string()))?;
    let branches = statement.find_all(NodeKind::Statements);

    let true_label = labels.fresh("IF_TRUE");
    let false_label = labels.fresh("IF_FALSE");

    compile_expression(condition, table, labels, output)?;
    writeln!(output, "if-goto {true_label}").unwrap();
    writeln!(output, "goto {false_label}").unwrap();
    writeln!(output, "label {true_label}").unwrap();

    match branches.as_slice() {
        [then_branch] => {
            compile_statements(then_branch, table, labels, output)?;
            writeln!(output, "label {false_label}").unwrap();
        }
        [then_branch, else_branch] => {
            let end_label = labels.fresh("IF_END");
            compile_statements(then_branch, table, labels, output)?;
            writeln!(output, "goto {end_label}").unwrap();
            writeln!(output, "label {false_label}").unwrap();
            compile_statements(else_branch, table, labels, output)?;
            writeln!(output, "label {end_label}").unwrap();
        }
        _ => {
            return Err(CompileError::MalformedTree(
                "ifStatement must have one or two statements blocks".to_string(),
            ))
        }
    }

    Ok(())
}

fn compile_while(
    statement: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    let condition = statement
        .find(NodeKind::Expression)
        .ok_or_else(|| CompileError::MalformedTree("whileStatement missing its condition".to_string()))?;
    let body = statement
        .find(NodeKind::Statements)
        .ok_or_else(|| CompileError::MalformedTree("whileStatement missing its body".to_string()))?;

    let exp_label = labels.fresh("WHILE_EXP");
    let end_label = labels.fresh("WHILE_END");

    writeln!(output, "label {exp_label}").unwrap();
    compile_expression(condition, table, labels, output)?;
    writeln!(output, "not").unwrap();
    writeln!(output, "if-goto {end_label}").unwrap();
    compile_statements(body, table, labels, output)?;
    writeln!(output, "goto {exp_label}").unwrap();
    writeln!(output, "label {end_label}").unwrap();

    Ok(())
}

fn compile_do(
    statement: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    // `statement.children` is `keyword("do"), <call children>, symbol(";")`.
    let call_children = &statement.children[1..statement.children.len() - 1];
    compile_subroutine_call(call_children, table, labels, output)?;
    writeln!(output, "pop temp 0").unwrap();
    Ok(())
}

fn compile_return(
    statement: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    match statement.find(NodeKind::Expression) {
        Some(expr) => compile_expression(expr, table, labels, output)?,
        None => writeln!(output, "push constant 0").unwrap(),
    }
    writeln!(output, "return").unwrap();
    Ok(())
}

/// Right-leaning fold over `term (op term)*`: emits the leftmost term, then
/// recursively emits the remainder as its own expression, then the
/// operator that joins them. See spec's §4.2 and §9 — this reproduces the
/// historical Jack evaluation order bit-for-bit and must not mutate
/// `expression`; each recursive call walks a narrower slice of its
/// children instead.
fn compile_expression(
    expression: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    if expression.kind != NodeKind::Expression {
        return Err(CompileError::MalformedTree(format!(
            "expected an expression node, found {}",
            expression.kind
        )));
    }
    compile_expression_tail(&expression.children, table, labels, output)
}

fn compile_expression_tail(
    children: &[ParseNode],
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    let (term, rest) = children
        .split_first()
        .ok_or_else(|| CompileError::MalformedTree("expression has no leading term".to_string()))?;
    compile_term(term, table, labels, output)?;

    if rest.is_empty() {
        return Ok(());
    }

    let (operator, remainder) = match rest {
        [op, tail @ ..] => (op, tail),
        [] => unreachable!("checked non-empty above"),
    };
    compile_expression_tail(remainder, table, labels, output)?;

    let op_lexeme = operator
        .lexeme()
        .ok_or_else(|| CompileError::MalformedTree("expression operator missing a lexeme".to_string()))?;
    writeln!(output, "{}", compile_binary_operator(op_lexeme)?).unwrap();
    Ok(())
}

fn compile_binary_operator(op: &str) -> Result<&'static str, CompileError> {
    match op {
        "+" => Ok("add"),
        "-" => Ok("sub"),
        "*" => Ok("call Math.multiply 2"),
        "/" => Ok("call Math.divide 2"),
        "<" => Ok("lt"),
        ">" => Ok("gt"),
        "&" => Ok("and"),
        "|" => Ok("or"),
        "=" => Ok("eq"),
        other => Err(CompileError::InvalidOperator(other.to_string())),
    }
}

fn compile_unary_operator(op: &str) -> Result<&'static str, CompileError> {
    match op {
        "-" => Ok("neg"),
        "~" => Ok("not"),
        other => Err(CompileError::InvalidOperator(other.to_string())),
    }
}

fn compile_term(
    term: &ParseNode,
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    if term.kind != NodeKind::Term {
        return Err(CompileError::MalformedTree(format!("expected a term node, found {}", term.kind)));
    }

    let first = term
        .children
        .first()
        .ok_or_else(|| CompileError::MalformedTree("term has no children".to_string()))?;
    let last = term
        .children
        .last()
        .ok_or_else(|| CompileError::MalformedTree("term has no children".to_string()))?;

    let is_subroutine_call = !first.is_symbol("(") && last.is_symbol(")");
    if is_subroutine_call {
        return compile_subroutine_call(&term.children, table, labels, output);
    }

    match first.kind {
        NodeKind::IntegerConstant => {
            let n = first.lexeme().unwrap_or_default();
            writeln!(output, "push constant {n}").unwrap();
        }
        NodeKind::StringConstant => {
            compile_string_literal(first.lexeme().unwrap_or_default(), output);
        }
        NodeKind::Keyword => match first.lexeme() {
            Some("true") => {
                writeln!(output, "push constant 0").unwrap();
                writeln!(output, "not").unwrap();
            }
            Some("false") | Some("null") => writeln!(output, "push constant 0").unwrap(),
            Some("this") => writeln!(output, "push pointer 0").unwrap(),
            other => {
                return Err(CompileError::MalformedTree(format!(
                    "unexpected keyword term '{other:?}'"
                )))
            }
        },
        NodeKind::Identifier => {
            let name = first.lexeme().unwrap_or_default();
            let symbol = table.resolve(name)?;

            if term.index_of_symbol("[").is_some() {
                let index_expr = term
                    .find(NodeKind::Expression)
                    .ok_or_else(|| CompileError::MalformedTree("array term missing its index expression".to_string()))?;
                compile_expression(index_expr, table, labels, output)?;
                writeln!(output, "push {} {}", symbol.kind.segment(), symbol.index).unwrap();
                writeln!(output, "add").unwrap();
                writeln!(output, "pop pointer 1").unwrap();
                writeln!(output, "push that 0").unwrap();
            } else {
                writeln!(output, "push {} {}", symbol.kind.segment(), symbol.index).unwrap();
            }
        }
        NodeKind::Symbol => match first.lexeme() {
            Some("(") => {
                let inner = term
                    .find(NodeKind::Expression)
                    .ok_or_else(|| CompileError::MalformedTree("parenthesized term missing its expression".to_string()))?;
                compile_expression(inner, table, labels, output)?;
            }
            Some(op @ ("-" | "~")) => {
                let operand = term
                    .find(NodeKind::Term)
                    .ok_or_else(|| CompileError::MalformedTree("unary term missing its operand".to_string()))?;
                compile_term(operand, table, labels, output)?;
                writeln!(output, "{}", compile_unary_operator(op)?).unwrap();
            }
            other => return Err(CompileError::MalformedTree(format!("unexpected symbol term '{other:?}'"))),
        },
        other => return Err(CompileError::MalformedTree(format!("unexpected term shape starting with {other}"))),
    }

    Ok(())
}

fn compile_string_literal(s: &str, output: &mut String) {
    let len = s.chars().count();
    writeln!(output, "push constant {len}").unwrap();
    writeln!(output, "call String.new 1").unwrap();
    for ch in s.chars() {
        writeln!(output, "push constant {}", ch as u32).unwrap();
        writeln!(output, "call String.appendChar 2").unwrap();
    }
}

/// Compiles a call's flat child sequence — either the `term` children of a
/// call-shaped term, or a `doStatement`'s middle children (spec's §4.4 and
/// §6's `doStatement` note about the "virtual `subroutineCall` node").
fn compile_subroutine_call(
    children: &[ParseNode],
    table: &SymbolTable,
    labels: &mut LabelCounters,
    output: &mut String,
) -> Result<(), CompileError> {
    let paren_index = children
        .iter()
        .position(|c| c.is_symbol("("))
        .ok_or_else(|| CompileError::MalformedTree("subroutine call missing '('".to_string()))?;

    let mut arg_count = 0usize;
    let function_name = match paren_index {
        1 => {
            let subroutine_name = children[0]
                .lexeme()
                .ok_or_else(|| CompileError::MalformedTree("unqualified call missing its name".to_string()))?;
            writeln!(output, "push pointer 0").unwrap();
            arg_count += 1;
            format!("{}.{}", table.find_class(), subroutine_name)
        }
        3 => {
            let receiver_name = children[0]
                .lexeme()
                .ok_or_else(|| CompileError::MalformedTree("qualified call missing its receiver".to_string()))?;
            let subroutine_name = children[2]
                .lexeme()
                .ok_or_else(|| CompileError::MalformedTree("qualified call missing its method name".to_string()))?;

            match table.lookup(receiver_name) {
                Some(symbol) if symbol.kind != SymbolKind::Class => {
                    writeln!(output, "push {} {}", symbol.kind.segment(), symbol.index).unwrap();
                    arg_count += 1;
                    format!("{}.{}", symbol.type_name, subroutine_name)
                }
                _ => format!("{receiver_name}.{subroutine_name}"),
            }
        }
        other => {
            return Err(CompileError::MalformedTree(format!(
                "subroutine call has '(' at unexpected position {other}"
            )))
        }
    };

    let expression_list = children
        .iter()
        .find(|c| c.kind == NodeKind::ExpressionList)
        .ok_or_else(|| CompileError::MalformedTree("subroutine call missing its expressionList".to_string()))?;
    let arguments = expression_list.find_all(NodeKind::Expression);
    for expr in &arguments {
        compile_expression(expr, table, labels, output)?;
    }
    arg_count += arguments.len();

    writeln!(output, "call {function_name} {arg_count}").unwrap();
    Ok(())
}
