//! Debug tree printer (spec's §1, "the tree-printing utility used only for
//! debugging").
//!
//! Descended from `original_source/parser/node.go`'s `ToXML`, but emits a
//! plain indented dump rather than XML — nothing downstream of this crate
//! consumes XML, and a flat `name value` / `name { ... }` shape is easier to
//! read in a terminal. Reachable via `jackc --print-tree`.

use crate::tree::ParseNode;
use std::fmt::Write as _;

/// Render a parse tree as an indented dump, two spaces per level.
pub fn print_tree(node: &ParseNode) -> String {
    let mut out = String::new();
    write_node(node, 0, &mut out);
    out
}

fn write_node(node: &ParseNode, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match &node.value {
        Some(value) => {
            writeln!(out, "{pad}{} {value}", node.kind).unwrap();
        }
        None => {
            writeln!(out, "{pad}{} {{", node.kind).unwrap();
            for child in &node.children {
                write_node(child, indent + 1, out);
            }
            writeln!(out, "{pad}}}").unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    #[test]
    fn terminal_nodes_print_inline() {
        let class = parse(tokenize("class Main {\n}\n").unwrap()).unwrap();
        let dump = print_tree(&class);
        assert!(dump.contains("identifier Main"));
        assert!(dump.contains("keyword class"));
    }

    #[test]
    fn nonterminal_nodes_print_as_blocks() {
        let class = parse(tokenize("class Main {\n}\n").unwrap()).unwrap();
        let dump = print_tree(&class);
        assert!(dump.starts_with("class {\n"));
        assert!(dump.trim_end().ends_with('}'));
    }

    #[test]
    fn nested_subroutine_bodies_indent_deeper() {
        let class = parse(tokenize("class Main { function void main() { return; } }").unwrap()).unwrap();
        let dump = print_tree(&class);
        let return_line = dump.lines().find(|l| l.trim_start() == "returnStatement {").unwrap();
        let indent = return_line.len() - return_line.trim_start().len();
        assert!(indent >= 4);
    }
}
