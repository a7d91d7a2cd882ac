//! Property-based fuzzing of the compiler pipeline.
//!
//! Generates small, syntactically valid Jack programs and checks pipeline
//! invariants hold across all of them: never panic, and every line of
//! emitted VM text is one of the instructions spec's §6 enumerates.

use proptest::prelude::*;

/// A Jack identifier that isn't a keyword.
fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_filter("not a keyword", |s| {
        !matches!(
            s.as_str(),
            "class"
                | "constructor"
                | "function"
                | "method"
                | "field"
                | "static"
                | "var"
                | "int"
                | "char"
                | "boolean"
                | "void"
                | "true"
                | "false"
                | "null"
                | "this"
                | "let"
                | "do"
                | "if"
                | "else"
                | "while"
                | "return"
        )
    })
}

/// A class name (capitalized, not a built-in OS class).
fn arb_class_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,8}".prop_filter("not a built-in OS class", |s| {
        !matches!(s.as_str(), "Array" | "String" | "Output" | "Math" | "Memory" | "Keyboard" | "Screen" | "Sys")
    })
}

fn arb_int_literal() -> impl Strategy<Value = u16> {
    0u16..32768
}

fn arb_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("int"), Just("char"), Just("boolean")]
}

/// A minimal class: N local variables declared then each assigned an
/// integer constant.
fn arb_minimal_class() -> impl Strategy<Value = String> {
    (
        arb_class_name(),
        prop::collection::vec((arb_type(), arb_identifier(), arb_int_literal()), 1..5),
    )
        .prop_map(|(class_name, vars)| {
            let decls: String = vars
                .iter()
                .map(|(ty, name, _)| format!("        var {ty} {name};"))
                .collect::<Vec<_>>()
                .join("\n");
            let assigns: String = vars
                .iter()
                .map(|(_, name, n)| format!("        let {name} = {n};"))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "class {class_name} {{\n    function void main() {{\n{decls}\n{assigns}\n        return;\n    }}\n}}"
            )
        })
}

/// A class computing a nested arithmetic expression from integer literals.
fn arb_arithmetic_class() -> impl Strategy<Value = String> {
    (
        arb_class_name(),
        prop::collection::vec(arb_int_literal(), 2..5),
        prop::collection::vec(prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")], 1..4),
    )
        .prop_map(|(class_name, nums, ops)| {
            let mut expr = nums[0].to_string();
            for (i, op) in ops.iter().enumerate() {
                if i + 1 < nums.len() {
                    let rhs = if *op == "/" && nums[i + 1] == 0 { 1 } else { nums[i + 1] };
                    expr = format!("({expr} {op} {rhs})");
                }
            }
            format!("class {class_name} {{\n    function int calc() {{\n        return {expr};\n    }}\n}}")
        })
}

/// A class with an if/else and a while loop over two integer locals.
fn arb_control_flow_class() -> impl Strategy<Value = String> {
    (arb_class_name(), arb_int_literal(), arb_int_literal()).prop_map(|(class_name, a, b)| {
        format!(
            "class {class_name} {{\n    function void test() {{\n        var int x;\n        var int y;\n        let x = {a};\n        let y = {b};\n        if (x < y) {{\n            let x = y;\n        }} else {{\n            let y = x;\n        }}\n        while (x > 0) {{\n            let x = x - 1;\n        }}\n        return;\n    }}\n}}"
        )
    })
}

fn is_valid_vm_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with("push ")
        || line.starts_with("pop ")
        || line.starts_with("label ")
        || line.starts_with("goto ")
        || line.starts_with("if-goto ")
        || line.starts_with("function ")
        || line.starts_with("call ")
        || matches!(line, "add" | "sub" | "neg" | "eq" | "gt" | "lt" | "and" | "or" | "not" | "return")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn never_panics_on_minimal_classes(source in arb_minimal_class()) {
        let _ = jackc::compile_source(&source);
    }

    #[test]
    fn never_panics_on_arithmetic_classes(source in arb_arithmetic_class()) {
        let _ = jackc::compile_source(&source);
    }

    #[test]
    fn never_panics_on_control_flow_classes(source in arb_control_flow_class()) {
        let _ = jackc::compile_source(&source);
    }

    #[test]
    fn successful_compiles_emit_only_known_vm_instructions(source in arb_minimal_class()) {
        if let Ok(vm) = jackc::compile_source(&source) {
            for line in vm.lines() {
                prop_assert!(is_valid_vm_line(line), "unrecognized VM line: {line}");
            }
        }
    }

    #[test]
    fn successful_compiles_have_one_function_header_per_subroutine(source in arb_arithmetic_class()) {
        if let Ok(vm) = jackc::compile_source(&source) {
            let function_count = vm.lines().filter(|l| l.starts_with("function ")).count();
            let return_count = vm.lines().filter(|l| *l == "return").count();
            prop_assert!(return_count >= function_count);
        }
    }

    #[test]
    fn recompiling_identical_source_is_byte_identical(source in arb_control_flow_class()) {
        let first = jackc::compile_source(&source);
        let second = jackc::compile_source(&source);
        prop_assert_eq!(first.is_ok(), second.is_ok());
        if let (Ok(a), Ok(b)) = (first, second) {
            prop_assert_eq!(a, b);
        }
    }
}
