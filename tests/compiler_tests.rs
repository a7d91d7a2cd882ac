//! End-to-end scenarios S1-S6 from spec's §8, plus file-level round trips
//! through [`jackc::compile_file`].

use std::fs;

fn compile(src: &str) -> String {
    jackc::compile_source(src).unwrap()
}

#[test]
fn s1_void_main_returns() {
    let vm = compile("class Main { function void main() { return; } }");
    assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
}

#[test]
fn s2_addition_lowers_left_to_right_into_a_local() {
    let vm = compile("class C { function int f() { var int x; let x = 1 + 2; return x; } }");
    assert!(vm.contains("push constant 1\npush constant 2\nadd\npop local 0\n"));
    assert!(vm.trim_end().ends_with("push local 0\nreturn"));
}

#[test]
fn s3_two_field_constructor_allocates_and_binds_this() {
    let vm = compile(
        "class Point { field int x, y; constructor Point new() { let x = 0; let y = 0; return this; } }",
    );
    let mut lines = vm.lines();
    assert_eq!(lines.next(), Some("function Point.new 0"));
    assert_eq!(lines.next(), Some("push constant 2"));
    assert_eq!(lines.next(), Some("call Memory.alloc 1"));
    assert_eq!(lines.next(), Some("pop pointer 0"));
}

#[test]
fn s4_if_else_emits_the_true_false_end_skeleton() {
    let vm = compile(
        "class C { function void f() { var int x, y; if (x) { let y = 1; } else { let y = 2; } return; } }",
    );
    let true_pos = vm.find("label IF_TRUE0").unwrap();
    let false_pos = vm.find("label IF_FALSE0").unwrap();
    let end_pos = vm.find("label IF_END0").unwrap();
    assert!(true_pos < false_pos);
    assert!(false_pos < end_pos);
}

#[test]
fn s5_while_tests_negated_condition_before_the_body() {
    let vm = compile("class C { function void f() { var int i; while (i) { let i = i; } return; } }");
    let exp_pos = vm.find("label WHILE_EXP0").unwrap();
    let not_pos = vm.find("not\nif-goto WHILE_END0").unwrap();
    let goto_pos = vm.find("goto WHILE_EXP0").unwrap();
    let end_pos = vm.rfind("label WHILE_END0").unwrap();
    assert!(exp_pos < not_pos);
    assert!(not_pos < goto_pos);
    assert!(goto_pos < end_pos);
}

#[test]
fn s6_string_literal_builds_via_string_new_and_append_char() {
    let vm = compile("class C { function void f() { do Output.printString(\"Hi\"); return; } }");
    assert!(vm.contains("push constant 2\ncall String.new 1\n"));
    assert!(vm.contains("push constant 72\ncall String.appendChar 2\n"));
    assert!(vm.contains("push constant 105\ncall String.appendChar 2\n"));
}

#[test]
fn method_dispatch_through_a_known_variable_pushes_the_receiver() {
    let vm = compile(
        "class Rect { field int w, h; method void scaleBy(Rect other) { do other.grow(w); return; } }",
    );
    assert!(vm.contains("push argument 1"));
    assert!(vm.contains("call Rect.grow 2"));
}

#[test]
fn multiple_subroutines_in_one_class_each_get_their_own_label_space() {
    let vm = compile(
        "class C { function void f() { var int a; if (a) { return; } return; } function void g() { var int b; if (b) { return; } return; } }",
    );
    assert_eq!(vm.matches("label IF_TRUE0").count(), 2);
    assert_eq!(vm.matches("function C.").count(), 2);
}

#[test]
fn compile_file_end_to_end_through_the_driver_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Main.jack");
    let output = dir.path().join("Main.vm");
    fs::write(
        &input,
        "class Main { function void main() { do Main.run(); return; } function void run() { return; } }",
    )
    .unwrap();

    jackc::compile_file(&input, &output).unwrap();

    let vm = fs::read_to_string(&output).unwrap();
    assert!(vm.contains("function Main.main 0"));
    assert!(vm.contains("call Main.run 0"));
}

#[test]
fn malformed_source_reports_a_parse_error_not_a_panic() {
    let err = jackc::compile_source("class {").unwrap_err();
    assert!(err.to_string().contains("identifier"));
}

#[test]
fn unresolved_identifier_reports_the_offending_name() {
    let err = jackc::compile_source("class C { function void f() { let ghost = 1; return; } }").unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
