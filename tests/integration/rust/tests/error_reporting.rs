//! Compile diagnostics and runtime backtraces as a host sees them

use core_types::{ErrorKind, InterpretError, InterpretResult, StackFrame};
use integration_tests::{run_source, Harness};
use interpreter::FRAMES_MAX;

fn runtime_error(source: &str) -> core_types::RuntimeError {
    let mut harness = Harness::default();
    match harness.vm.run(source) {
        Err(InterpretError::Runtime(err)) => err,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_compile_errors_are_all_reported() {
    let (result, out, err) = run_source("print 1\nvar = 2;\nprint 3;");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(out, "");
    assert_eq!(
        err,
        "[line 2] Error at 'var': Expect ';' after value.\n\
         [line 2] Error at '=': Expect variable name.\n"
    );
}

#[test]
fn test_compile_error_runs_nothing() {
    let (result, out, _) = run_source("print \"before\";\nreturn 1;");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(out, "");
}

#[test]
fn test_top_level_return_message() {
    let (_, _, err) = run_source("return 1;");
    assert_eq!(err, "[line 1] Error at 'return': Can't return from top-level code.\n");
}

#[test]
fn test_error_at_end() {
    let (_, _, err) = run_source("fun f() {");
    assert_eq!(err, "[line 1] Error at end: Expect '}' after block.\n");
}

#[test]
fn test_runtime_error_kinds() {
    assert_eq!(runtime_error("-true;").kind, ErrorKind::TypeError);
    assert_eq!(runtime_error("print nope;").kind, ErrorKind::UndefinedVariable);
    assert_eq!(runtime_error("nope = 1;").kind, ErrorKind::UndefinedVariable);
    assert_eq!(
        runtime_error("class A {} A().missing;").kind,
        ErrorKind::UndefinedProperty
    );
    assert_eq!(runtime_error("fun f(a) {} f();").kind, ErrorKind::Arity);
    assert_eq!(runtime_error("\"text\"();").kind, ErrorKind::TypeError);
    assert_eq!(runtime_error("var x = 1; x.field = 2;").kind, ErrorKind::TypeError);
}

#[test]
fn test_backtrace_lists_frames_innermost_first() {
    let source = "fun c() {\n  return 1 < \"two\";\n}\nfun b() { return c(); }\nfun a() {\n  b();\n}\na();";
    let err = runtime_error(source);
    assert_eq!(err.message, "Operands must be numbers.");
    assert_eq!(
        err.stack,
        vec![
            StackFrame {
                function_name: Some("c".to_string()),
                line: 2
            },
            StackFrame {
                function_name: Some("b".to_string()),
                line: 4
            },
            StackFrame {
                function_name: Some("a".to_string()),
                line: 6
            },
            StackFrame {
                function_name: None,
                line: 8
            },
        ]
    );
}

#[test]
fn test_stack_overflow_backtrace() {
    let err = runtime_error("fun forever() { forever(); }\nforever();");
    assert_eq!(err.kind, ErrorKind::StackOverflow);
    assert_eq!(err.message, "Stack overflow.");
    assert_eq!(err.stack.len(), FRAMES_MAX);
    assert_eq!(err.stack.last().unwrap().function_name, None);
    assert_eq!(err.stack.last().unwrap().line, 2);
}

#[test]
fn test_report_goes_to_diagnostics_only() {
    let (result, out, err) = run_source("print \"partial\";\nprint -\"x\";");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(out, "partial\n");
    assert_eq!(err, "Operand must be a number.\n[line 2] in script\n");
}

#[test]
fn test_exit_codes() {
    assert_eq!(run_source("print 1;").0.exit_code(), 0);
    assert_eq!(run_source("print").0.exit_code(), 72);
    assert_eq!(run_source("print nil + nil;").0.exit_code(), 73);
}
