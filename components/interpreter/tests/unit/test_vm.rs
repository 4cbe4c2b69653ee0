use core_types::{ErrorKind, InterpretError, InterpretResult, Value};
use interpreter::VmConfig;

use crate::capture_vm;

fn output_of(source: &str) -> String {
    let (mut vm, out, err) = capture_vm(VmConfig::default());
    let result = vm.interpret(source);
    assert_eq!(result, InterpretResult::Ok, "diagnostics: {}", err.text());
    assert_eq!(vm.stack_len(), 0);
    out.text()
}

#[test]
fn test_arithmetic() {
    assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
    assert_eq!(output_of("print (1 + 2) * 3;"), "9\n");
    assert_eq!(output_of("print -4 / 8;"), "-0.5\n");
    assert_eq!(output_of("print 1 / 3;"), "0.333333\n");
    assert_eq!(output_of("print 1000000 * 10;"), "1e+07\n");
}

#[test]
fn test_comparison_and_logic() {
    assert_eq!(
        output_of("print 1 <= 1; print 2 >= 3; print 1 != 2; print !nil;"),
        "true\nfalse\ntrue\ntrue\n"
    );
    assert_eq!(output_of("print nil or 2; print 1 and false;"), "2\nfalse\n");
    assert_eq!(output_of("print 0 and \"zero is truthy\";"), "zero is truthy\n");
}

#[test]
fn test_string_concatenation_is_interned() {
    assert_eq!(
        output_of("var a = \"foo\" + \"bar\"; var b = \"foobar\"; print a; print a == b;"),
        "foobar\ntrue\n"
    );
}

#[test]
fn test_control_flow() {
    assert_eq!(output_of("if (false) print \"A\"; else print \"B\";"), "B\n");
    assert_eq!(output_of("while (false) print \"never\";"), "");
    assert_eq!(
        output_of("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
    assert_eq!(
        output_of(
            "fun f() { var i = 0; for (;;) { i = i + 1; if (i == 5) return i; } } print f();"
        ),
        "5\n"
    );
}

#[test]
fn test_block_scoping() {
    let source = "var a = \"global\";
{
  var a = \"outer\";
  {
    var a = \"inner\";
    print a;
  }
  print a;
}
print a;";
    assert_eq!(output_of(source), "inner\nouter\nglobal\n");
}

#[test]
fn test_recursion() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
print fib(10);";
    assert_eq!(output_of(source), "55\n");
}

#[test]
fn test_fields() {
    assert_eq!(
        output_of("class A {} var a = A(); a.x = 5; print a.x; print a.x = 6; print a;"),
        "5\n6\nA instance\n"
    );
}

#[test]
fn test_display_forms() {
    assert_eq!(
        output_of("fun f() {} class C {} print f; print C; print clock; print nil;"),
        "<fn f>\nC\n<native fn>\nnil\n"
    );
}

#[test]
fn test_globals_persist_between_runs() {
    let (mut vm, out, _) = capture_vm(VmConfig::default());
    assert_eq!(vm.interpret("var count = 1;"), InterpretResult::Ok);
    assert_eq!(vm.interpret("count = count + 1; print count;"), InterpretResult::Ok);
    assert_eq!(out.text(), "2\n");
    assert_eq!(vm.get_global("count"), Some(Value::Number(2.0)));
}

#[test]
fn test_runtime_backtrace() {
    let source = "fun inner() { return nil + 1; }
fun outer() { return inner(); }
outer();";
    let (mut vm, _, err) = capture_vm(VmConfig::default());
    assert_eq!(vm.interpret(source), InterpretResult::RuntimeError);
    assert_eq!(
        err.text(),
        "Operands must be two numbers or two strings.
[line 1] in inner()
[line 2] in outer()
[line 3] in script
"
    );
    assert_eq!(vm.stack_len(), 0);
    assert_eq!(vm.frame_count(), 0);
}

#[test]
fn test_undefined_variable() {
    let (mut vm, _, _) = capture_vm(VmConfig::default());
    match vm.run("print missing;") {
        Err(InterpretError::Runtime(err)) => {
            assert_eq!(err.kind, ErrorKind::UndefinedVariable);
            assert_eq!(err.message, "Undefined variable 'missing'.");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_arity_mismatch() {
    let (mut vm, _, err) = capture_vm(VmConfig::default());
    assert_eq!(
        vm.interpret("fun f(a, b) {}\nf(1);"),
        InterpretResult::RuntimeError
    );
    assert_eq!(err.text(), "Expected 2 arguments but got 1.\n[line 2] in script\n");
}

#[test]
fn test_native_sees_arguments() {
    fn count(args: &[Value]) -> Value {
        Value::Number(args.len() as f64)
    }

    let (mut vm, out, _) = capture_vm(VmConfig::default());
    vm.define_native("count", count);
    assert_eq!(vm.interpret("print count(1, 2, 3);"), InterpretResult::Ok);
    assert_eq!(out.text(), "3\n");
}

#[test]
fn test_vms_are_independent() {
    let (mut first, _, _) = capture_vm(VmConfig::default());
    let (second, _, _) = capture_vm(VmConfig::default());
    first.interpret("var only_here = true;");
    assert!(first.get_global("only_here").is_some());
    assert!(second.get_global("only_here").is_none());
}

#[test]
fn test_compile_does_not_run() {
    let (mut vm, out, _) = capture_vm(VmConfig::default());
    let script = vm.compile("print 1;").unwrap();
    assert_eq!(vm.format_value(Value::Obj(script)), "<script>");
    assert_eq!(out.text(), "");
}
