//! End-to-end tests of source text through compiler, VM and heap

use core_types::{InterpretResult, Value};
use integration_tests::{run_source, Harness};

fn output_of(source: &str) -> String {
    let (result, out, err) = run_source(source);
    assert_eq!(result, InterpretResult::Ok, "diagnostics: {}", err);
    out
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
    assert_eq!(output_of("print -(1 + 2) * 3 - -1;"), "-8\n");
    assert_eq!(output_of("print 10 / 4;"), "2.5\n");
}

#[test]
fn test_concatenated_string_is_the_interned_one() {
    let mut harness = Harness::default();
    let result = harness.interpret("var a = \"foo\" + \"bar\"; var b = \"foobar\";");
    assert_eq!(result, InterpretResult::Ok);

    let a = harness.vm.get_global("a").unwrap();
    let b = harness.vm.get_global("b").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Value::Obj(harness.vm.heap().find_interned("foobar").unwrap()));
}

#[test]
fn test_fibonacci() {
    let source = "
fun fib(n) {
  if (n < 2) return n;
  return fib(n - 1) + fib(n - 2);
}
print fib(10);
";
    assert_eq!(output_of(source), "55\n");
}

#[test]
fn test_instances_and_fields() {
    let source = "
class Point {}
var p = Point();
p.x = 1;
p.y = p.x + 1;
print p.x + p.y;
print p;
print Point;
";
    assert_eq!(output_of(source), "3\nPoint instance\nPoint\n");
}

#[test]
fn test_missing_field_is_runtime_error() {
    let (result, out, err) = run_source("class A {} var a = A(); a.x = 1; print a.x;\nprint a.y;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(out, "1\n");
    assert_eq!(err, "Undefined property 'y'.\n[line 2] in script\n");
}

#[test]
fn test_control_flow_mix() {
    let source = "
var total = 0;
for (var i = 1; i <= 10; i = i + 1) {
  if (i == 5) total = total + 100;
  else total = total + i;
}
print total;
var n = 3;
while (n > 0) { print n; n = n - 1; }
";
    assert_eq!(output_of(source), "150\n3\n2\n1\n");
}

#[test]
fn test_functions_are_values() {
    let source = "
fun twice(f, x) { return f(f(x)); }
fun inc(x) { return x + 1; }
var g = inc;
print twice(g, 5);
print twice;
";
    assert_eq!(output_of(source), "7\n<fn twice>\n");
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_eq!(output_of("fun f() { 1 + 1; } print f();"), "nil\n");
}

#[test]
fn test_stack_is_empty_after_run() {
    let mut harness = Harness::default();
    let source = "
fun sum(a, b, c) { var s = a + b; { var t = s + c; return t; } }
{ var x = sum(1, 2, 3); print x; }
";
    assert_eq!(harness.interpret(source), InterpretResult::Ok);
    assert_eq!(harness.output.contents(), "6\n");
    assert_eq!(harness.vm.stack_len(), 0);
    assert_eq!(harness.vm.frame_count(), 0);
}

#[test]
fn test_session_keeps_globals_across_errors() {
    let mut harness = Harness::default();
    assert_eq!(harness.interpret("var kept = \"yes\";"), InterpretResult::Ok);
    assert_eq!(harness.interpret("print missing;"), InterpretResult::RuntimeError);
    assert_eq!(harness.interpret("print ;"), InterpretResult::CompileError);
    assert_eq!(harness.interpret("print kept;"), InterpretResult::Ok);
    assert_eq!(harness.output.contents(), "yes\n");
}

#[test]
fn test_clock_native() {
    let source = "var start = clock(); var later = clock(); print later >= start;";
    assert_eq!(output_of(source), "true\n");
}
