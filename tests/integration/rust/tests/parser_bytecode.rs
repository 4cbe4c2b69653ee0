//! Integration tests for the compiler and the bytecode crate
//!
//! Compiles real source into heap functions and checks the chunks through
//! the disassembler.

use bytecode_system::{disassemble_chunk, OpCode};
use core_types::{ErrorSite, Value};
use memory_manager::{Heap, NoRoots};

fn listing(source: &str) -> String {
    let mut heap = Heap::new();
    let script = parser::compile(source, &mut heap, &NoRoots).expect("compiles");
    let function = heap.function(script).expect("script function");
    disassemble_chunk(&function.chunk, "<script>", &heap)
}

fn mnemonics(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().find(|word| word.starts_with("OP_")))
        .collect()
}

#[test]
fn test_expression_statement_shape() {
    let listing = listing("print 1 + 2;");
    assert_eq!(
        mnemonics(&listing),
        vec!["OP_CONSTANT", "OP_CONSTANT", "OP_ADD", "OP_PRINT", "OP_NIL", "OP_RETURN"]
    );
    assert!(listing.starts_with("== <script> ==\n"), "{}", listing);
    assert!(listing.contains("'1'"), "{}", listing);
    assert!(listing.contains("'2'"), "{}", listing);
}

#[test]
fn test_script_ends_with_implicit_return() {
    let mut heap = Heap::new();
    let script = parser::compile("", &mut heap, &NoRoots).unwrap();
    let chunk = &heap.function(script).unwrap().chunk;
    assert_eq!(chunk.code(), &[OpCode::Nil as u8, OpCode::Return as u8]);
}

#[test]
fn test_string_constants_are_interned() {
    let mut heap = Heap::new();
    let script = parser::compile("var a = \"hi\"; var b = \"hi\";", &mut heap, &NoRoots).unwrap();
    let hi = heap.find_interned("hi").expect("interned");
    let constants = heap.function(script).unwrap().chunk.constants();
    let copies = constants
        .iter()
        .filter(|constant| **constant == Value::Obj(hi))
        .count();
    assert_eq!(copies, 2);
}

#[test]
fn test_function_constant_holds_its_own_chunk() {
    let mut heap = Heap::new();
    let script = parser::compile(
        "fun add(a, b) { return a + b; } print add(1, 2);",
        &mut heap,
        &NoRoots,
    )
    .unwrap();

    let add = heap
        .function(script)
        .unwrap()
        .chunk
        .constants()
        .iter()
        .filter_map(|constant| constant.as_obj())
        .find(|&r| heap.function(r).is_some())
        .expect("nested function constant");
    let function = heap.function(add).unwrap();
    assert_eq!(function.arity, 2);
    assert_eq!(heap.describe(add), "<fn add>");

    let body = disassemble_chunk(&function.chunk, "add", &heap);
    assert_eq!(
        mnemonics(&body),
        vec!["OP_GET_LOCAL", "OP_GET_LOCAL", "OP_ADD", "OP_RETURN", "OP_NIL", "OP_RETURN"]
    );
}

#[test]
fn test_lines_follow_source() {
    let mut heap = Heap::new();
    let script = parser::compile("print 1;\n\nprint 2;", &mut heap, &NoRoots).unwrap();
    let chunk = &heap.function(script).unwrap().chunk;
    assert_eq!(chunk.line(0), Some(1));
    let last = chunk.len() - 1;
    assert_eq!(chunk.line(last), Some(3));
}

#[test]
fn test_errors_carry_site_and_line() {
    let mut heap = Heap::new();
    let errors = parser::compile("var x = 1;\nx + 1 = 2;\nprint", &mut heap, &NoRoots).unwrap_err();
    let errors: Vec<_> = errors.iter().cloned().collect();
    assert_eq!(errors.len(), 2);

    assert_eq!(errors[0].line, 2);
    assert_eq!(errors[0].site, ErrorSite::Lexeme("=".to_string()));
    assert_eq!(errors[0].message, "Invalid assignment target.");

    assert_eq!(errors[1].line, 3);
    assert_eq!(errors[1].site, ErrorSite::End);
    assert_eq!(errors[1].message, "Expect expression.");
}

#[test]
fn test_lexical_error_has_no_site() {
    let mut heap = Heap::new();
    let errors = parser::compile("print \"open;", &mut heap, &NoRoots).unwrap_err();
    let first = errors.iter().next().unwrap();
    assert_eq!(first.site, ErrorSite::None);
    assert_eq!(first.to_string(), "[line 1] Error: Unterminated string.");
}
