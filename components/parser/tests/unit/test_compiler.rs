use bytecode_system::{disassemble_chunk, OpCode};
use core_types::Value;
use memory_manager::{Heap, NoRoots};
use parser::compile;

fn compiled(source: &str) -> (Heap, Vec<u8>, String) {
    let mut heap = Heap::new();
    let script = compile(source, &mut heap, &NoRoots).expect("source should compile");
    let chunk = heap.function(script).unwrap().chunk.clone();
    let listing = disassemble_chunk(&chunk, "script", &heap);
    (heap, chunk.code().to_vec(), listing)
}

fn ops(ops: &[OpCode]) -> Vec<u8> {
    ops.iter().map(|&op| u8::from(op)).collect()
}

#[test]
fn test_if_else_jump_offsets() {
    let (_, code, listing) = compiled("if (true) print 1; else print 2;");
    assert_eq!(code.len(), 17);
    assert!(listing.contains("OP_JUMP_IF_FALSE    1 -> 11"), "{}", listing);
    assert!(listing.contains("OP_JUMP             8 -> 15"), "{}", listing);
    assert_eq!(&code[15..], ops(&[OpCode::Nil, OpCode::Return]).as_slice());
}

#[test]
fn test_while_loops_back_to_condition() {
    let (_, code, listing) = compiled("while (false) print 1;");
    assert_eq!(code[0], u8::from(OpCode::False));
    assert!(listing.contains("OP_LOOP             8 -> 0"), "{}", listing);
    assert_eq!(code.len(), 14);
}

#[test]
fn test_negated_comparisons() {
    let (_, code, _) = compiled("1 <= 2;");
    assert_eq!(
        &code[4..7],
        ops(&[OpCode::Greater, OpCode::Not, OpCode::Pop]).as_slice()
    );

    let (_, code, _) = compiled("1 >= 2;");
    assert_eq!(&code[4..6], ops(&[OpCode::Less, OpCode::Not]).as_slice());

    let (_, code, _) = compiled("1 != 2;");
    assert_eq!(&code[4..6], ops(&[OpCode::Equal, OpCode::Not]).as_slice());
}

#[test]
fn test_locals_use_slots() {
    let (_, code, _) = compiled("{ var a = 1; a = 2; print a; }");
    assert_eq!(
        code,
        vec![
            u8::from(OpCode::Constant),
            0,
            u8::from(OpCode::Constant),
            1,
            u8::from(OpCode::SetLocal),
            1,
            u8::from(OpCode::Pop),
            u8::from(OpCode::GetLocal),
            1,
            u8::from(OpCode::Print),
            u8::from(OpCode::Pop),
            u8::from(OpCode::Nil),
            u8::from(OpCode::Return),
        ]
    );
}

#[test]
fn test_globals_use_name_constants() {
    let (heap, code, _) = compiled("var answer = 42; print answer;");
    assert_eq!(code[2], u8::from(OpCode::DefineGlobal));
    assert_eq!(code[4], u8::from(OpCode::GetGlobal));
    assert!(heap.find_interned("answer").is_some());
}

#[test]
fn test_property_access() {
    let (_, code, listing) = compiled("class P {} var p = P(); p.x = 1; print p.x;");
    assert!(code.contains(&u8::from(OpCode::Class)));
    assert!(listing.contains("OP_SET_PROPERTY"));
    assert!(listing.contains("OP_GET_PROPERTY"));
    assert!(listing.contains("OP_CALL             0"));
}

#[test]
fn test_function_arity_and_name() {
    let mut heap = Heap::new();
    let script = compile("fun pair(a, b) { return a; }", &mut heap, &NoRoots).unwrap();
    let function = heap
        .function(script)
        .unwrap()
        .chunk
        .constants()
        .iter()
        .filter_map(|v| v.as_obj())
        .find(|&r| heap.function(r).is_some())
        .expect("nested function constant");
    assert_eq!(heap.function(function).unwrap().arity, 2);
    assert_eq!(heap.format_value(Value::Obj(function)), "<fn pair>");
}

#[test]
fn test_errors_are_reported_in_order() {
    let mut heap = Heap::new();
    let errors = compile("var 1 = 2;\nprint (;\nprint 3", &mut heap, &NoRoots).unwrap_err();
    let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "[line 1] Error at '1': Expect variable name.",
            "[line 2] Error at ';': Expect expression.",
            "[line 3] Error at end: Expect ';' after value.",
        ]
    );
}

#[test]
fn test_failed_compile_allocates_no_script() {
    let mut heap = Heap::new();
    assert!(compile("print ;", &mut heap, &NoRoots).is_err());
    assert!(compile("print \"x\";", &mut heap, &NoRoots).is_ok());
    assert_eq!(heap.object_count(), 2);
}

#[test]
fn test_too_many_parameters() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));
    let mut heap = Heap::new();
    let errors = compile(&source, &mut heap, &NoRoots).unwrap_err();
    assert_eq!(
        errors.iter().next().unwrap().message,
        "Can't have more than 255 parameters."
    );
}

#[test]
fn test_too_many_constants() {
    let body: String = (0..300).map(|i| format!("{};", i)).collect();
    let mut heap = Heap::new();
    let errors = compile(&body, &mut heap, &NoRoots).unwrap_err();
    assert!(errors
        .iter()
        .all(|e| e.message == "Too many constants in one chunk."));
    assert_eq!(errors.len(), 300 - 256);
}

fn first_error(source: &str) -> String {
    let mut heap = Heap::new();
    let errors = compile(source, &mut heap, &NoRoots).expect_err("source should not compile");
    errors.iter().next().unwrap().to_string()
}

#[test]
fn test_forward_jump_too_large() {
    let body = "print nil;".repeat(33_000);
    assert_eq!(
        first_error(&format!("if (true) {{{}}}", body)),
        "[line 1] Error at '}': Too much code to jump over."
    );
}

#[test]
fn test_loop_body_too_large() {
    let body = "print nil;".repeat(33_000);
    assert_eq!(
        first_error(&format!("while (false) {{{}}}", body)),
        "[line 1] Error at '}': Loop body too large."
    );
}

#[test]
fn test_too_many_arguments() {
    let args = vec!["nil"; 256].join(", ");
    let source = format!("fun f() {{}}\nf({});", args);
    assert_eq!(
        first_error(&source),
        "[line 2] Error at 'nil': Can't have more than 255 arguments."
    );

    let args = vec!["nil"; 255].join(", ");
    let mut heap = Heap::new();
    assert!(compile(&format!("fun f() {{}}\nf({});", args), &mut heap, &NoRoots).is_ok());
}
