use bytecode_system::{Chunk, ChunkError, OpCode};
use core_types::Value;

#[test]
fn test_if_else_backpatch_shape() {
    // JUMP_IF_FALSE then; POP; NIL; JUMP else; POP; TRUE
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::False, 1);
    chunk.write_op(OpCode::JumpIfFalse, 1);
    let then_jump = chunk.len();
    chunk.write(0xff, 1);
    chunk.write(0xff, 1);
    chunk.write_op(OpCode::Pop, 1);
    chunk.write_op(OpCode::Nil, 1);
    chunk.write_op(OpCode::Jump, 1);
    let else_jump = chunk.len();
    chunk.write(0xff, 1);
    chunk.write(0xff, 1);
    chunk.patch_jump(then_jump).unwrap();
    chunk.write_op(OpCode::Pop, 1);
    chunk.write_op(OpCode::True, 1);
    chunk.patch_jump(else_jump).unwrap();

    // then-branch skips POP, NIL, JUMP+2 operand bytes
    assert_eq!(chunk.read_u16(then_jump), Some(5));
    // else-branch skips POP, TRUE
    assert_eq!(chunk.read_u16(else_jump), Some(2));
}

#[test]
fn test_read_past_end() {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Loop, 3);
    chunk.write(1, 3);
    assert_eq!(chunk.read_u8(1), Some(1));
    assert_eq!(chunk.read_u16(1), None);
    assert_eq!(chunk.constant(0), None);
}

#[test]
fn test_constants_keep_insertion_order() {
    let mut chunk = Chunk::new();
    let a = chunk.add_constant(Value::Number(1.0)).unwrap();
    let b = chunk.add_constant(Value::Bool(true)).unwrap();
    assert_eq!((a, b), (0, 1));
    assert_eq!(chunk.constants(), &[Value::Number(1.0), Value::Bool(true)]);
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ChunkError::TooManyConstants.to_string(),
        "Too many constants in one chunk."
    );
    assert_eq!(ChunkError::UnknownOpcode(99).to_string(), "unknown opcode 99");
}
