use bytecode_system::{disassemble_chunk, Chunk, ConstantFormatter, OpCode};
use core_types::Value;

struct Quoted;

impl ConstantFormatter for Quoted {
    fn format_constant(&self, value: Value) -> String {
        format!("<{}>", value)
    }
}

#[test]
fn test_custom_constant_formatter() {
    let mut chunk = Chunk::new();
    let idx = chunk.add_constant(Value::Nil).unwrap();
    chunk.write_op(OpCode::GetGlobal, 1);
    chunk.write(idx, 1);
    chunk.write_op(OpCode::Print, 2);

    let listing = disassemble_chunk(&chunk, "script", &Quoted);
    assert!(listing.contains("OP_GET_GLOBAL       0 '<nil>'"));
    assert!(listing.contains("0002    2 OP_PRINT"));
}

#[test]
fn test_byte_operands() {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::PopN, 4);
    chunk.write(3, 4);
    chunk.write_op(OpCode::Call, 4);
    chunk.write(2, 4);

    let listing = disassemble_chunk(&chunk, "ops", &Quoted);
    assert!(listing.contains("OP_POPN             3"));
    assert!(listing.contains("OP_CALL             2"));
}
