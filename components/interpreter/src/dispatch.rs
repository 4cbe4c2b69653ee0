//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution. Every failure is returned as a
//! [`RuntimeError`] without a backtrace; [`Vm::run`] attaches the frames and
//! resets the stacks.

use std::fmt::Write as _;
use std::io::Write as _;
use std::rc::Rc;

use bytecode_system::{disassemble_instruction, Chunk, OpCode};
use core_types::{ErrorKind, ObjRef, RuntimeError, Value};
use memory_manager::{HeapObject, NativeFn, ObjBoundMethod, ObjClass, ObjInstance, StringKey};

use crate::call_frame::CallFrame;
use crate::vm::Vm;

type Result<T> = std::result::Result<T, RuntimeError>;

fn internal(message: impl Into<String>) -> RuntimeError {
    RuntimeError::new(ErrorKind::Internal, message)
}

fn type_error(message: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::TypeError, message)
}

fn arity_error(expected: usize, got: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::Arity,
        format!("Expected {} arguments but got {}.", expected, got),
    )
}

/// What a call site resolved to
enum Callee {
    Function { arity: u8, chunk: Rc<Chunk> },
    Native(NativeFn),
    Class,
    BoundMethod { receiver: Value, method: ObjRef },
}

impl Vm {
    /// Run until the outermost frame returns
    pub(crate) fn execute(&mut self) -> Result<()> {
        loop {
            if self.config.trace_execution {
                self.trace_instruction();
            }

            let byte = self.read_byte()?;
            let op = OpCode::from_byte(byte)
                .ok_or_else(|| internal(format!("Unknown opcode {}.", byte)))?;

            match op {
                OpCode::Constant => {
                    let value = self.read_constant()?;
                    self.push(value);
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::PopN => {
                    let count = self.read_byte()? as usize;
                    let height = self
                        .stack
                        .len()
                        .checked_sub(count)
                        .ok_or_else(|| internal("Stack underflow."))?;
                    self.stack.truncate(height);
                }
                OpCode::GetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.stack[slot];
                    self.push(value);
                }
                OpCode::SetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.peek(0)?;
                    self.stack[slot] = value;
                }
                OpCode::GetGlobal => {
                    let name = self.read_string()?;
                    match self.globals.get(name) {
                        Some(value) => self.push(value),
                        None => return Err(self.undefined_variable(name)),
                    }
                }
                OpCode::DefineGlobal => {
                    let name = self.read_string()?;
                    let value = self.peek(0)?;
                    self.globals.set(name, value);
                    self.pop()?;
                }
                OpCode::SetGlobal => {
                    let name = self.read_string()?;
                    let value = self.peek(0)?;
                    if self.globals.set(name, value) {
                        self.globals.delete(name);
                        return Err(self.undefined_variable(name));
                    }
                }
                OpCode::GetProperty => self.get_property()?,
                OpCode::SetProperty => self.set_property()?,
                OpCode::Equal => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Bool(a == b));
                }
                OpCode::Greater => self.binary_number(|a, b| Value::Bool(a > b))?,
                OpCode::Less => self.binary_number(|a, b| Value::Bool(a < b))?,
                OpCode::Add => self.add()?,
                OpCode::Subtract => self.binary_number(|a, b| Value::Number(a - b))?,
                OpCode::Multiply => self.binary_number(|a, b| Value::Number(a * b))?,
                OpCode::Divide => self.binary_number(|a, b| Value::Number(a / b))?,
                OpCode::Not => {
                    let value = self.pop()?;
                    self.push(Value::Bool(value.is_falsey()));
                }
                OpCode::Negate => {
                    let n = self
                        .peek(0)?
                        .as_number()
                        .ok_or_else(|| type_error("Operand must be a number."))?;
                    self.pop()?;
                    self.push(Value::Number(-n));
                }
                OpCode::Print => {
                    let value = self.pop()?;
                    let text = self.heap.format_value(value);
                    writeln!(self.output, "{}", text)
                        .map_err(|err| internal(format!("Failed to write output: {}", err)))?;
                }
                OpCode::Jump => {
                    let offset = self.read_u16()?;
                    self.frame_mut()?.ip += offset;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16()?;
                    if self.peek(0)?.is_falsey() {
                        self.frame_mut()?.ip += offset;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_u16()?;
                    let frame = self.frame_mut()?;
                    frame.ip = frame
                        .ip
                        .checked_sub(offset)
                        .ok_or_else(|| internal("Loop target before start of chunk."))?;
                }
                OpCode::Call => {
                    let arg_count = self.read_byte()? as usize;
                    let callee = self.peek(arg_count)?;
                    self.call_value(callee, arg_count)?;
                }
                OpCode::Class => {
                    let name = self.read_string()?;
                    let class = self.alloc(HeapObject::Class(ObjClass::new(name.obj)));
                    self.push(Value::Obj(class));
                }
                OpCode::Return => {
                    let result = self.pop()?;
                    let frame = self
                        .frames
                        .pop()
                        .ok_or_else(|| internal("Return with no active frame."))?;
                    self.stack.truncate(frame.slot_base);
                    if self.frames.is_empty() {
                        return Ok(());
                    }
                    self.push(result);
                }
            }
        }
    }

    /// Call `callee` with the `arg_count` values above it on the stack
    pub(crate) fn call_value(&mut self, callee: Value, arg_count: usize) -> Result<()> {
        let callee_slot = self
            .stack
            .len()
            .checked_sub(arg_count + 1)
            .ok_or_else(|| internal("Stack underflow."))?;

        let target = callee.as_obj();
        let resolved = match target.and_then(|r| self.heap.get(r)) {
            Some(HeapObject::Function(function)) => Callee::Function {
                arity: function.arity,
                chunk: Rc::clone(&function.chunk),
            },
            Some(HeapObject::Native(native)) => Callee::Native(native.function),
            Some(HeapObject::Class(_)) => Callee::Class,
            Some(HeapObject::BoundMethod(bound)) => Callee::BoundMethod {
                receiver: bound.receiver,
                method: bound.method,
            },
            _ => return Err(type_error("Can only call functions and classes.")),
        };
        let Some(target) = target else {
            return Err(internal("Callee is not an object."));
        };

        match resolved {
            Callee::Function { arity, chunk } => {
                if arg_count != arity as usize {
                    return Err(arity_error(arity as usize, arg_count));
                }
                self.frames
                    .try_push(CallFrame::new(target, chunk, callee_slot))
                    .map_err(|_| RuntimeError::new(ErrorKind::StackOverflow, "Stack overflow."))
            }
            Callee::Native(function) => {
                let result = function(&self.stack[callee_slot + 1..]);
                self.stack.truncate(callee_slot);
                self.push(result);
                Ok(())
            }
            Callee::Class => {
                if arg_count != 0 {
                    return Err(arity_error(0, arg_count));
                }
                let instance = self.alloc(HeapObject::Instance(ObjInstance::new(target)));
                self.stack[callee_slot] = Value::Obj(instance);
                Ok(())
            }
            Callee::BoundMethod { receiver, method } => {
                self.stack[callee_slot] = receiver;
                self.call_value(Value::Obj(method), arg_count)
            }
        }
    }

    fn get_property(&mut self) -> Result<()> {
        let name = self.read_string()?;
        let receiver = self.peek(0)?;
        let Some(instance) = receiver.as_obj().and_then(|r| self.heap.instance(r)) else {
            return Err(type_error("Only instances have properties."));
        };
        let class = instance.class;
        let field = instance.fields.get(name);

        match field {
            Some(value) => {
                self.pop()?;
                self.push(value);
                Ok(())
            }
            None => self.bind_method(class, name),
        }
    }

    /// Replace the receiver on top of the stack with `class`'s method
    /// `name` bound to it.
    fn bind_method(&mut self, class: ObjRef, name: StringKey) -> Result<()> {
        let method = self
            .heap
            .class(class)
            .and_then(|class| class.methods.get(name))
            .and_then(|method| method.as_obj());
        let Some(method) = method else {
            return Err(RuntimeError::new(
                ErrorKind::UndefinedProperty,
                format!("Undefined property '{}'.", self.heap.describe(name.obj)),
            ));
        };

        let receiver = self.peek(0)?;
        let bound = self.alloc(HeapObject::BoundMethod(ObjBoundMethod { receiver, method }));
        self.pop()?;
        self.push(Value::Obj(bound));
        Ok(())
    }

    fn set_property(&mut self) -> Result<()> {
        let name = self.read_string()?;
        let target = self.peek(1)?;
        let instance = target
            .as_obj()
            .filter(|&r| self.heap.instance(r).is_some())
            .ok_or_else(|| type_error("Only instances have fields."))?;

        let value = self.peek(0)?;
        self.heap.set_field(instance, name, value);
        self.pop()?;
        self.pop()?;
        self.push(value);
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        let b = self.peek(0)?;
        let a = self.peek(1)?;
        let result = match (a, b) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::Obj(a), Value::Obj(b))
                if self.heap.string(a).is_some() && self.heap.string(b).is_some() =>
            {
                // Operands stay on the stack until the result exists.
                let joined = self
                    .concatenate(a, b)
                    .ok_or_else(|| internal("Concatenation of freed strings."))?;
                Value::Obj(joined)
            }
            _ => return Err(type_error("Operands must be two numbers or two strings.")),
        };
        self.pop()?;
        self.pop()?;
        self.push(result);
        Ok(())
    }

    fn binary_number(&mut self, op: fn(f64, f64) -> Value) -> Result<()> {
        let (Some(b), Some(a)) = (self.peek(0)?.as_number(), self.peek(1)?.as_number()) else {
            return Err(type_error("Operands must be numbers."));
        };
        self.pop()?;
        self.pop()?;
        self.push(op(a, b));
        Ok(())
    }

    fn undefined_variable(&self, name: StringKey) -> RuntimeError {
        RuntimeError::new(
            ErrorKind::UndefinedVariable,
            format!("Undefined variable '{}'.", self.heap.describe(name.obj)),
        )
    }

    // ---- stack ----

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(|| internal("Stack underflow."))
    }

    fn peek(&self, distance: usize) -> Result<Value> {
        self.stack
            .len()
            .checked_sub(distance + 1)
            .map(|index| self.stack[index])
            .ok_or_else(|| internal("Stack underflow."))
    }

    /// Read a slot operand and turn it into an absolute stack index
    fn local_slot(&mut self) -> Result<usize> {
        let slot = self.read_byte()? as usize;
        let index = self.frame_mut()?.slot_base + slot;
        if index >= self.stack.len() {
            return Err(internal(format!("Local slot {} out of range.", slot)));
        }
        Ok(index)
    }

    // ---- instruction stream ----

    fn frame_mut(&mut self) -> Result<&mut CallFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| internal("No active call frame."))
    }

    fn read_byte(&mut self) -> Result<u8> {
        let frame = self.frame_mut()?;
        let byte = frame
            .chunk
            .read_u8(frame.ip)
            .ok_or_else(|| internal("Instruction pointer out of bounds."))?;
        frame.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<usize> {
        let frame = self.frame_mut()?;
        let value = frame
            .chunk
            .read_u16(frame.ip)
            .ok_or_else(|| internal("Instruction pointer out of bounds."))?;
        frame.ip += 2;
        Ok(value as usize)
    }

    fn read_constant(&mut self) -> Result<Value> {
        let index = self.read_byte()?;
        self.frame_mut()?
            .chunk
            .constant(index)
            .ok_or_else(|| internal(format!("Constant {} out of range.", index)))
    }

    fn read_string(&mut self) -> Result<StringKey> {
        let constant = self.read_constant()?;
        constant
            .as_obj()
            .and_then(|r| self.heap.string_key(r))
            .ok_or_else(|| internal("Name constant is not a string."))
    }

    fn trace_instruction(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let Some(frame) = self.frames.last() else {
            return;
        };

        let mut stack = String::from("          ");
        for value in &self.stack {
            let _ = write!(stack, "[ {} ]", self.heap.format_value(*value));
        }
        log::trace!("{}", stack);

        let mut instruction = String::new();
        disassemble_instruction(&frame.chunk, frame.ip, &self.heap, &mut instruction);
        log::trace!("{}", instruction);
    }
}
