//! Call frame for function call stack management

use std::rc::Rc;

use bytecode_system::Chunk;
use core_types::ObjRef;

/// Call frame representing one active function invocation
///
/// The frame's locals live on the VM value stack starting at `slot_base`;
/// slot 0 holds the callee itself.
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// Function being executed; kept as a GC root while the frame is live
    pub function: ObjRef,
    /// The function's bytecode
    pub chunk: Rc<Chunk>,
    /// Offset of the next instruction to execute
    pub ip: usize,
    /// Stack index of the frame's slot 0
    pub slot_base: usize,
}

impl CallFrame {
    /// Create a frame positioned at the start of `chunk`
    pub fn new(function: ObjRef, chunk: Rc<Chunk>, slot_base: usize) -> Self {
        Self {
            function,
            chunk,
            ip: 0,
            slot_base,
        }
    }

    /// Source line of the instruction currently executing
    pub fn current_line(&self) -> u32 {
        self.chunk.line(self.ip.saturating_sub(1)).unwrap_or(0)
    }
}
