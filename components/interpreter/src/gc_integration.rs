//! GC root wiring for the VM
//!
//! The collector never sees the VM directly. Every allocation the VM makes
//! passes a [`VmRoots`] view over the value stack, the call frames and the
//! globals table.

use core_types::Value;
use memory_manager::{Roots, Table, Tracer};

use crate::call_frame::CallFrame;

/// Borrowed view of everything the VM keeps alive
pub struct VmRoots<'a> {
    /// Live value stack slots
    pub stack: &'a [Value],
    /// Active call frames
    pub frames: &'a [CallFrame],
    /// Global variables
    pub globals: &'a Table,
}

impl Roots for VmRoots<'_> {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        for value in self.stack {
            tracer.mark_value(*value);
        }
        for frame in self.frames {
            tracer.mark_object(frame.function);
        }
        tracer.mark_table(self.globals);
    }
}
