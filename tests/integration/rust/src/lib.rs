//! Integration test suite for the Lox runtime
//!
//! This crate provides integration tests that verify components work
//! together correctly across component boundaries, plus the shared
//! helpers they use to capture program output.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use core_types::InterpretResult;
use interpreter::{Vm, VmConfig};

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use lox_cli;
    pub use memory_manager;
    pub use parser;
}

/// In-memory writer whose contents stay readable after the VM takes it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Forget everything written so far
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A VM wired to in-memory output and diagnostics
pub struct Harness {
    /// The VM under test
    pub vm: Vm,
    /// What `print` wrote
    pub output: SharedBuffer,
    /// What error reports wrote
    pub diagnostics: SharedBuffer,
}

impl Harness {
    /// Harness with the given configuration
    pub fn new(config: VmConfig) -> Self {
        let output = SharedBuffer::default();
        let diagnostics = SharedBuffer::default();
        let vm = Vm::with_config(config)
            .with_output(output.clone())
            .with_diagnostics(diagnostics.clone());
        Self {
            vm,
            output,
            diagnostics,
        }
    }

    /// Interpret `source` on the harness VM
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        self.vm.interpret(source)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

/// Run `source` on a fresh VM; returns the result, stdout and stderr text
pub fn run_source(source: &str) -> (InterpretResult, String, String) {
    let mut harness = Harness::default();
    let result = harness.interpret(source);
    (
        result,
        harness.output.contents(),
        harness.diagnostics.contents(),
    )
}
