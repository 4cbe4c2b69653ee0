//! Unit tests for interpreter public API

mod test_vm;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use interpreter::{Vm, VmConfig};

/// Shared in-memory sink for VM output
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// VM with captured output and diagnostics
pub fn capture_vm(config: VmConfig) -> (Vm, Capture, Capture) {
    let out = Capture::default();
    let err = Capture::default();
    let vm = Vm::with_config(config)
        .with_output(out.clone())
        .with_diagnostics(err.clone());
    (vm, out, err)
}
