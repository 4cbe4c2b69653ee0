//! Virtual Machine for bytecode execution
//!
//! Main entry point for compiling and running Lox source.

use std::io::{self, Write};

use arrayvec::ArrayVec;
use core_types::{CompileErrors, InterpretError, InterpretResult, ObjRef, StackFrame, Value};
use memory_manager::{Heap, HeapObject, NativeFn, ObjNative, Table};

use crate::call_frame::CallFrame;
use crate::config::{VmConfig, FRAMES_MAX, STACK_MAX};
use crate::gc_integration::VmRoots;
use crate::natives::STANDARD_NATIVES;

/// Virtual Machine for executing Lox bytecode
///
/// The VM owns the execution state:
/// - Object heap and collector
/// - Value stack and call frames
/// - Global variables
/// - Output sink for `print` and a diagnostics sink for reported errors
///
/// Each `Vm` is fully independent; globals persist across calls to
/// [`Vm::interpret`] on the same instance.
///
/// # Example
///
/// ```
/// use interpreter::Vm;
/// use core_types::InterpretResult;
///
/// let mut vm = Vm::new();
/// assert_eq!(vm.interpret("var answer = 6 * 7;"), InterpretResult::Ok);
/// let answer = vm.get_global("answer").unwrap();
/// assert_eq!(vm.format_value(answer), "42");
/// ```
pub struct Vm {
    pub(crate) heap: Heap,
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: ArrayVec<CallFrame, FRAMES_MAX>,
    pub(crate) globals: Table,
    pub(crate) config: VmConfig,
    pub(crate) output: Box<dyn Write>,
    diagnostics: Box<dyn Write>,
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("stack", &self.stack)
            .field("frame_count", &self.frames.len())
            .field("globals", &self.globals.len())
            .field("objects", &self.heap.object_count())
            .field("config", &self.config)
            .finish()
    }
}

impl Vm {
    /// Create a VM with the default configuration, printing to stdout
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Create a VM with the given configuration
    pub fn with_config(config: VmConfig) -> Self {
        let mut vm = Self {
            heap: Heap::with_config(config.gc.clone()),
            stack: Vec::with_capacity(STACK_MAX),
            frames: ArrayVec::new(),
            globals: Table::new(),
            config,
            output: Box::new(io::stdout()),
            diagnostics: Box::new(io::stderr()),
        };
        for &(name, function) in STANDARD_NATIVES {
            vm.define_native(name, function);
        }
        vm
    }

    /// Send `print` output to `output` instead of stdout
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Send error reports from [`Vm::interpret`] to `diagnostics` instead
    /// of stderr
    pub fn with_diagnostics(mut self, diagnostics: impl Write + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Compile and run `source`, reporting any error to the diagnostics
    /// sink.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let result = self.run(source);
        self.report(result)
    }

    /// Write the error in `result`, if any, to the diagnostics sink.
    pub fn report(&mut self, result: Result<(), InterpretError>) -> InterpretResult {
        let outcome = InterpretResult::from(&result);
        let report = match result {
            Ok(()) => None,
            Err(InterpretError::Compile(errors)) => Some(errors.to_string()),
            Err(InterpretError::Runtime(error)) => Some(error.report()),
        };
        if let Some(report) = report {
            if let Err(err) = writeln!(self.diagnostics, "{}", report) {
                log::warn!("failed to write diagnostics: {}", err);
            }
        }
        outcome
    }

    /// Compile and run `source`.
    ///
    /// # Errors
    ///
    /// Returns every compile error if the source does not compile, or the
    /// first runtime error with its backtrace. After a runtime error the
    /// stack and frames are reset; globals are kept.
    pub fn run(&mut self, source: &str) -> Result<(), InterpretError> {
        let script = self.compile(source)?;
        self.run_script(script)
    }

    /// Run a script returned by [`Vm::compile`].
    ///
    /// # Errors
    ///
    /// Returns the first runtime error with its backtrace. The stack and
    /// frames are reset afterwards; globals are kept.
    pub fn run_script(&mut self, script: ObjRef) -> Result<(), InterpretError> {
        self.stack.push(Value::Obj(script));

        let result = self
            .call_value(Value::Obj(script), 0)
            .and_then(|()| self.execute());
        if let Err(mut error) = result {
            error.stack = self.backtrace();
            log::debug!("runtime error: {}", error.message);
            self.reset();
            return Err(error.into());
        }
        Ok(())
    }

    /// Compile `source` into a script function without running it.
    ///
    /// The function is not rooted: pass it to [`Vm::run_script`] or drop it
    /// before allocating again.
    ///
    /// # Errors
    ///
    /// Returns every compile error found.
    pub fn compile(&mut self, source: &str) -> Result<ObjRef, CompileErrors> {
        let roots = VmRoots {
            stack: &self.stack,
            frames: &self.frames,
            globals: &self.globals,
        };
        parser::compile(source, &mut self.heap, &roots)
    }

    /// Install a host function as the global `name`
    pub fn define_native(&mut self, name: &str, function: NativeFn) {
        let name = self.intern(name);
        self.stack.push(Value::Obj(name));
        let native = self.alloc(HeapObject::Native(ObjNative { function }));
        self.stack.push(Value::Obj(native));

        if let Some(key) = self.heap.string_key(name) {
            self.globals.set(key, Value::Obj(native));
        }
        self.stack.truncate(self.stack.len() - 2);
    }

    /// Value of the global `name`, if defined
    pub fn get_global(&self, name: &str) -> Option<Value> {
        let name = self.heap.find_interned(name)?;
        self.globals.get(self.heap.string_key(name)?)
    }

    /// Display form of `value`, as `print` shows it
    pub fn format_value(&self, value: Value) -> String {
        self.heap.format_value(value)
    }

    /// Run a full collection now. Returns the number of bytes freed.
    pub fn collect_garbage(&mut self) -> usize {
        let roots = VmRoots {
            stack: &self.stack,
            frames: &self.frames,
            globals: &self.globals,
        };
        self.heap.collect_garbage(&roots)
    }

    /// Current value stack height
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Current call depth
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The object heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The active configuration
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Clear the value stack and call frames; globals are kept
    pub fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
    }

    /// Allocate with the VM's roots
    pub(crate) fn alloc(&mut self, object: HeapObject) -> ObjRef {
        let roots = VmRoots {
            stack: &self.stack,
            frames: &self.frames,
            globals: &self.globals,
        };
        self.heap.alloc(object, &roots)
    }

    pub(crate) fn intern(&mut self, chars: &str) -> ObjRef {
        let roots = VmRoots {
            stack: &self.stack,
            frames: &self.frames,
            globals: &self.globals,
        };
        self.heap.intern(chars, &roots)
    }

    /// Concatenate two strings; both must still be on the stack.
    pub(crate) fn concatenate(&mut self, a: ObjRef, b: ObjRef) -> Option<ObjRef> {
        let roots = VmRoots {
            stack: &self.stack,
            frames: &self.frames,
            globals: &self.globals,
        };
        self.heap.concatenate(a, b, &roots)
    }

    /// Active frames, innermost first
    fn backtrace(&self) -> Vec<StackFrame> {
        self.frames
            .iter()
            .rev()
            .map(|frame| StackFrame {
                function_name: self
                    .heap
                    .function(frame.function)
                    .and_then(|function| function.name)
                    .map(|name| self.heap.describe(name)),
                line: frame.current_line(),
            })
            .collect()
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
