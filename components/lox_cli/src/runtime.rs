//! Runtime orchestration for Lox execution
//!
//! The Runtime wraps one persistent [`Vm`] so that globals survive across
//! REPL lines, and adds the presentation concerns of the CLI: reading
//! files and printing bytecode listings.

use std::path::Path;

use bytecode_system::disassemble_chunk;
use core_types::{InterpretError, InterpretResult, ObjRef};
use interpreter::{Vm, VmConfig};

use crate::error::{CliError, CliResult};

/// Main runtime that drives compilation and execution for the CLI
pub struct Runtime {
    /// Persistent VM instance for maintaining state
    vm: Vm,
    /// Whether to print bytecode before execution
    print_bytecode: bool,
}

impl Runtime {
    /// Create a runtime around a fresh VM
    ///
    /// # Example
    /// ```
    /// use interpreter::VmConfig;
    /// use lox_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new(VmConfig::default());
    /// runtime.execute_string("var x = 42;").unwrap();
    /// ```
    pub fn new(config: VmConfig) -> Self {
        Self::with_vm(Vm::with_config(config))
    }

    /// Create a runtime around an existing VM
    pub fn with_vm(vm: Vm) -> Self {
        Self {
            vm,
            print_bytecode: false,
        }
    }

    /// Enable bytecode printing
    pub fn with_print_bytecode(mut self, enabled: bool) -> Self {
        self.print_bytecode = enabled;
        self
    }

    /// Run a Lox script file
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read or the script fails
    pub fn execute_file(&mut self, path: impl AsRef<Path>) -> CliResult<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("running {} ({} bytes)", path.display(), source.len());
        self.execute_string(&source)
    }

    /// Run Lox source text
    ///
    /// # Errors
    /// Returns `CliError` on a compile or runtime error
    pub fn execute_string(&mut self, source: &str) -> CliResult<()> {
        let script = self.vm.compile(source).map_err(InterpretError::from)?;
        if self.print_bytecode {
            print!("{}", self.listing(script));
        }
        self.vm.run_script(script)?;
        Ok(())
    }

    /// Run one REPL line, reporting errors to the VM's diagnostics sink
    pub fn interpret_line(&mut self, line: &str) -> InterpretResult {
        let result = match self.vm.compile(line) {
            Ok(script) => {
                if self.print_bytecode {
                    print!("{}", self.listing(script));
                }
                self.vm.run_script(script)
            }
            Err(errors) => Err(errors.into()),
        };
        self.vm.report(result)
    }

    /// Listing of the script and every function nested in it
    ///
    /// # Errors
    /// Returns `CliError` if the source does not compile
    pub fn disassemble(&mut self, source: &str) -> CliResult<String> {
        let script = self.vm.compile(source).map_err(InterpretError::from)?;
        Ok(self.listing(script))
    }

    fn listing(&self, script: ObjRef) -> String {
        let heap = self.vm.heap();

        let mut listing = String::new();
        let mut pending = vec![script];
        while let Some(function) = pending.pop() {
            let Some(function) = heap.function(function) else {
                continue;
            };
            let name = function
                .name
                .map(|name| heap.describe(name))
                .unwrap_or_else(|| "<script>".to_string());
            listing.push_str(&disassemble_chunk(&function.chunk, &name, heap));

            let nested = function
                .chunk
                .constants()
                .iter()
                .filter_map(|constant| constant.as_obj())
                .filter(|&r| heap.function(r).is_some());
            // Reverse so functions are listed in source order.
            let start = pending.len();
            pending.extend(nested);
            pending[start..].reverse();
        }
        listing
    }

    /// Start the interactive REPL
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }

    /// The underlying VM
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// The underlying VM, mutably
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Check if bytecode printing is enabled
    pub fn is_print_bytecode_enabled(&self) -> bool {
        self.print_bytecode
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}
