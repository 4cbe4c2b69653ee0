//! Per-function compile state and local variable resolution

use arrayvec::ArrayVec;
use bytecode_system::Chunk;
use core_types::ObjRef;

/// Maximum locals (including the reserved slot 0) in one function
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

/// What kind of function body is being compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Top-level script
    Script,
    /// `fun` declaration
    Function,
}

/// A local variable slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local<'src> {
    /// Variable name
    pub name: &'src str,
    /// Scope depth, or `None` while its initializer is being compiled
    pub depth: Option<usize>,
}

/// Compile state of one function under construction
///
/// Its chunk is not in the heap yet; the compiler reports its name and
/// constants to the collector as roots.
#[derive(Debug)]
pub struct FunctionState<'src> {
    /// Function name, `None` for the script
    pub name: Option<ObjRef>,
    /// Parameters declared so far
    pub arity: usize,
    /// Code emitted so far
    pub chunk: Chunk,
    /// Script or function
    pub kind: FunctionKind,
    /// Locals in declaration order; slot 0 is reserved for the callee
    pub locals: ArrayVec<Local<'src>, MAX_LOCALS>,
    /// Current block nesting, 0 at function top level
    pub scope_depth: usize,
}

impl<'src> FunctionState<'src> {
    /// Fresh state with slot 0 reserved
    pub fn new(kind: FunctionKind, name: Option<ObjRef>) -> Self {
        let mut locals = ArrayVec::new();
        locals.push(Local {
            name: "",
            depth: Some(0),
        });
        Self {
            name,
            arity: 0,
            chunk: Chunk::new(),
            kind,
            locals,
            scope_depth: 0,
        }
    }

    /// Enter a block
    pub fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Leave a block, dropping its locals. Returns how many were dropped.
    pub fn end_scope(&mut self) -> usize {
        self.scope_depth = self.scope_depth.saturating_sub(1);
        let depth = self.scope_depth;
        let mut dropped = 0;
        while self
            .locals
            .last()
            .is_some_and(|local| local.depth.is_some_and(|d| d > depth))
        {
            self.locals.pop();
            dropped += 1;
        }
        dropped
    }

    /// Declare an uninitialized local in the current scope
    ///
    /// # Errors
    ///
    /// Returns the diagnostic if the name is already declared in this same
    /// scope or if there is no free slot.
    pub fn declare_local(&mut self, name: &'src str) -> Result<(), &'static str> {
        for local in self.locals.iter().rev() {
            if local.depth.is_some_and(|d| d < self.scope_depth) {
                break;
            }
            if local.name == name {
                return Err("Already a variable with this name in this scope.");
            }
        }
        self.locals
            .try_push(Local { name, depth: None })
            .map_err(|_| "Too many local variables in function.")
    }

    /// Mark the most recent local as usable
    pub fn mark_initialized(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let depth = self.scope_depth;
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    /// Stack slot of the innermost local named `name`
    ///
    /// `Ok(None)` means the name is not local and resolves as a global.
    ///
    /// # Errors
    ///
    /// Reading a local inside its own initializer is an error.
    pub fn resolve_local(&self, name: &str) -> Result<Option<u8>, &'static str> {
        match self
            .locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name)
        {
            Some((_, Local { depth: None, .. })) => {
                Err("Can't read local variable in its own initializer.")
            }
            Some((slot, _)) => Ok(Some(slot as u8)),
            None => Ok(None),
        }
    }
}
