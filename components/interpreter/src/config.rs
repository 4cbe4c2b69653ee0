//! VM configuration

use memory_manager::GcConfig;

/// Maximum call depth
pub const FRAMES_MAX: usize = 64;

/// Value stack capacity reserved up front
pub const STACK_MAX: usize = FRAMES_MAX * (u8::MAX as usize + 1);

/// Runtime configuration for a [`Vm`](crate::Vm)
///
/// # Examples
///
/// ```
/// use interpreter::VmConfig;
///
/// let config = VmConfig::default().with_trace_execution(true);
/// assert!(config.trace_execution);
/// assert!(!config.gc.stress);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    /// Collector settings for the VM's heap
    pub gc: GcConfig,
    /// Log the stack and each instruction at `trace` level before dispatch
    pub trace_execution: bool,
}

impl VmConfig {
    /// Replace the collector settings
    pub fn with_gc(mut self, gc: GcConfig) -> Self {
        self.gc = gc;
        self
    }

    /// Enable or disable execution tracing
    pub fn with_trace_execution(mut self, trace: bool) -> Self {
        self.trace_execution = trace;
        self
    }

    /// Collect on every allocation
    pub fn with_gc_stress(mut self, stress: bool) -> Self {
        self.gc = self.gc.with_stress(stress);
        self
    }
}
