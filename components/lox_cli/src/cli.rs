//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use interpreter::VmConfig;
use memory_manager::{GcConfig, MIN_GROWTH_FACTOR};

/// Lox bytecode runtime
///
/// Runs a script file, an inline program, or an interactive session when
/// neither is given.
#[derive(Debug, Parser)]
#[command(name = "lox", version, about)]
pub struct Cli {
    /// Script to run
    pub file: Option<PathBuf>,

    /// Run this program text instead of a file
    #[arg(short, long, conflicts_with = "file")]
    pub eval: Option<String>,

    /// Print the disassembled bytecode of every function before running
    #[arg(long)]
    pub print_bytecode: bool,

    /// Trace each executed instruction (logged at trace level)
    #[arg(long)]
    pub trace: bool,

    /// Collect garbage on every allocation
    #[arg(long)]
    pub gc_stress: bool,

    /// Heap growth factor applied after each collection
    #[arg(long, default_value_t = 2.0, value_parser = parse_growth_factor)]
    pub gc_growth_factor: f64,

    /// Log filter, e.g. `debug` or `memory_manager=trace`; overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// VM configuration selected by the flags
    pub fn vm_config(&self) -> VmConfig {
        VmConfig::default()
            .with_gc(
                GcConfig::default()
                    .with_growth_factor(self.gc_growth_factor)
                    .with_stress(self.gc_stress),
            )
            .with_trace_execution(self.trace)
    }
}

fn parse_growth_factor(arg: &str) -> Result<f64, String> {
    let factor: f64 = arg
        .parse()
        .map_err(|_| format!("`{}` is not a number", arg))?;
    if !factor.is_finite() || factor < MIN_GROWTH_FACTOR {
        return Err(format!(
            "must be a finite number of at least {}",
            MIN_GROWTH_FACTOR
        ));
    }
    Ok(factor)
}
