//! Built-in native functions

use std::time::{SystemTime, UNIX_EPOCH};

use core_types::Value;
use memory_manager::NativeFn;

/// Natives installed in every new VM
pub const STANDARD_NATIVES: &[(&str, NativeFn)] = &[("clock", clock)];

/// `clock()` - wall-clock seconds since the Unix epoch
pub fn clock(_args: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(seconds)
}
