//! # Native Functions
//!
//! Host-provided globals every [`crate::vm::Vm`] starts with: `clock`
//! returns seconds-since-process-start as a float; `time` returns
//! wall-clock Unix seconds. Both are the kind of small, deterministic-enough
//! host hook a scripting runtime's test suite and example programs rely on.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::error::RuntimeError;
use crate::value::Value;
use crate::vm::Vm;

static START: Lazy<Instant> = Lazy::new(Instant::now);

fn clock(_args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(START.elapsed().as_secs_f64()))
}

fn time(_args: &[Value]) -> Result<Value, RuntimeError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(Value::Number(secs))
}

pub fn register(vm: &mut Vm) {
    Lazy::force(&START);
    vm.define_native("clock", 0, clock);
    vm.define_native("time", 0, time);
}
