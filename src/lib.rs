//! Meon: a dynamically-typed scripting language, compiled in a single pass
//! to bytecode and executed on a stack-based virtual machine with closures,
//! a tracing garbage collector, and string interning.
//!
//! The public surface is deliberately small: [`compiler::compile`] turns
//! source text into a compiled [`object::ObjFunction`], and [`vm::Vm`] is
//! the execution context that owns the heap, globals, and call stack
//! needed to run one. `Vm` is an explicit context object, not process-global
//! state, so a host embedding this crate can run more than one program
//! concurrently.

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod error;
pub mod gc;
pub mod heap;
pub mod native;
pub mod object;
pub mod repl;
pub mod scanner;
pub mod value;
pub mod vm;

pub use error::{CompileError, InterpretResult, RuntimeError};
pub use vm::Vm;
