//! # Error Handling for the Meon Compiler & VM
//!
//! This module defines the two error taxonomies used throughout Meon:
//! compile-time diagnostics produced by the scanner/compiler, and runtime
//! faults produced by the VM.
//!
//! ## Design
//! - [`CompileErrorKind`] is a compact enumeration of the categories of
//!   mistake the compiler can report. [`CompileError`] wraps one with the
//!   source line/column it occurred at so the CLI can print a caret
//!   diagnostic.
//! - [`RuntimeError`] is a richer enum representing faults that can occur
//!   while the VM is executing a chunk. It includes both categorized
//!   errors (`TypeMismatchNumber`, `UndefinedVariable`, ...) and structural
//!   ones (`StackOverflow`, `VmInvariant`).
//!
//! ## Display
//! Both implement [`fmt::Display`] for human-readable messages and
//! [`std::error::Error`] so they integrate with Rust's standard error
//! handling ecosystem.

use std::fmt;

/// Categories of compile-time diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Scanner: string literal not closed before EOF or end of line.
    UnterminatedString,
    /// Scanner: a byte that starts no valid token.
    UnexpectedCharacter,
    /// Parser: a specific token or construct was expected but not found.
    Expected(String),
    /// Parser: more than 256 constants emitted into one chunk.
    TooManyConstants,
    /// Parser: more than 256 locals declared in one function.
    TooManyLocals,
    /// Parser: more than 256 upvalues captured by one function.
    TooManyUpvalues,
    /// Parser: more than 255 parameters in a function declaration.
    TooManyParameters,
    /// Parser: more than 255 arguments in a call expression.
    TooManyArguments,
    /// Parser: the same local name declared twice in one scope.
    DuplicateLocal(String),
    /// Parser: a local variable referenced from within its own initializer.
    ReadInOwnInitializer,
    /// Parser: the left-hand side of `=` is not a valid assignment target.
    InvalidAssignmentTarget,
    /// Parser: `return` used outside of any function body.
    ReturnFromTopLevel,
    /// Parser: `break` used outside of a loop.
    BreakOutsideLoop,
    /// Parser: `continue` used outside of a loop.
    ContinueOutsideLoop,
    /// Codegen: a loop body compiled to more than 65535 bytes of code.
    LoopBodyTooLarge,
    /// Codegen: an `if`/`and`/`or` branch needed to jump over more than
    /// 65535 bytes of code.
    JumpTooLarge,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::UnterminatedString => write!(f, "Unterminated string."),
            CompileErrorKind::UnexpectedCharacter => write!(f, "Unexpected character."),
            CompileErrorKind::Expected(msg) => write!(f, "{}", msg),
            CompileErrorKind::TooManyConstants => write!(f, "Too many constants in one chunk."),
            CompileErrorKind::TooManyLocals => write!(f, "Too many local variables in function."),
            CompileErrorKind::TooManyUpvalues => {
                write!(f, "Too many closure variables in function.")
            }
            CompileErrorKind::TooManyParameters => {
                write!(f, "Can't have more than 255 parameters.")
            }
            CompileErrorKind::TooManyArguments => {
                write!(f, "Can't have more than 255 arguments.")
            }
            CompileErrorKind::DuplicateLocal(name) => {
                write!(f, "Already a variable named '{}' in this scope.", name)
            }
            CompileErrorKind::ReadInOwnInitializer => {
                write!(f, "Can't read local variable in its own initializer.")
            }
            CompileErrorKind::InvalidAssignmentTarget => write!(f, "Invalid assignment target."),
            CompileErrorKind::ReturnFromTopLevel => {
                write!(f, "Can't return from top-level code.")
            }
            CompileErrorKind::BreakOutsideLoop => write!(f, "Can't use 'break' outside of a loop."),
            CompileErrorKind::ContinueOutsideLoop => {
                write!(f, "Can't use 'continue' outside of a loop.")
            }
            CompileErrorKind::LoopBodyTooLarge => write!(f, "Loop body too large."),
            CompileErrorKind::JumpTooLarge => write!(f, "Too much code to jump over."),
        }
    }
}

/// A single compile diagnostic, anchored at the token that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
    pub column: u32,
    /// The offending lexeme, where one is available (empty for EOF errors).
    pub lexeme: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        if self.lexeme.is_empty() {
            write!(f, " at end")?;
        } else {
            write!(f, " at '{}'", self.lexeme)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for CompileError {}

/// Errors that can occur while the VM executes a compiled chunk.
///
/// Unlike [`CompileErrorKind`], these surface with a full call-frame
/// backtrace rather than a single caret (see `vm::report_runtime_error`).
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Arithmetic/comparison/negate applied to a non-number operand.
    TypeMismatchNumber,
    /// `.` (concat) applied to a non-string operand.
    TypeMismatchString,
    /// Referenced a global that was never defined.
    UndefinedVariable(String),
    /// Division by a zero divisor.
    DivisionByZero,
    /// Modulo by a zero divisor.
    ModuloByZero,
    /// Called a value that is neither a closure nor a native function.
    NotCallable,
    /// Called a closure/native with the wrong number of arguments.
    ArityMismatch { expected: usize, got: usize },
    /// The call-frame stack exceeded its fixed capacity.
    StackOverflow,
    /// Internal VM invariant violated (a bug in the VM, not the program).
    VmInvariant(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeMismatchNumber => write!(f, "Operands must be numbers."),
            RuntimeError::TypeMismatchString => write!(f, "Operands must be strings."),
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable '{}'.", name),
            RuntimeError::DivisionByZero => write!(f, "Division by zero."),
            RuntimeError::ModuloByZero => write!(f, "Modulo by zero."),
            RuntimeError::NotCallable => write!(f, "Can only call functions."),
            RuntimeError::ArityMismatch { expected, got } => {
                write!(f, "Expected {} arguments but got {}.", expected, got)
            }
            RuntimeError::StackOverflow => write!(f, "Oops! stack OVERFLOW."),
            RuntimeError::VmInvariant(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Outcome of driving a chunk through the VM to completion, mirroring the
/// `INTERPRET_OK`/`INTERPRET_COMPILE_ERROR`/`INTERPRET_RUNTIME_ERROR` result
/// the original C implementation returns from `interpret()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}
