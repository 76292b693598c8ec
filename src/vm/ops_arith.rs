//! Arithmetic, comparison, and string-concatenation opcode handlers, split
//! out from the main dispatch loop. Every handler here is a method on
//! [`Vm`] rather than a free function taking `&mut Vec<Value>`, since
//! Meon's operators need the heap (for `Concat`) and fault with
//! [`RuntimeError`] variants rather than returning a plain bool/error code.

use super::Vm;
use crate::error::RuntimeError;
use crate::value::Value;

impl Vm {
    pub(super) fn binary_numeric(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => self.push(Value::Number(op(a, b))),
            _ => Err(RuntimeError::TypeMismatchNumber),
        }
    }

    pub(super) fn numeric_compare(&mut self, op: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => self.push(Value::Bool(op(a, b))),
            _ => Err(RuntimeError::TypeMismatchNumber),
        }
    }

    pub(super) fn divide(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a.as_number(), b.as_number()) {
            (Some(_), Some(b)) if b == 0.0 => Err(RuntimeError::DivisionByZero),
            (Some(a), Some(b)) => self.push(Value::Number(a / b)),
            _ => Err(RuntimeError::TypeMismatchNumber),
        }
    }

    /// Both operands truncate to `i64` before the operation, then the
    /// result converts back to `f64` (an explicit choice recorded for this
    /// system: `%` and `^` operate on Meon's single `Number` type but don't
    /// pretend fractional modulo/exponent are meaningful operations here).
    pub(super) fn modulo(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => {
                let ib = b as i64;
                if ib == 0 {
                    return Err(RuntimeError::ModuloByZero);
                }
                self.push(Value::Number(((a as i64) % ib) as f64))
            }
            _ => Err(RuntimeError::TypeMismatchNumber),
        }
    }

    pub(super) fn exponent(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => {
                let ia = a as i64;
                let ib = b as i64;
                self.push(Value::Number(int_pow(ia, ib)))
            }
            _ => Err(RuntimeError::TypeMismatchNumber),
        }
    }

    /// `.` requires both operands to already be strings:
    /// unlike `+`, Meon does not stringify numbers for concatenation.
    pub(super) fn concat(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let (a_id, b_id) = match (a.as_object(), b.as_object()) {
            (Some(a_id), Some(b_id)) => (a_id, b_id),
            _ => return Err(RuntimeError::TypeMismatchString),
        };
        let mut result = match self.heap.get(a_id) {
            crate::object::Obj::String(s) => s.chars.clone(),
            _ => return Err(RuntimeError::TypeMismatchString),
        };
        match self.heap.get(b_id) {
            crate::object::Obj::String(s) => result.push_str(&s.chars),
            _ => return Err(RuntimeError::TypeMismatchString),
        }
        let id = self.heap.alloc_string(result);
        self.maybe_collect();
        self.push(Value::Object(id))
    }
}

fn int_pow(base: i64, exp: i64) -> f64 {
    if exp >= 0 {
        base.checked_pow(exp as u32)
            .map(|v| v as f64)
            .unwrap_or_else(|| (base as f64).powi(exp as i32))
    } else {
        let positive = base
            .checked_pow((-exp) as u32)
            .map(|v| v as f64)
            .unwrap_or_else(|| (base as f64).powi((-exp) as i32));
        1.0 / positive
    }
}
