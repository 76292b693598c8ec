//! Call, closure-creation, and upvalue opcode handlers.
//! Jump/loop themselves stay in the main dispatch loop since they're just
//! `ip` arithmetic; what lives here is everything that touches a frame,
//! the heap's closure/upvalue objects, or the open-upvalue chain.

use super::{CallFrame, Vm, FRAMES_MAX};
use crate::error::RuntimeError;
use crate::object::{Obj, ObjClosure, ObjUpvalue};
use crate::value::Value;

impl Vm {
    pub(super) fn call_value(&mut self, callee: Value, argc: u8) -> Result<(), RuntimeError> {
        let id = match callee.as_object() {
            Some(id) => id,
            None => return Err(RuntimeError::NotCallable),
        };
        match self.heap.get(id) {
            Obj::Closure(c) => {
                let function_id = c.function;
                let arity = match self.heap.get(function_id) {
                    Obj::Function(f) => f.arity,
                    _ => unreachable!("closure always points at a Function"),
                };
                if argc != arity {
                    return Err(RuntimeError::ArityMismatch {
                        expected: arity as usize,
                        got: argc as usize,
                    });
                }
                if self.frames.len() >= FRAMES_MAX {
                    return Err(RuntimeError::StackOverflow);
                }
                let base = self.stack.len() - argc as usize - 1;
                self.frames.push(CallFrame { closure: id, ip: 0, base });
                Ok(())
            }
            Obj::Native(_) => self.call_native(id, argc),
            _ => Err(RuntimeError::NotCallable),
        }
    }

    fn call_native(&mut self, id: crate::object::ObjId, argc: u8) -> Result<(), RuntimeError> {
        let (arity, function) = match self.heap.get(id) {
            Obj::Native(n) => (n.arity, n.function),
            _ => unreachable!("call_native only invoked on Obj::Native"),
        };
        if argc != arity {
            return Err(RuntimeError::ArityMismatch {
                expected: arity as usize,
                got: argc as usize,
            });
        }
        let arg_start = self.stack.len() - argc as usize;
        let result = function(&self.stack[arg_start..])?;
        self.stack.truncate(arg_start - 1);
        self.push(result)
    }

    pub(super) fn make_closure(&mut self) -> Result<(), RuntimeError> {
        let function_value = self.read_constant();
        let function_id = function_value
            .as_object()
            .expect("OP_CLOSURE operand is always a Function constant");
        let upvalue_count = match self.heap.get(function_id) {
            Obj::Function(f) => f.upvalue_count,
            _ => unreachable!("OP_CLOSURE constant is always a Function"),
        };
        let mut upvalues = Vec::with_capacity(upvalue_count as usize);
        for _ in 0..upvalue_count {
            let is_local = self.read_byte();
            let index = self.read_byte() as usize;
            if is_local == 1 {
                let base = self.current_frame().base;
                upvalues.push(self.capture_upvalue(base + index));
            } else {
                let enclosing = self.current_frame().closure;
                let captured = match self.heap.get(enclosing) {
                    Obj::Closure(c) => c.upvalues[index],
                    _ => unreachable!("enclosing frame always holds a Closure"),
                };
                upvalues.push(captured);
            }
        }
        let closure_id = self.heap.alloc_closure(ObjClosure {
            function: function_id,
            upvalues,
        });
        self.maybe_collect();
        self.push(Value::Object(closure_id))
    }

    pub(super) fn read_upvalue(&mut self, idx: usize) -> Value {
        let closure_id = self.current_frame().closure;
        let upvalue_id = match self.heap.get(closure_id) {
            Obj::Closure(c) => c.upvalues[idx],
            _ => unreachable!("frame closure is always a Closure"),
        };
        match self.heap.get(upvalue_id) {
            Obj::Upvalue(ObjUpvalue::Open { stack_index, .. }) => self.stack[*stack_index],
            Obj::Upvalue(ObjUpvalue::Closed(v)) => *v,
            _ => unreachable!("upvalue slot always holds an Upvalue"),
        }
    }

    pub(super) fn write_upvalue(&mut self, idx: usize, value: Value) {
        let closure_id = self.current_frame().closure;
        let upvalue_id = match self.heap.get(closure_id) {
            Obj::Closure(c) => c.upvalues[idx],
            _ => unreachable!("frame closure is always a Closure"),
        };
        let stack_index = match self.heap.get(upvalue_id) {
            Obj::Upvalue(ObjUpvalue::Open { stack_index, .. }) => Some(*stack_index),
            Obj::Upvalue(ObjUpvalue::Closed(_)) => None,
            _ => unreachable!("upvalue slot always holds an Upvalue"),
        };
        match stack_index {
            Some(si) => self.stack[si] = value,
            None => {
                if let Obj::Upvalue(u) = self.heap.get_mut(upvalue_id) {
                    *u = ObjUpvalue::Closed(value);
                }
            }
        }
    }

    /// Finds (or creates) the open upvalue for `stack_index`, keeping the
    /// chain sorted by descending stack address.
    pub(super) fn capture_upvalue(&mut self, stack_index: usize) -> crate::object::ObjId {
        let mut prev = None;
        let mut current = self.open_upvalues;
        while let Some(id) = current {
            let (idx, next) = match self.heap.get(id) {
                Obj::Upvalue(ObjUpvalue::Open { stack_index, next }) => (*stack_index, *next),
                _ => unreachable!("open_upvalues chain only holds Open upvalues"),
            };
            if idx == stack_index {
                return id;
            }
            if idx < stack_index {
                break;
            }
            prev = Some(id);
            current = next;
        }

        let new_id = self.heap.alloc_upvalue(ObjUpvalue::Open {
            stack_index,
            next: current,
        });
        self.maybe_collect();
        match prev {
            Some(p) => {
                if let Obj::Upvalue(ObjUpvalue::Open { next, .. }) = self.heap.get_mut(p) {
                    *next = Some(new_id);
                }
            }
            None => self.open_upvalues = Some(new_id),
        }
        new_id
    }

    /// Closes every open upvalue at or above `from`, detaching it from the
    /// chain and copying its last live value out of the stack.
    pub(super) fn close_upvalues(&mut self, from: usize) {
        while let Some(id) = self.open_upvalues {
            let (idx, next) = match self.heap.get(id) {
                Obj::Upvalue(ObjUpvalue::Open { stack_index, next }) => (*stack_index, *next),
                _ => break,
            };
            if idx < from {
                break;
            }
            let value = self.stack[idx];
            if let Obj::Upvalue(u) = self.heap.get_mut(id) {
                *u = ObjUpvalue::Closed(value);
            }
            self.open_upvalues = next;
        }
    }
}
