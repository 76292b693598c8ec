//! # Collection Cycle
//!
//! [`mark_roots_and_collect`] runs one full mark-sweep cycle over a
//! [`Heap`]: mark every root, drain the gray worklist by blackening,
//! sweep unmarked slots, then grow the threshold. Both [`crate::vm::Vm`]
//! (rooted at the operand stack, call frames, globals, and open upvalues)
//! and [`crate::compiler::Compiler`] (rooted at the REPL's persisted
//! globals and every function still under construction) drive a cycle
//! through this one routine, so "what counts as a root" is the only thing
//! that differs between a collection that happens while running and one
//! that happens while still compiling.

use crate::heap::Heap;
use crate::object::ObjId;
use crate::value::Value;

pub fn mark_roots_and_collect(heap: &mut Heap, value_roots: &[Value], object_roots: &[ObjId]) {
    let mut gray = Vec::new();
    for &value in value_roots {
        if let Some(id) = heap.mark_value(value) {
            gray.push(id);
        }
    }
    for &id in object_roots {
        if heap.mark_object(id) {
            gray.push(id);
        }
    }
    // The open-upvalue chain is reachable from live stack slots already
    // covered by the VM's own stack roots, but marking it explicitly here
    // keeps a compile-time-only cycle (no VM stack at all) from treating an
    // upvalue as unreachable before the VM exists to walk the stack.
    while let Some(id) = gray.pop() {
        heap.blacken_object(id, &mut gray);
    }
    heap.sweep();
    heap.grow_threshold();
}
