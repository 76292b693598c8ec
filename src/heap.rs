//! # Heap Arena & Garbage Collector
//!
//! Meon backs every heap allocation with a single arena, `Heap`, rather
//! than a hand-rolled intrusive linked list of individually-allocated
//! objects. Live objects are addressed by [`ObjId`] handles (see
//! `object.rs`); the arena itself, not the object, carries each slot's
//! `marked` bit. This keeps the following invariants intact:
//!
//! - every live object is reachable from the roots;
//! - every interned string is the unique canonical instance for its bytes;
//! - the open-upvalue chain stays sorted by descending stack address.
//!
//! This module provides the mechanical primitives (`alloc`, `mark_object`,
//! `blacken_object`, `sweep`, intern-table lookup); [`crate::vm::Vm`] owns
//! the actual collection cycle because only it knows the full root set
//! (operand stack, call frames, globals, compiler roots).

use std::collections::HashMap;

use crate::object::{Obj, ObjClosure, ObjFunction, ObjNative, ObjString, ObjUpvalue};
use crate::value::Value;

use crate::object::ObjId;

/// Initial GC threshold: collect once total live bytes exceeds 1 MiB, then
/// double the threshold after each cycle.
const INITIAL_NEXT_GC: usize = 1024 * 1024;

struct Slot {
    marked: bool,
    obj: Obj,
    /// Rough cost of this allocation in bytes, used to drive
    /// `bytes_allocated`/`next_gc`. Not a real `sizeof`;
    /// just large enough to make the threshold meaningful.
    size: usize,
}

/// The heap arena, intern table, and GC bookkeeping.
pub struct Heap {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    /// Weak map from FNV-1a hash to candidate interned strings with that
    /// hash: entries whose string
    /// did not survive the last mark phase are dropped during sweep.
    strings: HashMap<u32, Vec<ObjId>>,
    pub bytes_allocated: usize,
    pub next_gc: usize,
    /// When set, every allocation that grows live bytes triggers a
    /// collection.
    pub stress_gc: bool,
    /// Head of the singly-linked open-upvalue list, sorted by descending
    /// stack address.
    pub open_upvalues: Option<ObjId>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            strings: HashMap::new(),
            bytes_allocated: 0,
            next_gc: INITIAL_NEXT_GC,
            stress_gc: false,
            open_upvalues: None,
        }
    }

    fn insert(&mut self, obj: Obj, size: usize) -> ObjId {
        self.bytes_allocated += size;
        let slot = Some(Slot {
            marked: false,
            obj,
            size,
        });
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = slot;
            ObjId(idx)
        } else {
            self.slots.push(slot);
            ObjId((self.slots.len() - 1) as u32)
        }
    }

    pub fn alloc_string(&mut self, chars: String) -> ObjId {
        let hash = ObjString::hash_bytes(chars.as_bytes());
        if let Some(existing) = self.find_interned(hash, &chars) {
            return existing;
        }
        let size = chars.len() + 32;
        let id = self.insert(Obj::String(ObjString { chars, hash }), size);
        self.strings.entry(hash).or_default().push(id);
        id
    }

    fn find_interned(&self, hash: u32, chars: &str) -> Option<ObjId> {
        let candidates = self.strings.get(&hash)?;
        for &id in candidates {
            if let Obj::String(s) = &self.slots[id.index()].as_ref()?.obj {
                if s.chars == chars {
                    return Some(id);
                }
            }
        }
        None
    }

    pub fn alloc_function(&mut self, function: ObjFunction) -> ObjId {
        let size = 64 + function.chunk.code.len() + function.chunk.constants.len() * 16;
        self.insert(Obj::Function(function), size)
    }

    pub fn alloc_native(&mut self, native: ObjNative) -> ObjId {
        self.insert(Obj::Native(native), 32)
    }

    pub fn alloc_closure(&mut self, closure: ObjClosure) -> ObjId {
        let size = 32 + closure.upvalues.len() * 8;
        self.insert(Obj::Closure(closure), size)
    }

    pub fn alloc_upvalue(&mut self, upvalue: ObjUpvalue) -> ObjId {
        self.insert(Obj::Upvalue(upvalue), 24)
    }

    pub fn get(&self, id: ObjId) -> &Obj {
        &self
            .slots
            .get(id.index())
            .and_then(|s| s.as_ref())
            .expect("dangling ObjId")
            .obj
    }

    pub fn get_mut(&mut self, id: ObjId) -> &mut Obj {
        &mut self
            .slots
            .get_mut(id.index())
            .and_then(|s| s.as_mut())
            .expect("dangling ObjId")
            .obj
    }

    pub fn is_marked(&self, id: ObjId) -> bool {
        self.slots[id.index()].as_ref().map(|s| s.marked).unwrap_or(false)
    }

    /// Marks `id`, returning `true` if it was newly marked (i.e. the
    /// caller should push it onto the gray worklist to be blackened).
    pub fn mark_object(&mut self, id: ObjId) -> bool {
        let slot = self.slots[id.index()].as_mut().expect("dangling ObjId");
        if slot.marked {
            false
        } else {
            slot.marked = true;
            true
        }
    }

    pub fn mark_value(&mut self, value: Value) -> Option<ObjId> {
        if let Value::Object(id) = value {
            if self.mark_object(id) {
                return Some(id);
            }
        }
        None
    }

    /// Traverses `id`'s outgoing references, pushing newly-discovered
    /// objects onto `gray`.
    pub fn blacken_object(&mut self, id: ObjId, gray: &mut Vec<ObjId>) {
        // Collect child ids/values first so we don't hold a borrow of
        // `self` across the recursive `mark_*` calls below.
        enum Child {
            Id(ObjId),
            Val(Value),
        }
        let mut children: Vec<Child> = Vec::new();
        match self.get(id) {
            Obj::String(_) | Obj::Native(_) => {}
            Obj::Function(f) => {
                if let Some(name) = f.name {
                    children.push(Child::Id(name));
                }
                for c in &f.chunk.constants {
                    children.push(Child::Val(*c));
                }
            }
            Obj::Closure(c) => {
                children.push(Child::Id(c.function));
                for &uv in &c.upvalues {
                    children.push(Child::Id(uv));
                }
            }
            Obj::Upvalue(u) => {
                if let ObjUpvalue::Closed(v) = u {
                    children.push(Child::Val(*v));
                }
            }
        }
        for child in children {
            match child {
                Child::Id(child_id) => {
                    if self.mark_object(child_id) {
                        gray.push(child_id);
                    }
                }
                Child::Val(v) => {
                    if let Some(child_id) = self.mark_value(v) {
                        gray.push(child_id);
                    }
                }
            }
        }
    }

    /// Sweeps the arena: frees every unmarked slot, clears the mark bit on
    /// survivors, and drops weak intern-table entries whose string did not
    /// survive.
    pub fn sweep(&mut self) {
        for idx in 0..self.slots.len() {
            let dead = match &self.slots[idx] {
                Some(slot) => !slot.marked,
                None => false,
            };
            if dead {
                let slot = self.slots[idx].take().unwrap();
                self.bytes_allocated -= slot.size;
                self.free.push(idx as u32);
            } else if let Some(slot) = self.slots[idx].as_mut() {
                slot.marked = false;
            }
        }
        let slots = &self.slots;
        self.strings.retain(|_, ids| {
            ids.retain(|id| slots[id.index()].is_some());
            !ids.is_empty()
        });
    }

    pub fn should_collect(&self) -> bool {
        self.stress_gc || self.bytes_allocated > self.next_gc
    }

    pub fn grow_threshold(&mut self) {
        self.next_gc = self.bytes_allocated * 2;
    }

    /// Total number of live (non-freed) slots, for GC invariant tests.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn live_ids(&self) -> Vec<ObjId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| ObjId(i as u32)))
            .collect()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_bytes_returns_the_same_id() {
        let mut heap = Heap::new();
        let a = heap.alloc_string("hello".to_string());
        let b = heap.alloc_string("hello".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn interning_distinct_bytes_returns_distinct_ids() {
        let mut heap = Heap::new();
        let a = heap.alloc_string("hello".to_string());
        let b = heap.alloc_string("world".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn sweep_frees_unmarked_and_resets_marked_survivors() {
        let mut heap = Heap::new();
        let kept = heap.alloc_string("kept".to_string());
        let garbage = heap.alloc_string("garbage".to_string());
        assert_eq!(heap.live_count(), 2);

        heap.mark_object(kept);
        heap.sweep();

        assert_eq!(heap.live_count(), 1);
        assert_eq!(heap.live_ids(), vec![kept]);
        assert!(!heap.is_marked(kept), "mark bit must be cleared after sweep");
        let _ = garbage;
    }

    #[test]
    fn sweep_drops_weak_intern_entries_for_freed_strings() {
        let mut heap = Heap::new();
        let id = heap.alloc_string("ephemeral".to_string());
        heap.sweep();
        assert_eq!(heap.live_count(), 0);

        // Interning the same bytes again must not return the freed id.
        let new_id = heap.alloc_string("ephemeral".to_string());
        assert_ne!(id, new_id);
    }
}
