//! Long-lived references
//!
//! A reference pins an engine value beyond the handle scope it was created
//! in. Its count decides the strength:
//!
//! * count > 0: the value is a strong GC root,
//! * count 0 and an object target: the object is held weakly and the
//!   reference resolves to nothing once it is collected,
//! * count 0 and any other target: nothing is held at all.
//!
//! Entries live in a generation-checked arena. Each entry sits in exactly one
//! of three intrusive lists (one per strength), so moving between strengths
//! and deleting are O(1), and the collector can walk just the strong or just
//! the weak list.

use crate::error::{NapiError, NapiResult};
use crate::vm::{CustomRoots, Heap, JsValue, RootAcceptor, WeakRoot, WeakRootAcceptor};

/// Handle to a reference owned by an `Env`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    index: u32,
    generation: u32,
}

impl Reference {
    /// Opaque non-zero form passed across the C boundary
    pub fn into_raw(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        let generation = (raw >> 32) as u32;
        (generation != 0).then_some(Self {
            index: raw as u32,
            generation,
        })
    }
}

/// Which list a reference is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    /// Count 0, non-object target, nothing held
    Value,
    /// Count 0, object target held weakly
    Weak,
    /// Count > 0, target is a root
    Strong,
}

impl Strength {
    fn list(self) -> usize {
        match self {
            Strength::Value => 0,
            Strength::Weak => 1,
            Strength::Strong => 2,
        }
    }
}

#[derive(Debug)]
enum Storage {
    Empty,
    Strong(JsValue),
    Weak(WeakRoot),
}

impl Storage {
    /// Storage for a count-0 reference to `value`
    fn released(value: &JsValue) -> Self {
        match value.as_object() {
            Some(id) => Storage::Weak(WeakRoot::new(id)),
            None => Storage::Empty,
        }
    }

    fn strength(&self) -> Strength {
        match self {
            Storage::Empty => Strength::Value,
            Storage::Weak(_) => Strength::Weak,
            Storage::Strong(_) => Strength::Strong,
        }
    }
}

#[derive(Debug)]
struct Entry {
    count: u32,
    storage: Storage,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug)]
pub(crate) struct ReferenceTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    heads: [Option<u32>; 3],
    lens: [usize; 3],
}

fn deleted() -> NapiError {
    tracing::warn!(
        target: "hermes_napi::reference",
        "use of a deleted reference"
    );
    NapiError::InvalidArg("reference has been deleted")
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            heads: [None; 3],
            lens: [0; 3],
        }
    }

    fn entry(&self, reference: Reference) -> NapiResult<&Entry> {
        self.slots
            .get(reference.index as usize)
            .filter(|slot| slot.generation == reference.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or_else(deleted)
    }

    fn entry_mut(&mut self, reference: Reference) -> NapiResult<&mut Entry> {
        self.slots
            .get_mut(reference.index as usize)
            .filter(|slot| slot.generation == reference.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or_else(deleted)
    }

    fn entry_at_mut(&mut self, index: u32) -> Option<&mut Entry> {
        self.slots
            .get_mut(index as usize)
            .and_then(|slot| slot.entry.as_mut())
    }

    // ------------------------------------------------------------------------
    // Intrusive lists
    // ------------------------------------------------------------------------

    fn link(&mut self, index: u32, strength: Strength) {
        let list = strength.list();
        let old_head = self.heads.get(list).copied().flatten();
        if let Some(entry) = self.entry_at_mut(index) {
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(head) = old_head {
            if let Some(entry) = self.entry_at_mut(head) {
                entry.prev = Some(index);
            }
        }
        if let Some(head) = self.heads.get_mut(list) {
            *head = Some(index);
        }
        if let Some(len) = self.lens.get_mut(list) {
            *len += 1;
        }
    }

    fn unlink(&mut self, index: u32, strength: Strength) {
        let list = strength.list();
        let (prev, next) = match self.entry_at_mut(index) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };
        match prev {
            Some(prev) => {
                if let Some(entry) = self.entry_at_mut(prev) {
                    entry.next = next;
                }
            }
            None => {
                if let Some(head) = self.heads.get_mut(list) {
                    *head = next;
                }
            }
        }
        if let Some(next) = next {
            if let Some(entry) = self.entry_at_mut(next) {
                entry.prev = prev;
            }
        }
        if let Some(len) = self.lens.get_mut(list) {
            *len -= 1;
        }
    }

    fn iter_list(&self, strength: Strength) -> impl Iterator<Item = &Entry> + '_ {
        let mut cursor = self.heads.get(strength.list()).copied().flatten();
        std::iter::from_fn(move || {
            let index = cursor?;
            let entry = self.slots.get(index as usize)?.entry.as_ref()?;
            cursor = entry.next;
            Some(entry)
        })
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    pub fn create(&mut self, value: JsValue, initial_count: u32) -> Reference {
        let storage = if initial_count > 0 {
            Storage::Strong(value)
        } else {
            Storage::released(&value)
        };
        let strength = storage.strength();
        let entry = Entry {
            count: initial_count,
            storage,
            prev: None,
            next: None,
        };

        let reference = match self.free.pop() {
            Some(index) => {
                let generation = match self.slots.get_mut(index as usize) {
                    Some(slot) => {
                        slot.entry = Some(entry);
                        slot.generation
                    }
                    None => 0,
                };
                Reference { index, generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 1,
                    entry: Some(entry),
                });
                Reference {
                    index,
                    generation: 1,
                }
            }
        };
        self.link(reference.index, strength);
        reference
    }

    pub fn delete(&mut self, reference: Reference) -> NapiResult<()> {
        let strength = self.entry(reference)?.storage.strength();
        self.unlink(reference.index, strength);
        if let Some(slot) = self.slots.get_mut(reference.index as usize) {
            slot.entry = None;
            slot.generation = match slot.generation.wrapping_add(1) {
                0 => 1,
                n => n,
            };
        }
        self.free.push(reference.index);
        Ok(())
    }

    /// Increment the count. Going 0 -> 1 makes the reference strong again;
    /// a collected weak target (or an empty reference) becomes `undefined`.
    pub fn reference_ref(&mut self, reference: Reference, heap: &Heap) -> NapiResult<u32> {
        let entry = self.entry(reference)?;
        let old_strength = entry.storage.strength();
        let count = entry
            .count
            .checked_add(1)
            .ok_or_else(|| NapiError::generic("reference count overflow"))?;

        let promoted = match &entry.storage {
            Storage::Strong(_) => None,
            Storage::Empty => Some(JsValue::Undefined),
            Storage::Weak(weak) => Some(
                weak.get(heap)
                    .map(JsValue::Object)
                    .unwrap_or(JsValue::Undefined),
            ),
        };

        let entry = self.entry_mut(reference)?;
        entry.count = count;
        if let Some(value) = promoted {
            entry.storage = Storage::Strong(value);
            self.unlink(reference.index, old_strength);
            self.link(reference.index, Strength::Strong);
        }
        Ok(count)
    }

    /// Decrement the count. Rejected at 0 with no state change; going 1 -> 0
    /// demotes the target to weak (objects) or drops it (everything else).
    pub fn reference_unref(&mut self, reference: Reference) -> NapiResult<u32> {
        let entry = self.entry_mut(reference)?;
        if entry.count == 0 {
            tracing::warn!(
                target: "hermes_napi::reference",
                "unref of a reference whose count is already 0"
            );
            return Err(NapiError::generic("reference count is already 0"));
        }
        entry.count -= 1;
        let count = entry.count;
        if count == 0 {
            let old_strength = entry.storage.strength();
            let demoted = match &entry.storage {
                Storage::Strong(value) => Storage::released(value),
                Storage::Weak(_) | Storage::Empty => return Ok(0),
            };
            let new_strength = demoted.strength();
            entry.storage = demoted;
            self.unlink(reference.index, old_strength);
            self.link(reference.index, new_strength);
        }
        Ok(count)
    }

    /// Current target: strong value, live weak object, or nothing
    pub fn get(&self, reference: Reference, heap: &Heap) -> NapiResult<Option<JsValue>> {
        Ok(match &self.entry(reference)?.storage {
            Storage::Strong(value) => Some(value.clone()),
            Storage::Weak(weak) => weak.get(heap).map(JsValue::Object),
            Storage::Empty => None,
        })
    }

    pub fn count(&self, reference: Reference) -> NapiResult<u32> {
        Ok(self.entry(reference)?.count)
    }

    pub fn strength(&self, reference: Reference) -> NapiResult<Strength> {
        Ok(self.entry(reference)?.storage.strength())
    }

    pub fn len(&self, strength: Strength) -> usize {
        self.lens.get(strength.list()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.lens.iter().sum()
    }

    /// Delete every reference (teardown). No finalizers run.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = match slot.generation.wrapping_add(1) {
                    0 => 1,
                    n => n,
                };
                self.free.push(index as u32);
            }
        }
        self.heads = [None; 3];
        self.lens = [0; 3];
    }
}

impl CustomRoots for ReferenceTable {
    fn mark_roots(&self, acceptor: &mut dyn RootAcceptor) {
        for entry in self.iter_list(Strength::Strong) {
            if let Storage::Strong(value) = &entry.storage {
                acceptor.accept(value);
            }
        }
    }

    fn mark_weak_roots(&self, acceptor: &mut dyn WeakRootAcceptor) {
        for entry in self.iter_list(Strength::Weak) {
            if let Storage::Weak(weak) = &entry.storage {
                acceptor.accept_weak(weak);
            }
        }
    }
}
