//! Mark-and-sweep garbage collected object heap.
//!
//! Objects live in fixed-capacity chunks and are addressed by `ObjectId`
//! (slot index plus generation). A slot's generation is bumped whenever its
//! object is swept, so an id that outlived its object never resolves to the
//! slot's next tenant.
//!
//! The heap has no roots of its own. Each collection is handed a list of
//! `CustomRoots` providers; their strong roots seed the mark phase and their
//! weak roots are cleared when the target was not marked.

use std::cell::Cell;

use super::object::{HostObject, ObjectData, ObjectKind};
use super::value::JsValue;
use crate::config::GcConfig;
use crate::error::VmError;

// ============================================================================
// ChunkBitmask - 256-bit bitmask for marking objects within a chunk
// ============================================================================

/// 256-bit bitmask for marking objects within a chunk.
/// Each bit corresponds to an index in the chunk (0-255).
#[derive(Clone, Copy, Default)]
struct ChunkBitmask {
    /// 4 × u64 = 256 bits
    bits: [u64; 4],
}

impl ChunkBitmask {
    #[inline]
    fn set(&mut self, index: usize) {
        debug_assert!(index < CHUNK_CAPACITY);
        if let Some(word) = self.bits.get_mut(index >> 6) {
            *word |= 1 << (index & 63);
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        debug_assert!(index < CHUNK_CAPACITY);
        self.bits
            .get(index >> 6)
            .is_some_and(|word| word & (1 << (index & 63)) != 0)
    }

    #[inline]
    fn clear(&mut self) {
        self.bits = [0; 4];
    }
}

/// Chunk capacity: objects per chunk (matches the ChunkBitmask size)
const CHUNK_CAPACITY: usize = 256;

// ============================================================================
// ObjectId
// ============================================================================

/// Identity of a heap object: slot index plus the slot's generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    fn chunk(&self) -> usize {
        self.index as usize / CHUNK_CAPACITY
    }

    #[inline]
    fn offset(&self) -> usize {
        self.index as usize % CHUNK_CAPACITY
    }
}

// ============================================================================
// Root enumeration
// ============================================================================

/// Receives strong roots during the mark phase.
pub trait RootAcceptor {
    fn accept(&mut self, value: &JsValue);
}

/// Receives weak roots after marking; may clear them.
pub trait WeakRootAcceptor {
    fn accept_weak(&mut self, root: &WeakRoot);
}

/// A set of roots registered with a collection.
///
/// Both methods run inside the collector: they must only read their own
/// state and report it to the acceptor.
pub trait CustomRoots {
    fn mark_roots(&self, acceptor: &mut dyn RootAcceptor);

    fn mark_weak_roots(&self, _acceptor: &mut dyn WeakRootAcceptor) {}
}

/// A reference to an object that does not keep it alive.
///
/// The collector clears the root when its target dies, provided the root is
/// presented through `CustomRoots::mark_weak_roots`. `get` additionally
/// checks the heap, so an unregistered weak root never resolves to a reused
/// slot either.
#[derive(Debug)]
pub struct WeakRoot {
    target: Cell<Option<ObjectId>>,
}

impl WeakRoot {
    pub fn new(target: ObjectId) -> Self {
        Self {
            target: Cell::new(Some(target)),
        }
    }

    /// Resolve the target, or `None` if it has been collected
    pub fn get(&self, heap: &Heap) -> Option<ObjectId> {
        self.target.get().filter(|id| heap.is_live(*id))
    }

    pub fn is_cleared(&self) -> bool {
        self.target.get().is_none()
    }

    fn clear(&self) {
        self.target.set(None);
    }
}

// ============================================================================
// Heap
// ============================================================================

struct HeapSlot {
    generation: u32,
    object: Option<ObjectData>,
}

/// Summary of one collection cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Objects swept in this cycle
    pub collected: usize,
    /// Weak roots cleared because their target died
    pub weak_roots_cleared: usize,
    /// Objects still alive after the sweep
    pub live_objects: usize,
}

/// Statistics about the garbage collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcStats {
    /// Total number of slots (including free ones)
    pub total_objects: usize,
    /// Number of free slots available for reuse
    pub pooled_objects: usize,
    /// Number of live objects
    pub live_objects: usize,
    /// Number of completed collections
    pub collections: u64,
}

pub struct Heap {
    /// Chunks of slots. Each chunk has fixed capacity (CHUNK_CAPACITY).
    chunks: Vec<Vec<HeapSlot>>,

    /// Per-chunk mark bitmasks, rebuilt every cycle
    marked_chunks: Vec<ChunkBitmask>,

    /// Free slot indices
    free_list: Vec<u32>,

    /// Persistent mark stack - reused between GC cycles to avoid allocations
    mark_stack: Vec<ObjectId>,

    live: usize,

    /// Allocations since the last collection
    net_allocs: usize,

    /// Threshold for triggering collection (0 = never auto-collect)
    gc_threshold: usize,

    max_objects: usize,

    collections: u64,
}

impl Heap {
    pub fn new(config: &GcConfig) -> Self {
        Self {
            chunks: Vec::new(),
            marked_chunks: Vec::new(),
            free_list: Vec::new(),
            mark_stack: Vec::new(),
            live: 0,
            net_allocs: 0,
            gc_threshold: config.gc_threshold,
            max_objects: config.max_heap_objects,
            collections: 0,
        }
    }

    /// Allocate a new object.
    ///
    /// The caller must root the returned id (usually by minting a handle)
    /// before anything else can trigger a collection.
    pub fn alloc(&mut self, data: ObjectData) -> Result<ObjectId, VmError> {
        if self.live >= self.max_objects {
            return Err(VmError::HeapExhausted {
                limit: self.max_objects,
            });
        }

        let id = if let Some(index) = self.free_list.pop() {
            let id = ObjectId {
                index,
                generation: 0,
            };
            let slot = self
                .slot_mut(id)
                .ok_or(VmError::Internal("free list points past the heap"))?;
            slot.object = Some(data);
            ObjectId {
                index,
                generation: slot.generation,
            }
        } else {
            let need_new_chunk = self
                .chunks
                .last()
                .is_none_or(|chunk| chunk.len() >= CHUNK_CAPACITY);
            if need_new_chunk {
                self.chunks.push(Vec::with_capacity(CHUNK_CAPACITY));
                self.marked_chunks.push(ChunkBitmask::default());
            }
            let chunk_idx = self.chunks.len().saturating_sub(1);
            let chunk = self
                .chunks
                .last_mut()
                .ok_or(VmError::Internal("no chunk after creation"))?;
            let index = u32::try_from(chunk_idx * CHUNK_CAPACITY + chunk.len()).map_err(|_| {
                VmError::HeapExhausted {
                    limit: self.max_objects,
                }
            })?;
            chunk.push(HeapSlot {
                generation: 0,
                object: Some(data),
            });
            ObjectId {
                index,
                generation: 0,
            }
        };

        self.live += 1;
        self.net_allocs += 1;
        Ok(id)
    }

    fn slot(&self, id: ObjectId) -> Option<&HeapSlot> {
        self.chunks.get(id.chunk())?.get(id.offset())
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut HeapSlot> {
        self.chunks.get_mut(id.chunk())?.get_mut(id.offset())
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectData> {
        self.slot(id)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        self.slot_mut(id)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// True once enough allocations happened since the last collection
    pub fn should_collect(&self) -> bool {
        self.gc_threshold > 0 && self.net_allocs >= self.gc_threshold
    }

    /// Set the GC threshold (0 = disable automatic collection)
    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.gc_threshold = threshold;
    }

    pub fn gc_threshold(&self) -> usize {
        self.gc_threshold
    }

    // ------------------------------------------------------------------------
    // Mark
    // ------------------------------------------------------------------------

    fn is_marked(&self, id: ObjectId) -> bool {
        self.marked_chunks
            .get(id.chunk())
            .is_some_and(|mask| mask.get(id.offset()))
    }

    /// Set the mark bit; returns false if it was already set
    fn set_mark(&mut self, id: ObjectId) -> bool {
        match self.marked_chunks.get_mut(id.chunk()) {
            Some(mask) if !mask.get(id.offset()) => {
                mask.set(id.offset());
                true
            }
            _ => false,
        }
    }

    fn trace_from_stack(&mut self) {
        let mut stack = std::mem::take(&mut self.mark_stack);
        while let Some(id) = stack.pop() {
            if !self.is_live(id) || !self.set_mark(id) {
                continue;
            }
            if let Some(data) = self.get(id) {
                data.trace(|child| {
                    if !self.is_marked(child) {
                        stack.push(child);
                    }
                });
            }
        }
        stack.clear();
        self.mark_stack = stack;
    }

    // ------------------------------------------------------------------------
    // Sweep
    // ------------------------------------------------------------------------

    /// Free every unmarked object. Host objects are handed back to the
    /// caller instead of being dropped in place.
    fn sweep(&mut self, dead_hosts: &mut Vec<Box<dyn HostObject>>) -> usize {
        let mut collected = 0;
        for (chunk_idx, (chunk, mask)) in self
            .chunks
            .iter_mut()
            .zip(self.marked_chunks.iter())
            .enumerate()
        {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                if slot.object.is_none() || mask.get(offset) {
                    continue;
                }
                if let Some(data) = slot.object.take() {
                    if let ObjectKind::Host(host) = data.kind {
                        dead_hosts.push(host);
                    }
                }
                slot.generation = slot.generation.wrapping_add(1);
                // chunk_idx * 256 + offset always fits: alloc refused indices past u32
                self.free_list
                    .push((chunk_idx * CHUNK_CAPACITY + offset) as u32);
                collected += 1;
            }
        }
        self.live -= collected;
        collected
    }

    /// Run a full mark-and-sweep cycle over the given root providers.
    ///
    /// Returns the cycle summary and the host objects that died, which the
    /// caller is responsible for finalizing.
    pub fn collect(
        &mut self,
        roots: &[&dyn CustomRoots],
    ) -> (CollectionStats, Vec<Box<dyn HostObject>>) {
        for mask in &mut self.marked_chunks {
            mask.clear();
        }

        let mut marker = Marker { heap: self };
        for provider in roots {
            provider.mark_roots(&mut marker);
        }
        self.trace_from_stack();

        let mut weak = WeakSweeper {
            heap: self,
            cleared: 0,
        };
        for provider in roots {
            provider.mark_weak_roots(&mut weak);
        }
        let weak_roots_cleared = weak.cleared;

        let mut dead_hosts = Vec::new();
        let collected = self.sweep(&mut dead_hosts);
        self.net_allocs = 0;
        self.collections += 1;

        (
            CollectionStats {
                collected,
                weak_roots_cleared,
                live_objects: self.live,
            },
            dead_hosts,
        )
    }

    /// Remove every remaining host object from the heap (teardown).
    pub fn drain_host_objects(&mut self) -> Vec<Box<dyn HostObject>> {
        let mut hosts = Vec::new();
        for (chunk_idx, chunk) in self.chunks.iter_mut().enumerate() {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                if !matches!(
                    slot.object.as_ref().map(|data| &data.kind),
                    Some(ObjectKind::Host(_))
                ) {
                    continue;
                }
                if let Some(ObjectData {
                    kind: ObjectKind::Host(host),
                    ..
                }) = slot.object.take()
                {
                    hosts.push(host);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list
                    .push((chunk_idx * CHUNK_CAPACITY + offset) as u32);
                self.live -= 1;
            }
        }
        hosts
    }

    pub fn stats(&self) -> GcStats {
        let total_objects: usize = self.chunks.iter().map(|c| c.len()).sum();
        GcStats {
            total_objects,
            pooled_objects: self.free_list.len(),
            live_objects: self.live,
            collections: self.collections,
        }
    }
}

/// Mark-phase acceptor: queues live objects for tracing
struct Marker<'a> {
    heap: &'a mut Heap,
}

impl RootAcceptor for Marker<'_> {
    fn accept(&mut self, value: &JsValue) {
        if let JsValue::Object(id) = value {
            if self.heap.is_live(*id) && !self.heap.is_marked(*id) {
                self.heap.mark_stack.push(*id);
            }
        }
    }
}

/// Weak-phase acceptor: clears roots whose target was not marked
struct WeakSweeper<'a> {
    heap: &'a Heap,
    cleared: usize,
}

impl WeakRootAcceptor for WeakSweeper<'_> {
    fn accept_weak(&mut self, root: &WeakRoot) {
        if let Some(id) = root.target.get() {
            if !self.heap.is_live(id) || !self.heap.is_marked(id) {
                root.clear();
                self.cleared += 1;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
