//! Handle stack
//!
//! Every value returned to native code lives in a handle slot. Slots are
//! grouped into frames; popping a frame releases every slot minted inside it.
//! Each slot carries a serial number that is never reused, so a `Handle`
//! kept past the end of its frame is detected instead of silently reading
//! whatever value took over the slot.

use super::heap::{CustomRoots, RootAcceptor};
use super::value::JsValue;
use crate::error::VmError;

/// A rooted value slot
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle {
    slot: u32,
    serial: u32,
}

impl Handle {
    /// Pack into the 64-bit form used across the C boundary. Never 0.
    pub fn to_bits(self) -> u64 {
        (u64::from(self.serial) << 32) | u64::from(self.slot)
    }

    /// Unpack a 64-bit handle. 0 (the null handle) yields `None`.
    pub fn from_bits(bits: u64) -> Option<Self> {
        let serial = (bits >> 32) as u32;
        if serial == 0 {
            return None;
        }
        Some(Self {
            slot: bits as u32,
            serial,
        })
    }
}

struct HandleSlot {
    serial: u32,
    value: JsValue,
}

pub struct HandleStack {
    slots: Vec<HandleSlot>,
    /// Start offset of every open frame; `frames[0]` is the base frame
    frames: Vec<usize>,
    next_serial: u32,
}

impl Default for HandleStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleStack {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            frames: vec![0],
            next_serial: 1,
        }
    }

    /// Open a frame. Returns its depth, which must be passed to `pop_scope`.
    pub fn push_scope(&mut self) -> usize {
        self.frames.push(self.slots.len());
        self.frames.len() - 1
    }

    /// Close the innermost frame, releasing its slots.
    pub fn pop_scope(&mut self, depth: usize) -> Result<(), VmError> {
        if depth == 0 || depth + 1 != self.frames.len() {
            return Err(VmError::ScopeMismatch);
        }
        if let Some(start) = self.frames.pop() {
            self.slots.truncate(start);
        }
        Ok(())
    }

    /// Number of open frames, the base frame included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of live slots across all frames
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Root a value in the innermost frame
    pub fn make_handle(&mut self, value: JsValue) -> Result<Handle, VmError> {
        let slot = u32::try_from(self.slots.len()).map_err(|_| VmError::HandleOverflow)?;
        let serial = self.next_serial;
        self.next_serial = match self.next_serial.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        self.slots.push(HandleSlot { serial, value });
        Ok(Handle { slot, serial })
    }

    fn slot(&self, handle: Handle) -> Option<&HandleSlot> {
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.serial == handle.serial)
    }

    pub fn get(&self, handle: Handle) -> Option<&JsValue> {
        self.slot(handle).map(|slot| &slot.value)
    }

    pub fn is_valid(&self, handle: Handle) -> bool {
        self.slot(handle).is_some()
    }

    /// Overwrite the value of a live handle
    pub fn set(&mut self, handle: Handle, value: JsValue) -> Result<(), VmError> {
        match self
            .slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.serial == handle.serial)
        {
            Some(slot) => {
                slot.value = value;
                Ok(())
            }
            None => Err(VmError::StaleHandle),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &JsValue> {
        self.slots.iter().map(|slot| &slot.value)
    }
}

impl CustomRoots for HandleStack {
    fn mark_roots(&self, acceptor: &mut dyn RootAcceptor) {
        for value in self.values() {
            acceptor.accept(value);
        }
    }
}
