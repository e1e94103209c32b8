//! References

use super::{Env, Value};
use crate::error::NapiResult;
use crate::reference::{Reference, Strength};

impl Env {
    /// Create a reference to `value`. A count of 0 holds objects weakly and
    /// anything else not at all; a positive count makes `value` a GC root.
    pub fn create_reference(&mut self, value: Value, initial_count: u32) -> NapiResult<Reference> {
        let value = self.resolve(value)?;
        Ok(self.references.create(value, initial_count))
    }

    /// Delete a reference. No finalizer runs; later use is `InvalidArg`.
    pub fn delete_reference(&mut self, reference: Reference) -> NapiResult<()> {
        self.references.delete(reference)
    }

    pub fn reference_ref(&mut self, reference: Reference) -> NapiResult<u32> {
        self.references
            .reference_ref(reference, self.runtime.heap())
    }

    /// Fails with `GenericFailure` when the count is already 0.
    pub fn reference_unref(&mut self, reference: Reference) -> NapiResult<u32> {
        self.references.reference_unref(reference)
    }

    /// The referenced value, or `None` if it was collected or never held
    pub fn get_reference_value(&mut self, reference: Reference) -> NapiResult<Option<Value>> {
        match self.references.get(reference, self.runtime.heap())? {
            Some(value) => Ok(Some(self.mint(value)?)),
            None => Ok(None),
        }
    }

    pub fn reference_count(&self, reference: Reference) -> NapiResult<u32> {
        self.references.count(reference)
    }

    pub fn reference_strength(&self, reference: Reference) -> NapiResult<Strength> {
        self.references.strength(reference)
    }

    /// Number of live references on the given list
    pub fn reference_list_len(&self, strength: Strength) -> usize {
        self.references.len(strength)
    }
}
