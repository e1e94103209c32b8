//! Objects, arrays and property access

use super::{Env, Value};
use crate::error::{NapiError, NapiResult};
use crate::prelude::index_set_new;
use crate::vm::{ErrorKind, JsValue, ObjectData, ObjectId, ObjectKind, PropertyKey};

/// Longest array `create_array_with_length` preallocates
const MAX_PREALLOCATED_LENGTH: u32 = 1 << 24;

impl Env {
    /// ToPropertyKey for an engine value
    fn property_key(&self, key: Value) -> NapiResult<PropertyKey> {
        let key = self.resolve(key)?;
        if key.is_object() {
            return Ok(PropertyKey::from(self.runtime().to_string(&key)?));
        }
        Ok(PropertyKey::from_value(&key))
    }

    /// Common prologue of the property operations: no pending exception and
    /// an object receiver.
    fn receiver(&self, object: Value) -> NapiResult<ObjectId> {
        self.preamble()?;
        self.resolve_object(object)
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    pub fn create_object(&mut self) -> NapiResult<Value> {
        let proto = self.runtime().intrinsics().object_prototype;
        self.alloc_value(ObjectData::with_prototype(ObjectKind::Ordinary, Some(proto)))
    }

    pub fn create_array(&mut self) -> NapiResult<Value> {
        self.create_array_with_length(0)
    }

    /// Create an array of `length` holes (read back as `undefined`)
    pub fn create_array_with_length(&mut self, length: u32) -> NapiResult<Value> {
        if length > MAX_PREALLOCATED_LENGTH {
            return self.raise(ErrorKind::RangeError, "Invalid array length");
        }
        let proto = self.runtime().intrinsics().array_prototype;
        let elements = vec![JsValue::Undefined; length as usize];
        self.alloc_value(ObjectData::with_prototype(
            ObjectKind::Array(elements),
            Some(proto),
        ))
    }

    pub fn is_array(&self, value: Value) -> NapiResult<bool> {
        Ok(match self.resolve(value)? {
            JsValue::Object(id) => matches!(self.runtime().object(id)?.kind, ObjectKind::Array(_)),
            _ => false,
        })
    }

    pub fn get_array_length(&self, value: Value) -> NapiResult<u32> {
        let id = self.resolve(value)?.as_object().ok_or(NapiError::ArrayExpected)?;
        match &self.runtime().object(id)?.kind {
            ObjectKind::Array(elements) => {
                u32::try_from(elements.len()).map_err(|_| NapiError::generic("array too long"))
            }
            _ => Err(NapiError::ArrayExpected),
        }
    }

    pub fn get_prototype(&mut self, object: Value) -> NapiResult<Value> {
        let id = self.receiver(object)?;
        let proto = match self.runtime().prototype_of(id)? {
            Some(proto) => JsValue::Object(proto),
            None => JsValue::Null,
        };
        self.mint(proto)
    }

    // ------------------------------------------------------------------------
    // Properties by value key
    // ------------------------------------------------------------------------

    pub fn set_property(&mut self, object: Value, key: Value, value: Value) -> NapiResult<()> {
        let id = self.receiver(object)?;
        let key = self.property_key(key)?;
        let value = self.resolve(value)?;
        self.runtime_mut().set(id, key, value)?;
        Ok(())
    }

    pub fn get_property(&mut self, object: Value, key: Value) -> NapiResult<Value> {
        let id = self.receiver(object)?;
        let key = self.property_key(key)?;
        let value = self.runtime().get(id, &key)?;
        self.mint(value)
    }

    pub fn has_property(&self, object: Value, key: Value) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        let key = self.property_key(key)?;
        Ok(self.runtime().has(id, &key)?)
    }

    /// The key must be a string or a symbol
    pub fn has_own_property(&self, object: Value, key: Value) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        if !matches!(self.resolve(key)?, JsValue::String(_) | JsValue::Symbol(_)) {
            return Err(NapiError::NameExpected);
        }
        let key = self.property_key(key)?;
        Ok(self.runtime().has_own(id, &key)?)
    }

    /// The key must be a string, a number or a symbol. Returns whether the
    /// property is gone afterwards.
    pub fn delete_property(&mut self, object: Value, key: Value) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        if !matches!(
            self.resolve(key)?,
            JsValue::String(_) | JsValue::Number(_) | JsValue::Symbol(_)
        ) {
            return Err(NapiError::NameExpected);
        }
        let key = self.property_key(key)?;
        Ok(self.runtime_mut().delete(id, &key)?)
    }

    // ------------------------------------------------------------------------
    // Named properties and elements
    // ------------------------------------------------------------------------

    pub fn set_named_property(&mut self, object: Value, name: &str, value: Value) -> NapiResult<()> {
        let id = self.receiver(object)?;
        let value = self.resolve(value)?;
        self.runtime_mut().set(id, PropertyKey::from(name), value)?;
        Ok(())
    }

    pub fn get_named_property(&mut self, object: Value, name: &str) -> NapiResult<Value> {
        let id = self.receiver(object)?;
        let value = self.runtime().get(id, &PropertyKey::from(name))?;
        self.mint(value)
    }

    pub fn has_named_property(&self, object: Value, name: &str) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        Ok(self.runtime().has(id, &PropertyKey::from(name))?)
    }

    pub fn set_element(&mut self, object: Value, index: u32, value: Value) -> NapiResult<()> {
        let id = self.receiver(object)?;
        let value = self.resolve(value)?;
        self.runtime_mut().set(id, PropertyKey::Index(index), value)?;
        Ok(())
    }

    pub fn get_element(&mut self, object: Value, index: u32) -> NapiResult<Value> {
        let id = self.receiver(object)?;
        let value = self.runtime().get(id, &PropertyKey::Index(index))?;
        self.mint(value)
    }

    pub fn has_element(&self, object: Value, index: u32) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        Ok(self.runtime().has(id, &PropertyKey::Index(index))?)
    }

    pub fn delete_element(&mut self, object: Value, index: u32) -> NapiResult<bool> {
        let id = self.receiver(object)?;
        Ok(self.runtime_mut().delete(id, &PropertyKey::Index(index))?)
    }

    /// Own string-keyed property names, as an array of strings
    pub fn get_property_names(&mut self, object: Value) -> NapiResult<Value> {
        let id = self.receiver(object)?;
        let mut names = index_set_new();
        for key in self.runtime().own_keys(id)? {
            if !matches!(key, PropertyKey::Symbol(_)) {
                names.insert(key);
            }
        }
        let elements = names.iter().map(PropertyKey::to_value).collect();
        let proto = self.runtime().intrinsics().array_prototype;
        self.alloc_value(ObjectData::with_prototype(
            ObjectKind::Array(elements),
            Some(proto),
        ))
    }
}
