//! Heap object layout
//!
//! Every heap cell holds an `ObjectData`: an ordered property table, an
//! optional prototype and a kind-specific payload. Native attachments made by
//! `wrap` / `add_finalizer` are stored as links to host objects so that they
//! are collected together with their owner.

use std::any::Any;

use super::heap::ObjectId;
use super::value::{JsString, JsValue, PropertyKey};
use crate::prelude::{IndexMap, index_map_new};

/// Indices further than this past the end of an array are stored as plain
/// properties instead of growing the element vector.
const MAX_ARRAY_GAP: usize = 1 << 16;

/// Error flavour, used for the `name` property and `is_error` checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    SyntaxError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}

/// Object implemented by the embedder rather than by the engine.
///
/// The engine routes property access on host objects through this trait and
/// hands the boxed object back to the owner when the GC collects it, so that
/// any native cleanup can run outside the collector.
pub trait HostObject: Any {
    fn get(&self, key: &PropertyKey) -> JsValue;

    /// Returns false when the store was refused
    fn set(&mut self, key: &PropertyKey, value: JsValue) -> bool;

    fn property_names(&self) -> Vec<PropertyKey>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Function implemented in native code.
///
/// The engine does not interpret `context`; the binding layer stores its
/// callback record there and downcasts it when the function is invoked.
pub struct NativeFunction {
    pub name: JsString,
    pub context: Box<dyn Any>,
}

/// Kind-specific payload of a heap object
#[derive(Default)]
pub enum ObjectKind {
    #[default]
    Ordinary,
    Array(Vec<JsValue>),
    Error(ErrorKind),
    Function(NativeFunction),
    Host(Box<dyn HostObject>),
}

impl ObjectKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectKind::Function(_))
    }
}

/// A heap-allocated object
#[derive(Default)]
pub struct ObjectData {
    pub prototype: Option<ObjectId>,
    pub properties: IndexMap<PropertyKey, JsValue>,
    pub kind: ObjectKind,
    /// Host object carrying the native pointer attached by `wrap`
    pub wrapped: Option<ObjectId>,
    /// Host objects attached by `add_finalizer`
    pub finalizers: Vec<ObjectId>,
}

impl ObjectData {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            prototype: None,
            properties: index_map_new(),
            kind,
            wrapped: None,
            finalizers: Vec::new(),
        }
    }

    pub fn with_prototype(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        Self {
            prototype,
            ..Self::new(kind)
        }
    }

    pub fn ordinary() -> Self {
        Self::new(ObjectKind::Ordinary)
    }

    pub fn is_callable(&self) -> bool {
        self.kind.is_callable()
    }

    /// Visit every heap object this object keeps alive.
    pub fn trace<F: FnMut(ObjectId)>(&self, mut visitor: F) {
        if let Some(proto) = self.prototype {
            visitor(proto);
        }
        for value in self.properties.values() {
            if let JsValue::Object(id) = value {
                visitor(*id);
            }
        }
        if let ObjectKind::Array(elements) = &self.kind {
            for value in elements {
                if let JsValue::Object(id) = value {
                    visitor(*id);
                }
            }
        }
        if let Some(wrapped) = self.wrapped {
            visitor(wrapped);
        }
        for finalizer in &self.finalizers {
            visitor(*finalizer);
        }
    }

    /// Own property lookup, including array elements and host dispatch.
    pub fn get_own(&self, key: &PropertyKey) -> Option<JsValue> {
        match (&self.kind, key) {
            (ObjectKind::Array(elements), PropertyKey::Index(i)) => elements
                .get(*i as usize)
                .cloned()
                .or_else(|| self.properties.get(key).cloned()),
            (ObjectKind::Array(elements), key) if key.eq_str("length") => {
                Some(JsValue::Number(elements.len() as f64))
            }
            (ObjectKind::Host(host), key) => Some(host.get(key)),
            _ => self.properties.get(key).cloned(),
        }
    }

    pub fn has_own(&self, key: &PropertyKey) -> bool {
        match (&self.kind, key) {
            (ObjectKind::Array(elements), PropertyKey::Index(i)) => {
                (*i as usize) < elements.len() || self.properties.contains_key(key)
            }
            (ObjectKind::Array(_), key) if key.eq_str("length") => true,
            (ObjectKind::Host(host), key) => host.property_names().contains(key),
            _ => self.properties.contains_key(key),
        }
    }

    /// Store an own property. Returns false when the store was refused.
    pub fn set_own(&mut self, key: PropertyKey, value: JsValue) -> bool {
        match &mut self.kind {
            ObjectKind::Array(elements) => {
                if let PropertyKey::Index(i) = key
                    && (i as usize) <= elements.len() + MAX_ARRAY_GAP
                {
                    let i = i as usize;
                    if i >= elements.len() {
                        elements.resize(i + 1, JsValue::Undefined);
                    }
                    return match elements.get_mut(i) {
                        Some(slot) => {
                            *slot = value;
                            true
                        }
                        None => false,
                    };
                }
                if key.eq_str("length") {
                    let len = value.to_number();
                    if len < 0.0
                        || len.fract() != 0.0
                        || len > (elements.len() + MAX_ARRAY_GAP) as f64
                    {
                        return false;
                    }
                    elements.resize(len as usize, JsValue::Undefined);
                    return true;
                }
            }
            ObjectKind::Host(host) => return host.set(&key, value),
            _ => {}
        }
        self.properties.insert(key, value);
        true
    }

    /// Delete an own property. Array holes read back as `undefined`.
    pub fn delete_own(&mut self, key: &PropertyKey) -> bool {
        match (&mut self.kind, key) {
            (ObjectKind::Array(elements), PropertyKey::Index(i)) => {
                match elements.get_mut(*i as usize) {
                    Some(slot) => *slot = JsValue::Undefined,
                    None => {
                        self.properties.shift_remove(key);
                    }
                }
                true
            }
            (ObjectKind::Array(_), key) if key.eq_str("length") => false,
            (ObjectKind::Host(_), _) => false,
            _ => {
                self.properties.shift_remove(key);
                true
            }
        }
    }

    /// Own enumerable keys in property order (indices first for arrays)
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::new();
        match &self.kind {
            ObjectKind::Array(elements) => {
                keys.extend((0..elements.len()).map(|i| PropertyKey::Index(i as u32)));
            }
            ObjectKind::Host(host) => return host.property_names(),
            _ => {}
        }
        keys.extend(self.properties.keys().cloned());
        keys
    }
}
