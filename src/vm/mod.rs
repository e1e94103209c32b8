//! Engine core
//!
//! A small garbage-collected object engine: tagged values, a mark-and-sweep
//! heap, a handle stack with GC-scope frames, and host objects. It runs no
//! JavaScript source; values are created by the embedder and functions are
//! native.
//!
//! The runtime never collects on its own. The owner decides when to call
//! `collect` (usually right before an allocation, see `should_collect`) and
//! supplies any extra roots it holds through `CustomRoots`.

pub mod handles;
pub mod heap;
pub mod object;
pub mod value;

pub use handles::{Handle, HandleStack};
pub use heap::{
    CollectionStats, CustomRoots, GcStats, Heap, ObjectId, RootAcceptor, WeakRoot,
    WeakRootAcceptor,
};
pub use object::{ErrorKind, HostObject, NativeFunction, ObjectData, ObjectKind};
pub use value::{CheapClone, JsString, JsSymbol, JsValue, PropertyKey};

use crate::config::RuntimeConfig;
use crate::error::VmError;

/// Built-in prototype objects, created with the runtime and always rooted
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    error_prototypes: [ObjectId; 4],
}

impl Intrinsics {
    pub fn error_prototype(&self, kind: ErrorKind) -> ObjectId {
        let [error, type_error, range_error, syntax_error] = self.error_prototypes;
        match kind {
            ErrorKind::Error => error,
            ErrorKind::TypeError => type_error,
            ErrorKind::RangeError => range_error,
            ErrorKind::SyntaxError => syntax_error,
        }
    }

    fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        [
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
        ]
        .into_iter()
        .chain(self.error_prototypes)
    }
}

/// Roots owned by the runtime itself
struct RuntimeRoots<'a> {
    global: ObjectId,
    intrinsics: &'a Intrinsics,
    thrown: Option<&'a JsValue>,
}

impl CustomRoots for RuntimeRoots<'_> {
    fn mark_roots(&self, acceptor: &mut dyn RootAcceptor) {
        acceptor.accept(&JsValue::Object(self.global));
        for id in self.intrinsics.ids() {
            acceptor.accept(&JsValue::Object(id));
        }
        if let Some(thrown) = self.thrown {
            acceptor.accept(thrown);
        }
    }
}

pub struct Runtime {
    heap: Heap,
    handles: HandleStack,
    global: ObjectId,
    intrinsics: Intrinsics,
    /// Value thrown by native code and not yet caught
    thrown: Option<JsValue>,
    next_symbol_id: u64,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> Result<Self, VmError> {
        config
            .validate()
            .map_err(|err| VmError::InvalidConfig(err.to_string()))?;

        let mut heap = Heap::new(&config.gc);
        let object_prototype = heap.alloc(ObjectData::ordinary())?;
        let derived = |heap: &mut Heap| {
            heap.alloc(ObjectData::with_prototype(
                ObjectKind::Ordinary,
                Some(object_prototype),
            ))
        };
        let function_prototype = derived(&mut heap)?;
        let array_prototype = derived(&mut heap)?;

        let base_error = derived(&mut heap)?;
        let mut error_prototypes = [base_error; 4];
        for (slot, kind) in error_prototypes.iter_mut().zip([
            ErrorKind::Error,
            ErrorKind::TypeError,
            ErrorKind::RangeError,
            ErrorKind::SyntaxError,
        ]) {
            if kind != ErrorKind::Error {
                *slot = heap.alloc(ObjectData::with_prototype(
                    ObjectKind::Ordinary,
                    Some(base_error),
                ))?;
            }
            let proto = heap.get_mut(*slot).ok_or(VmError::DeadObject)?;
            proto.set_own("name".into(), JsValue::from(kind.name()));
            proto.set_own("message".into(), JsValue::from(""));
        }

        let global = derived(&mut heap)?;

        Ok(Self {
            heap,
            handles: HandleStack::new(),
            global,
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                array_prototype,
                error_prototypes,
            },
            thrown: None,
            next_symbol_id: 1,
        })
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn handles(&self) -> &HandleStack {
        &self.handles
    }

    pub fn handles_mut(&mut self) -> &mut HandleStack {
        &mut self.handles
    }

    pub fn global(&self) -> ObjectId {
        self.global
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    // ------------------------------------------------------------------------
    // Allocation and collection
    // ------------------------------------------------------------------------

    /// Allocate without collecting. The new object must be rooted before
    /// the next collection.
    pub fn alloc(&mut self, data: ObjectData) -> Result<ObjectId, VmError> {
        self.heap.alloc(data)
    }

    pub fn should_collect(&self) -> bool {
        self.heap.should_collect()
    }

    /// Full collection. Roots are the handle stack, the global object, the
    /// intrinsics, the pending thrown value and `custom`.
    pub fn collect(
        &mut self,
        custom: &dyn CustomRoots,
    ) -> (CollectionStats, Vec<Box<dyn HostObject>>) {
        let roots = RuntimeRoots {
            global: self.global,
            intrinsics: &self.intrinsics,
            thrown: self.thrown.as_ref(),
        };
        self.heap.collect(&[&self.handles, &roots, custom])
    }

    pub fn drain_host_objects(&mut self) -> Vec<Box<dyn HostObject>> {
        self.heap.drain_host_objects()
    }

    // ------------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------------

    pub fn throw(&mut self, value: JsValue) {
        self.thrown = Some(value);
    }

    pub fn has_thrown(&self) -> bool {
        self.thrown.is_some()
    }

    pub fn take_thrown(&mut self) -> Option<JsValue> {
        self.thrown.take()
    }

    // ------------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------------

    pub fn new_symbol(&mut self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description)
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    pub fn object(&self, id: ObjectId) -> Result<&ObjectData, VmError> {
        self.heap.get(id).ok_or(VmError::DeadObject)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut ObjectData, VmError> {
        self.heap.get_mut(id).ok_or(VmError::DeadObject)
    }

    /// [[Get]]: own property, then the prototype chain
    pub fn get(&self, id: ObjectId, key: &PropertyKey) -> Result<JsValue, VmError> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let data = self.object(cur)?;
            if let Some(value) = data.get_own(key) {
                return Ok(value);
            }
            current = data.prototype;
        }
        Ok(JsValue::Undefined)
    }

    /// [[HasProperty]]: own property or anywhere on the prototype chain
    pub fn has(&self, id: ObjectId, key: &PropertyKey) -> Result<bool, VmError> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let data = self.object(cur)?;
            if data.has_own(key) {
                return Ok(true);
            }
            current = data.prototype;
        }
        Ok(false)
    }

    pub fn has_own(&self, id: ObjectId, key: &PropertyKey) -> Result<bool, VmError> {
        Ok(self.object(id)?.has_own(key))
    }

    /// [[Set]] on the object itself. Returns false when the store was refused.
    pub fn set(&mut self, id: ObjectId, key: PropertyKey, value: JsValue) -> Result<bool, VmError> {
        Ok(self.object_mut(id)?.set_own(key, value))
    }

    pub fn delete(&mut self, id: ObjectId, key: &PropertyKey) -> Result<bool, VmError> {
        Ok(self.object_mut(id)?.delete_own(key))
    }

    pub fn own_keys(&self, id: ObjectId) -> Result<Vec<PropertyKey>, VmError> {
        Ok(self.object(id)?.own_keys())
    }

    pub fn prototype_of(&self, id: ObjectId) -> Result<Option<ObjectId>, VmError> {
        Ok(self.object(id)?.prototype)
    }

    pub fn is_callable(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id))
            .is_some_and(ObjectData::is_callable)
    }

    /// True if `proto` appears on the prototype chain of `value`
    pub fn instance_of(&self, value: &JsValue, proto: ObjectId) -> Result<bool, VmError> {
        let Some(id) = value.as_object() else {
            return Ok(false);
        };
        let mut current = self.object(id)?.prototype;
        while let Some(cur) = current {
            if cur == proto {
                return Ok(true);
            }
            current = self.object(cur)?.prototype;
        }
        Ok(false)
    }

    // ------------------------------------------------------------------------
    // Conversions that need the heap
    // ------------------------------------------------------------------------

    /// ToString. Objects stringify without calling user code. An object
    /// already being stringified further up (a cycle) contributes "".
    pub fn to_string(&self, value: &JsValue) -> Result<JsString, VmError> {
        let mut visiting = Vec::new();
        Ok(JsString::from(self.stringify(value, &mut visiting)?))
    }

    fn stringify(&self, value: &JsValue, visiting: &mut Vec<ObjectId>) -> Result<String, VmError> {
        let Some(id) = value.as_object() else {
            return Ok(value.to_js_string().to_string());
        };
        if visiting.contains(&id) {
            return Ok(String::new());
        }
        let data = self.object(id)?;
        visiting.push(id);
        let text = match &data.kind {
            ObjectKind::Array(elements) => {
                let mut parts = Vec::with_capacity(elements.len());
                for element in elements {
                    parts.push(match element {
                        JsValue::Undefined | JsValue::Null => String::new(),
                        other => self.stringify(other, visiting)?,
                    });
                }
                parts.join(",")
            }
            ObjectKind::Error(_) => {
                let name = self.stringify(&self.get(id, &"name".into())?, visiting)?;
                let message = self.stringify(&self.get(id, &"message".into())?, visiting)?;
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
            ObjectKind::Function(func) => {
                format!("function {}() {{ [native code] }}", func.name)
            }
            ObjectKind::Ordinary | ObjectKind::Host(_) => "[object Object]".to_string(),
        };
        visiting.pop();
        Ok(text)
    }

    /// ToNumber. Objects go through their string form.
    pub fn to_number(&self, value: &JsValue) -> Result<f64, VmError> {
        match value {
            JsValue::Object(_) => Ok(JsValue::String(self.to_string(value)?).to_number()),
            other => Ok(other.to_number()),
        }
    }
}
