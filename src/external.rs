//! Externals: host objects carrying one native pointer
//!
//! An External is opaque to script: it has no properties and refuses stores.
//! Its finalizer runs exactly once, when the object is collected or the
//! environment is torn down, whichever comes first. `finalize` consumes the
//! External, so a second run is impossible by construction.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;

use crate::env::Env;
use crate::vm::{HostObject, JsValue, PropertyKey};

/// Native cleanup hook, called with the data pointer and the finalize hint
pub type Finalize = Box<dyn FnOnce(&mut Env, *mut c_void, *mut c_void)>;

pub struct External {
    data: *mut c_void,
    finalizer: Option<Finalize>,
    hint: *mut c_void,
}

impl External {
    pub fn new(data: *mut c_void, finalizer: Option<Finalize>, hint: *mut c_void) -> Self {
        Self {
            data,
            finalizer,
            hint,
        }
    }

    pub fn data(&self) -> *mut c_void {
        self.data
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }

    /// Drop the finalizer without running it
    pub fn disarm(&mut self) {
        self.finalizer = None;
    }

    /// Run the finalizer, if any. Consumes the External.
    pub fn finalize(mut self, env: &mut Env) {
        if let Some(finalizer) = self.finalizer.take() {
            tracing::trace!(
                target: "hermes_napi::gc",
                data = ?self.data,
                "running external finalizer"
            );
            finalizer(env, self.data, self.hint);
        }
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("External")
            .field("data", &self.data)
            .field("has_finalizer", &self.finalizer.is_some())
            .field("hint", &self.hint)
            .finish()
    }
}

impl HostObject for External {
    fn get(&self, _key: &PropertyKey) -> JsValue {
        JsValue::Undefined
    }

    fn set(&mut self, _key: &PropertyKey, _value: JsValue) -> bool {
        false
    }

    fn property_names(&self) -> Vec<PropertyKey> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
