//! Native data attached to objects, and per-environment instance data
//!
//! Every attachment is an External owned by the object, so it is traced with
//! the object, collected with it, and finalized exactly once like any other
//! External.

use std::ffi::c_void;

use super::{Env, Value};
use crate::error::{NapiError, NapiResult};
use crate::external::{External, Finalize};
use crate::reference::Reference;
use crate::vm::{ObjectData, ObjectId, ObjectKind};

impl Env {
    fn attach_external(
        &mut self,
        data: *mut c_void,
        finalize: Option<Finalize>,
        hint: *mut c_void,
    ) -> NapiResult<ObjectId> {
        let external = External::new(data, finalize, hint);
        self.alloc(ObjectData::new(ObjectKind::Host(Box::new(external))))
    }

    fn external_mut(&mut self, id: ObjectId) -> Option<&mut External> {
        match &mut self.runtime_mut().object_mut(id).ok()?.kind {
            ObjectKind::Host(host) => host.as_any_mut().downcast_mut::<External>(),
            _ => None,
        }
    }

    fn wrapped_external(&self, object: ObjectId) -> NapiResult<&External> {
        let wrapped = self
            .runtime()
            .object(object)?
            .wrapped
            .ok_or(NapiError::InvalidArg("object is not wrapped"))?;
        match &self.runtime().object(wrapped)?.kind {
            ObjectKind::Host(host) => host
                .as_any()
                .downcast_ref::<External>()
                .ok_or(NapiError::InvalidArg("object is not wrapped")),
            _ => Err(NapiError::InvalidArg("object is not wrapped")),
        }
    }

    /// Associate `native` with `object`. An object can be wrapped once;
    /// `finalize` runs when the object is collected.
    pub fn wrap(
        &mut self,
        object: Value,
        native: *mut c_void,
        finalize: Option<Finalize>,
        hint: *mut c_void,
    ) -> NapiResult<()> {
        self.preamble()?;
        let id = self.resolve_object(object)?;
        if self.runtime().object(id)?.wrapped.is_some() {
            return Err(NapiError::InvalidArg("object is already wrapped"));
        }
        let external = self.attach_external(native, finalize, hint)?;
        self.runtime_mut().object_mut(id)?.wrapped = Some(external);
        Ok(())
    }

    /// `wrap`, returning a weak reference (count 0) to the wrapped object
    pub fn wrap_with_reference(
        &mut self,
        object: Value,
        native: *mut c_void,
        finalize: Option<Finalize>,
        hint: *mut c_void,
    ) -> NapiResult<Reference> {
        self.wrap(object, native, finalize, hint)?;
        self.create_reference(object, 0)
    }

    pub fn unwrap(&self, object: Value) -> NapiResult<*mut c_void> {
        let id = self.resolve_object(object)?;
        Ok(self.wrapped_external(id)?.data())
    }

    /// Detach the wrapped pointer. Its finalizer will not run.
    pub fn remove_wrap(&mut self, object: Value) -> NapiResult<*mut c_void> {
        let id = self.resolve_object(object)?;
        let data = self.wrapped_external(id)?.data();
        let wrapped = self.runtime_mut().object_mut(id)?.wrapped.take();
        if let Some(external) = wrapped.and_then(|wrapped| self.external_mut(wrapped)) {
            external.disarm();
        }
        Ok(data)
    }

    /// Run `finalize` with `data` when `object` is collected. Any number of
    /// finalizers can be attached.
    pub fn add_finalizer(
        &mut self,
        object: Value,
        data: *mut c_void,
        finalize: Finalize,
        hint: *mut c_void,
    ) -> NapiResult<()> {
        self.preamble()?;
        let id = self.resolve_object(object)?;
        let external = self.attach_external(data, Some(finalize), hint)?;
        self.runtime_mut().object_mut(id)?.finalizers.push(external);
        Ok(())
    }

    /// `add_finalizer`, returning a weak reference (count 0) to `object`
    pub fn add_finalizer_with_reference(
        &mut self,
        object: Value,
        data: *mut c_void,
        finalize: Finalize,
        hint: *mut c_void,
    ) -> NapiResult<Reference> {
        self.add_finalizer(object, data, finalize, hint)?;
        self.create_reference(object, 0)
    }

    /// Attach data to the environment. It is finalized at teardown, after
    /// every External. Replacing existing data drops the old finalizer
    /// without running it.
    pub fn set_instance_data(
        &mut self,
        data: *mut c_void,
        finalize: Option<Finalize>,
        hint: *mut c_void,
    ) {
        if let Some(mut previous) = self.instance_data.take() {
            previous.disarm();
        }
        self.instance_data = Some(External::new(data, finalize, hint));
    }

    /// The instance data pointer, null when none was set
    pub fn get_instance_data(&self) -> *mut c_void {
        self.instance_data
            .as_ref()
            .map_or(std::ptr::null_mut(), External::data)
    }
}
