//! Native functions, calls and construction

use std::ffi::c_void;
use std::rc::Rc;

use super::{Env, Value};
use crate::callback::{self, CallbackInfo, FunctionInfo};
use crate::error::{NapiError, NapiResult};
use crate::vm::{ErrorKind, JsString, JsValue, NativeFunction, ObjectData, ObjectId, ObjectKind};

impl Env {
    fn callable(&self, function: Value) -> NapiResult<ObjectId> {
        let value = self.resolve(function)?;
        if !self.runtime().is_callable(&value) {
            return Err(NapiError::FunctionExpected);
        }
        value.as_object().ok_or(NapiError::FunctionExpected)
    }

    /// Create a function backed by `callback`. `data` is handed back through
    /// `CallbackInfo::data` on every call.
    ///
    /// Like script functions, the result has a `prototype` object whose
    /// `constructor` points back at it, so it can be used with `new_instance`.
    pub fn create_function<F>(
        &mut self,
        name: Option<&str>,
        data: *mut c_void,
        callback: F,
    ) -> NapiResult<Value>
    where
        F: Fn(&mut Env, &CallbackInfo) -> NapiResult<Option<Value>> + 'static,
    {
        self.preamble()?;
        let name = JsString::from(name.unwrap_or(""));
        let intrinsics = *self.runtime().intrinsics();

        let native = NativeFunction {
            name: name.clone(),
            context: Box::new(FunctionInfo::new(Rc::new(callback), data)),
        };
        let function = self.alloc_value(ObjectData::with_prototype(
            ObjectKind::Function(native),
            Some(intrinsics.function_prototype),
        ))?;
        let function_id = self.resolve_object(function)?;

        let prototype = self.alloc(ObjectData::with_prototype(
            ObjectKind::Ordinary,
            Some(intrinsics.object_prototype),
        ))?;
        let rt = self.runtime_mut();
        rt.set(prototype, "constructor".into(), JsValue::Object(function_id))?;
        rt.set(function_id, "prototype".into(), JsValue::Object(prototype))?;
        rt.set(function_id, "name".into(), JsValue::String(name))?;
        Ok(function)
    }

    /// Call `function` with `recv` as `this` (the global object when `None`)
    pub fn call_function(
        &mut self,
        recv: Option<Value>,
        function: Value,
        args: &[Value],
    ) -> NapiResult<Value> {
        self.preamble()?;
        let callee = self.callable(function)?;
        let this = match recv {
            Some(recv) => self.resolve(recv)?,
            None => JsValue::Object(self.runtime().global()),
        };
        let args = args
            .iter()
            .map(|arg| self.resolve(*arg))
            .collect::<NapiResult<Vec<_>>>()?;
        let result = callback::invoke(self, callee, this, &args, None)?;
        self.mint(result)
    }

    /// Construct an object: `this` inherits from the constructor's
    /// `prototype`, and a non-object return value yields `this`.
    pub fn new_instance(&mut self, constructor: Value, args: &[Value]) -> NapiResult<Value> {
        self.preamble()?;
        let ctor = self.callable(constructor)?;
        let proto = match self.runtime().get(ctor, &"prototype".into())? {
            JsValue::Object(proto) => proto,
            _ => self.runtime().intrinsics().object_prototype,
        };
        let args = args
            .iter()
            .map(|arg| self.resolve(*arg))
            .collect::<NapiResult<Vec<_>>>()?;

        let this = self.alloc_value(ObjectData::with_prototype(ObjectKind::Ordinary, Some(proto)))?;
        let this_value = self.resolve(this)?;
        let result = callback::invoke(
            self,
            ctor,
            this_value,
            &args,
            Some(JsValue::Object(ctor)),
        )?;
        if result.is_object() {
            self.mint(result)
        } else {
            Ok(this)
        }
    }

    /// `object instanceof constructor`
    pub fn instance_of(&mut self, object: Value, constructor: Value) -> NapiResult<bool> {
        self.preamble()?;
        let ctor = self.callable(constructor)?;
        let JsValue::Object(proto) = self.runtime().get(ctor, &"prototype".into())? else {
            return self.raise(
                ErrorKind::TypeError,
                "Function has non-object prototype in instanceof check",
            );
        };
        let object = self.resolve(object)?;
        Ok(self.runtime().instance_of(&object, proto)?)
    }

    /// Arguments of the current call, padded with `undefined` up to
    /// `requested`, plus the actual argument count.
    pub fn get_cb_info(
        &mut self,
        info: &CallbackInfo,
        requested: usize,
    ) -> NapiResult<(Vec<Value>, usize)> {
        let mut argv: Vec<Value> = info.args().iter().take(requested).copied().collect();
        while argv.len() < requested {
            argv.push(self.get_undefined()?);
        }
        Ok((argv, info.argc()))
    }

    pub fn get_new_target(&self, info: &CallbackInfo) -> Option<Value> {
        info.new_target()
    }
}
