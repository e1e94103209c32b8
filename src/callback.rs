//! Native function plumbing
//!
//! A native function object stores a `FunctionInfo` (callback plus user data)
//! in its engine-side context. Calling it goes through `invoke`, which opens
//! a callback scope, mints the receiver and arguments as handles, runs the
//! callback and closes the scope again. The result is handed back as a raw
//! engine value; the caller must root it before allocating.

use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

use crate::env::{Env, Value};
use crate::error::{NapiError, NapiResult};
use crate::vm::{ErrorKind, JsValue, ObjectId, ObjectKind};

/// Native callback. Returning `Ok(None)` yields `undefined`.
///
/// Returning `Err` without throwing makes the call throw an `Error` carrying
/// the error's message.
pub type Callback = Rc<dyn Fn(&mut Env, &CallbackInfo) -> NapiResult<Option<Value>>>;

/// Callback record owned by a native function object
pub struct FunctionInfo {
    pub(crate) callback: Callback,
    pub(crate) data: *mut c_void,
}

impl FunctionInfo {
    pub fn new(callback: Callback, data: *mut c_void) -> Self {
        Self { callback, data }
    }
}

impl fmt::Debug for FunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInfo")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Arguments of one native call. Only valid for the duration of the call.
#[derive(Debug)]
pub struct CallbackInfo {
    args: Vec<Value>,
    this: Value,
    new_target: Option<Value>,
    data: *mut c_void,
}

impl CallbackInfo {
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<Value> {
        self.args.get(index).copied()
    }

    pub fn this(&self) -> Value {
        self.this
    }

    /// The constructor, when invoked through `new`
    pub fn new_target(&self) -> Option<Value> {
        self.new_target
    }

    pub fn data(&self) -> *mut c_void {
        self.data
    }
}

/// Call the native function `callee`.
pub(crate) fn invoke(
    env: &mut Env,
    callee: ObjectId,
    this: JsValue,
    args: &[JsValue],
    new_target: Option<JsValue>,
) -> NapiResult<JsValue> {
    let (callback, data) = {
        let object = env.runtime().object(callee)?;
        let ObjectKind::Function(native) = &object.kind else {
            return Err(NapiError::FunctionExpected);
        };
        let info = native
            .context
            .downcast_ref::<FunctionInfo>()
            .ok_or(NapiError::FunctionExpected)?;
        (info.callback.clone(), info.data)
    };

    let scope = env.open_callback_scope()?;
    let result = run_in_scope(env, &callback, data, this, args, new_target);
    env.close_callback_scope(scope);

    if env.is_exception_pending() {
        return Err(NapiError::PendingException);
    }
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            let message = err.to_string();
            let error = env.create_error_object(ErrorKind::Error, &message, None)?;
            env.runtime_mut().throw(error);
            Err(NapiError::PendingException)
        }
    }
}

fn run_in_scope(
    env: &mut Env,
    callback: &Callback,
    data: *mut c_void,
    this: JsValue,
    args: &[JsValue],
    new_target: Option<JsValue>,
) -> NapiResult<JsValue> {
    let this = env.mint(this)?;
    let args = args
        .iter()
        .map(|arg| env.mint(arg.clone()))
        .collect::<NapiResult<Vec<_>>>()?;
    let new_target = new_target.map(|target| env.mint(target)).transpose()?;
    let info = CallbackInfo {
        args,
        this,
        new_target,
        data,
    };
    match callback(env, &info)? {
        Some(value) => env.resolve(value),
        None => Ok(JsValue::Undefined),
    }
}
