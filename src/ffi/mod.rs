//! C ABI for native addons.
//!
//! Every entry point takes the environment as an opaque pointer and returns
//! a `Status`. Results are written through out-pointers; a null out-pointer
//! or a null required input is `InvalidArg`, and nothing is executed in that
//! case.
//!
//! # Handles
//!
//! - `NAPIValue`: 64-bit packed handle, 0 is never a valid value
//! - `NAPIRef`, `NAPIHandleScope`, `NAPIEscapableHandleScope`: opaque
//!   non-null pointers encoding the generation-checked Rust handle
//!
//! # Thread Safety
//!
//! An environment must only be used from the thread that created it.

mod error;
mod function;
mod lifetime;
mod object;
mod value;

pub use error::*;
pub use function::*;
pub use lifetime::*;
pub use object::*;
pub use value::*;

use std::ffi::{CStr, CString, c_char, c_void};

use crate::callback::CallbackInfo;
use crate::env::{Env, Value};
use crate::error::{NapiResult, Status};
use crate::external::Finalize;

// ============================================================================
// Opaque Types
// ============================================================================

pub enum OpaqueNAPIRef {}
pub enum OpaqueNAPIHandleScope {}
pub enum OpaqueNAPIEscapableHandleScope {}

pub type NAPIEnv = *mut Env;
pub type NAPIValue = u64;
pub type NAPIRef = *mut OpaqueNAPIRef;
pub type NAPIHandleScope = *mut OpaqueNAPIHandleScope;
pub type NAPIEscapableHandleScope = *mut OpaqueNAPIEscapableHandleScope;
pub type NAPICallbackInfo = *const CallbackInfo;

/// Native function callback. Returning 0 yields `undefined`.
pub type NAPICallback = Option<unsafe extern "C" fn(env: NAPIEnv, info: NAPICallbackInfo) -> NAPIValue>;

/// Finalizer callback, called with the finalize data and hint
pub type NAPIFinalize =
    Option<unsafe extern "C" fn(env: NAPIEnv, data: *mut c_void, hint: *mut c_void)>;

/// String length meaning "NUL-terminated"
pub const NAPI_AUTO_LENGTH: usize = usize::MAX;

// ============================================================================
// Argument helpers
// ============================================================================

/// Borrow the environment or return `InvalidArg`
macro_rules! check_env {
    ($env:expr) => {
        // SAFETY: the caller passes a pointer obtained from NAPICreateEnv
        match unsafe { $env.as_mut() } {
            Some(env) => env,
            None => return $crate::error::Status::InvalidArg,
        }
    };
}

/// Return `InvalidArg` if a required pointer is null
macro_rules! check_arg {
    ($ptr:expr) => {
        if $ptr.is_null() {
            return $crate::error::Status::InvalidArg;
        }
    };
}

/// Unwrap a `Result<T, Status>` or return the status
macro_rules! try_status {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(status) => return status,
        }
    };
}

pub(crate) use {check_arg, check_env, try_status};

pub(crate) fn value_arg(raw: NAPIValue) -> Result<Value, Status> {
    Value::from_raw(raw).ok_or(Status::InvalidArg)
}

/// Optional value argument: 0 means absent
pub(crate) fn optional_value_arg(raw: NAPIValue) -> Option<Value> {
    Value::from_raw(raw)
}

/// Read `length` bytes of UTF-8 (or up to the NUL for `NAPI_AUTO_LENGTH`).
///
/// # Safety
/// `s` must be null or point to `length` readable bytes (or a C string).
pub(crate) unsafe fn utf8_arg<'a>(s: *const c_char, length: usize) -> Result<&'a str, Status> {
    if s.is_null() {
        return Err(Status::InvalidArg);
    }
    let bytes = if length == NAPI_AUTO_LENGTH {
        // SAFETY: caller guarantees a NUL-terminated string
        unsafe { CStr::from_ptr(s) }.to_bytes()
    } else {
        // SAFETY: caller guarantees `length` readable bytes
        unsafe { std::slice::from_raw_parts(s.cast::<u8>(), length) }
    };
    std::str::from_utf8(bytes).map_err(|_| Status::InvalidArg)
}

/// Optional C string: null means absent
///
/// # Safety
/// `s` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn optional_c_str<'a>(s: *const c_char) -> Result<Option<&'a str>, Status> {
    if s.is_null() {
        return Ok(None);
    }
    // SAFETY: non-null, caller guarantees NUL termination
    unsafe { utf8_arg(s, NAPI_AUTO_LENGTH) }.map(Some)
}

/// Write a successful result through `out`, or return the error status
///
/// # Safety
/// `out` must be valid for writes.
pub(crate) unsafe fn write_result<T, U>(
    out: *mut U,
    result: NapiResult<T>,
    convert: impl FnOnce(T) -> U,
) -> Status {
    match result {
        Ok(value) => {
            // SAFETY: caller checked `out` for null and guarantees validity
            unsafe { out.write(convert(value)) };
            Status::Ok
        }
        Err(err) => err.status(),
    }
}

/// Status of an operation without an out-parameter
pub(crate) fn status_of(result: NapiResult<()>) -> Status {
    Status::from(&result)
}

// ============================================================================
// Callback adapters
// ============================================================================

pub(crate) fn adapt_callback(
    callback: unsafe extern "C" fn(NAPIEnv, NAPICallbackInfo) -> NAPIValue,
) -> impl Fn(&mut Env, &CallbackInfo) -> NapiResult<Option<Value>> + 'static {
    move |env: &mut Env, info: &CallbackInfo| {
        // SAFETY: the addon registered this callback for exactly this signature
        let raw = unsafe { callback(env as *mut Env, info as *const CallbackInfo) };
        Ok(Value::from_raw(raw))
    }
}

pub(crate) fn adapt_finalizer(finalize: NAPIFinalize) -> Option<Finalize> {
    let finalize = finalize?;
    Some(Box::new(move |env: &mut Env, data, hint| {
        // SAFETY: the addon registered this finalizer for exactly this signature
        unsafe { finalize(env as *mut Env, data, hint) }
    }))
}

// ============================================================================
// Environment lifecycle
// ============================================================================

/// Create an environment with the default configuration.
///
/// # Safety
/// `result` must be valid for writes.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPICreateEnv(result: *mut NAPIEnv) -> Status {
    check_arg!(result);
    match Env::new() {
        Ok(env) => {
            // SAFETY: checked non-null above
            unsafe { result.write(Box::into_raw(Box::new(env))) };
            Status::Ok
        }
        Err(err) => err.status(),
    }
}

/// Destroy an environment, finalizing every remaining External.
///
/// # Safety
/// `env` must come from `NAPICreateEnv` and not be used afterwards.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPIFreeEnv(env: NAPIEnv) -> Status {
    check_arg!(env);
    // SAFETY: env was created by NAPICreateEnv via Box::into_raw
    let env = unsafe { Box::from_raw(env) };
    env.destroy();
    Status::Ok
}

/// Force a full garbage collection.
///
/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPICollectGarbage(env: NAPIEnv) -> Status {
    let env = check_env!(env);
    env.collect_garbage();
    Status::Ok
}

/// Copy a string value into a newly allocated NUL-terminated buffer.
/// Free it with `NAPIFreeUTF8String`.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPIGetValueStringUTF8(
    env: NAPIEnv,
    value: NAPIValue,
    result: *mut *const c_char,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    let string = try_status!(env.get_value_string_utf8(value).map_err(|err| err.status()));
    let c_string = try_status!(CString::new(string).map_err(|_| Status::GenericFailure));
    // SAFETY: checked non-null above
    unsafe { result.write(c_string.into_raw()) };
    Status::Ok
}

/// Free a string returned by `NAPIGetValueStringUTF8`.
///
/// # Safety
/// `c_string` must come from `NAPIGetValueStringUTF8` and not be freed twice.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPIFreeUTF8String(env: NAPIEnv, c_string: *const c_char) -> Status {
    check_arg!(env);
    check_arg!(c_string);
    // SAFETY: allocated by CString::into_raw in NAPIGetValueStringUTF8
    unsafe { drop(CString::from_raw(c_string.cast_mut())) };
    Status::Ok
}
