//! Primitive values, conversions, externals and JSON.

use std::ffi::{c_char, c_void};

use super::{
    NAPIEnv, NAPIFinalize, NAPIValue, adapt_finalizer, check_arg, check_env, optional_value_arg,
    try_status, utf8_arg, value_arg, write_result,
};
use crate::env::ValueType;
use crate::error::Status;

/// Shared body of the value-to-value entry points
macro_rules! value_op {
    ($env:expr, $result:expr, $call:expr) => {{
        let env = check_env!($env);
        check_arg!($result);
        // SAFETY: checked non-null above
        unsafe { write_result($result, $call(env), |v: crate::env::Value| v.into_raw()) }
    }};
}

// ============================================================================
// Singletons and primitives
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_undefined(env: NAPIEnv, result: *mut NAPIValue) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.get_undefined())
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_null(env: NAPIEnv, result: *mut NAPIValue) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.get_null())
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_global(env: NAPIEnv, result: *mut NAPIValue) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.get_global())
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_boolean(
    env: NAPIEnv,
    value: bool,
    result: *mut NAPIValue,
) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.get_boolean(value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_double(
    env: NAPIEnv,
    value: f64,
    result: *mut NAPIValue,
) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.create_double(value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_int32(
    env: NAPIEnv,
    value: i32,
    result: *mut NAPIValue,
) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.create_int32(value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_uint32(
    env: NAPIEnv,
    value: u32,
    result: *mut NAPIValue,
) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.create_uint32(value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_int64(
    env: NAPIEnv,
    value: i64,
    result: *mut NAPIValue,
) -> Status {
    value_op!(env, result, |env: &mut crate::env::Env| env.create_int64(value))
}

/// `length` may be `NAPI_AUTO_LENGTH` for a NUL-terminated string.
///
/// # Safety
/// `env` must be a live environment, `str` must hold `length` bytes (or be
/// NUL-terminated) and `result` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_string_utf8(
    env: NAPIEnv,
    str: *const c_char,
    length: usize,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: caller guarantees the buffer
    let s = try_status!(unsafe { utf8_arg(str, length) });
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.create_string_utf8(s), |v| v.into_raw()) }
}

/// `description` may be 0 for a symbol without description.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_symbol(
    env: NAPIEnv,
    description: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let description = optional_value_arg(description);
    value_op!(env, result, |env: &mut crate::env::Env| env
        .create_symbol(description))
}

// ============================================================================
// Inspection
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_typeof(
    env: NAPIEnv,
    value: NAPIValue,
    result: *mut ValueType,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.type_of(value), |t| t) }
}

/// Shared body of the `napi_get_value_*` entry points
macro_rules! get_value {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $method:ident) => {
        $(#[$meta])*
        /// # Safety
        /// `env` must be a live environment and `result` valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(env: NAPIEnv, value: NAPIValue, result: *mut $ty) -> Status {
            let env = check_env!(env);
            check_arg!(result);
            let value = try_status!(value_arg(value));
            // SAFETY: checked non-null above
            unsafe { write_result(result, env.$method(value), |v| v) }
        }
    };
}

get_value!(napi_get_value_double, f64, get_value_double);
get_value!(
    /// ToInt32 of the number.
    napi_get_value_int32, i32, get_value_int32
);
get_value!(napi_get_value_uint32, u32, get_value_uint32);
get_value!(napi_get_value_int64, i64, get_value_int64);
get_value!(napi_get_value_bool, bool, get_value_bool);

/// Copy a string into `buf`.
///
/// With a null `buf`, `result` receives the byte length of the string.
/// Otherwise at most `bufsize - 1` bytes are copied, never splitting a
/// character, the buffer is NUL-terminated, and `result` (if non-null)
/// receives the number of bytes copied.
///
/// # Safety
/// `env` must be a live environment, `buf` null or valid for `bufsize`
/// bytes, and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_value_string_utf8(
    env: NAPIEnv,
    value: NAPIValue,
    buf: *mut c_char,
    bufsize: usize,
    result: *mut usize,
) -> Status {
    let env = check_env!(env);
    let value = try_status!(value_arg(value));
    let string = try_status!(env.get_value_string_utf8(value).map_err(|err| err.status()));

    if buf.is_null() {
        check_arg!(result);
        // SAFETY: checked non-null above
        unsafe { result.write(string.len()) };
        return Status::Ok;
    }

    let copied = if bufsize == 0 {
        0
    } else {
        let mut end = string.len().min(bufsize - 1);
        while !string.is_char_boundary(end) {
            end -= 1;
        }
        // SAFETY: buf holds bufsize bytes and end < bufsize
        unsafe {
            std::ptr::copy_nonoverlapping(string.as_ptr(), buf.cast::<u8>(), end);
            buf.add(end).write(0);
        }
        end
    };
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(copied) };
    }
    Status::Ok
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_strict_equals(
    env: NAPIEnv,
    lhs: NAPIValue,
    rhs: NAPIValue,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let lhs = try_status!(value_arg(lhs));
    let rhs = try_status!(value_arg(rhs));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.strict_equals(lhs, rhs), |b| b) }
}

// ============================================================================
// Coercion
// ============================================================================

macro_rules! coerce {
    ($name:ident, $method:ident) => {
        /// # Safety
        /// `env` must be a live environment and `result` valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            env: NAPIEnv,
            value: NAPIValue,
            result: *mut NAPIValue,
        ) -> Status {
            let value = try_status!(value_arg(value));
            value_op!(env, result, |env: &mut crate::env::Env| env.$method(value))
        }
    };
}

coerce!(napi_coerce_to_bool, coerce_to_bool);
coerce!(napi_coerce_to_number, coerce_to_number);
coerce!(napi_coerce_to_string, coerce_to_string);

// ============================================================================
// Externals
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
/// `finalize_cb`, if given, must be safe to call with `data` and `hint`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_external(
    env: NAPIEnv,
    data: *mut c_void,
    finalize_cb: NAPIFinalize,
    finalize_hint: *mut c_void,
    result: *mut NAPIValue,
) -> Status {
    let finalize = adapt_finalizer(finalize_cb);
    value_op!(env, result, |env: &mut crate::env::Env| env.create_external(
        data,
        finalize,
        finalize_hint
    ))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_value_external(
    env: NAPIEnv,
    value: NAPIValue,
    result: *mut *mut c_void,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_value_external(value), |data| data) }
}

// ============================================================================
// JSON
// ============================================================================

/// Parse a NUL-terminated UTF-8 JSON document.
///
/// # Safety
/// `env` must be a live environment, `utf8_string` a valid C string and
/// `result` valid for writes.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn NAPIParseUTF8JSONString(
    env: NAPIEnv,
    utf8_string: *const c_char,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: caller guarantees a NUL-terminated string
    let source = try_status!(unsafe { utf8_arg(utf8_string, super::NAPI_AUTO_LENGTH) });
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.parse_json(source), |v| v.into_raw()) }
}
