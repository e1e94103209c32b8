//! Errors and exceptions.

use std::ffi::c_char;

use super::{
    NAPIEnv, NAPIValue, check_arg, check_env, optional_c_str, optional_value_arg, status_of,
    try_status, value_arg, write_result,
};
use crate::env::{Env, Value};
use crate::error::{NapiResult, Status};

type CreateError = fn(&mut Env, Option<Value>, Value) -> NapiResult<Value>;
type ThrowError = fn(&mut Env, Option<&str>, &str) -> NapiResult<()>;

/// # Safety
/// `result` must be valid for writes.
unsafe fn create_error_with(
    env: NAPIEnv,
    code: NAPIValue,
    msg: NAPIValue,
    result: *mut NAPIValue,
    create: CreateError,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let msg = try_status!(value_arg(msg));
    let code = optional_value_arg(code);
    // SAFETY: checked non-null above
    unsafe { write_result(result, create(env, code, msg), |v| v.into_raw()) }
}

/// # Safety
/// `code` must be null or a valid C string, `msg` a valid C string.
unsafe fn throw_error_with(
    env: NAPIEnv,
    code: *const c_char,
    msg: *const c_char,
    throw: ThrowError,
) -> Status {
    let env = check_env!(env);
    check_arg!(msg);
    // SAFETY: forwarded caller guarantee
    let code = try_status!(unsafe { optional_c_str(code) });
    // SAFETY: checked non-null above, caller guarantees NUL termination
    let msg = try_status!(unsafe { optional_c_str(msg) }).unwrap_or_default();
    status_of(throw(env, code, msg))
}

// ============================================================================
// Error objects
// ============================================================================

/// `code` may be 0.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_error(
    env: NAPIEnv,
    code: NAPIValue,
    msg: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { create_error_with(env, code, msg, result, Env::create_error) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_type_error(
    env: NAPIEnv,
    code: NAPIValue,
    msg: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { create_error_with(env, code, msg, result, Env::create_type_error) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_range_error(
    env: NAPIEnv,
    code: NAPIValue,
    msg: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { create_error_with(env, code, msg, result, Env::create_range_error) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_is_error(env: NAPIEnv, value: NAPIValue, result: *mut bool) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.is_error(value), |b| b) }
}

// ============================================================================
// Throwing
// ============================================================================

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_throw(env: NAPIEnv, error: NAPIValue) -> Status {
    let env = check_env!(env);
    let error = try_status!(value_arg(error));
    status_of(env.throw(error))
}

/// `code` may be null.
///
/// # Safety
/// `env` must be a live environment; `code` and `msg` valid C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_throw_error(
    env: NAPIEnv,
    code: *const c_char,
    msg: *const c_char,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { throw_error_with(env, code, msg, Env::throw_error) }
}

/// # Safety
/// `env` must be a live environment; `code` and `msg` valid C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_throw_type_error(
    env: NAPIEnv,
    code: *const c_char,
    msg: *const c_char,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { throw_error_with(env, code, msg, Env::throw_type_error) }
}

/// # Safety
/// `env` must be a live environment; `code` and `msg` valid C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_throw_range_error(
    env: NAPIEnv,
    code: *const c_char,
    msg: *const c_char,
) -> Status {
    // SAFETY: forwarded caller guarantee
    unsafe { throw_error_with(env, code, msg, Env::throw_range_error) }
}

// ============================================================================
// Pending exception
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_is_exception_pending(env: NAPIEnv, result: *mut bool) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe { result.write(env.is_exception_pending()) };
    Status::Ok
}

/// Writes `undefined` when nothing is pending.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_and_clear_last_exception(
    env: NAPIEnv,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_and_clear_last_exception(), |v| v.into_raw()) }
}
