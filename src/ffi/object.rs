//! Objects, arrays, properties and native attachments.

use std::ffi::{c_char, c_void};

use super::lifetime::reference_to_raw;
use super::{
    NAPIEnv, NAPIFinalize, NAPIRef, NAPIValue, adapt_finalizer, check_arg, check_env, status_of,
    try_status, utf8_arg, value_arg, write_result, NAPI_AUTO_LENGTH,
};
use crate::error::Status;

// ============================================================================
// Creation
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_object(env: NAPIEnv, result: *mut NAPIValue) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.create_object(), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_array(env: NAPIEnv, result: *mut NAPIValue) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.create_array(), |v| v.into_raw()) }
}

/// Lengths beyond `u32::MAX` throw a `RangeError` like oversized ones.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_array_with_length(
    env: NAPIEnv,
    length: usize,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let length = u32::try_from(length).unwrap_or(u32::MAX);
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.create_array_with_length(length), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_is_array(env: NAPIEnv, value: NAPIValue, result: *mut bool) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.is_array(value), |b| b) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_array_length(
    env: NAPIEnv,
    value: NAPIValue,
    result: *mut u32,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_array_length(value), |n| n) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_prototype(
    env: NAPIEnv,
    object: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_prototype(object), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_property_names(
    env: NAPIEnv,
    object: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_property_names(object), |v| v.into_raw()) }
}

// ============================================================================
// Properties by value key
// ============================================================================

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_set_property(
    env: NAPIEnv,
    object: NAPIValue,
    key: NAPIValue,
    value: NAPIValue,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(object));
    let key = try_status!(value_arg(key));
    let value = try_status!(value_arg(value));
    status_of(env.set_property(object, key, value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_property(
    env: NAPIEnv,
    object: NAPIValue,
    key: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    let key = try_status!(value_arg(key));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_property(object, key), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_has_property(
    env: NAPIEnv,
    object: NAPIValue,
    key: NAPIValue,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    let key = try_status!(value_arg(key));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.has_property(object, key), |b| b) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_has_own_property(
    env: NAPIEnv,
    object: NAPIValue,
    key: NAPIValue,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    let key = try_status!(value_arg(key));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.has_own_property(object, key), |b| b) }
}

/// `result` may be null.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_delete_property(
    env: NAPIEnv,
    object: NAPIValue,
    key: NAPIValue,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(object));
    let key = try_status!(value_arg(key));
    let deleted = try_status!(env.delete_property(object, key).map_err(|err| err.status()));
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(deleted) };
    }
    Status::Ok
}

// ============================================================================
// Named properties and elements
// ============================================================================

/// # Safety
/// `env` must be a live environment and `utf8name` a valid C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_set_named_property(
    env: NAPIEnv,
    object: NAPIValue,
    utf8name: *const c_char,
    value: NAPIValue,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(object));
    // SAFETY: caller guarantees a NUL-terminated string
    let name = try_status!(unsafe { utf8_arg(utf8name, NAPI_AUTO_LENGTH) });
    let value = try_status!(value_arg(value));
    status_of(env.set_named_property(object, name, value))
}

/// # Safety
/// `env` must be a live environment, `utf8name` a valid C string and
/// `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_named_property(
    env: NAPIEnv,
    object: NAPIValue,
    utf8name: *const c_char,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: caller guarantees a NUL-terminated string
    let name = try_status!(unsafe { utf8_arg(utf8name, NAPI_AUTO_LENGTH) });
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_named_property(object, name), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment, `utf8name` a valid C string and
/// `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_has_named_property(
    env: NAPIEnv,
    object: NAPIValue,
    utf8name: *const c_char,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: caller guarantees a NUL-terminated string
    let name = try_status!(unsafe { utf8_arg(utf8name, NAPI_AUTO_LENGTH) });
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.has_named_property(object, name), |b| b) }
}

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_set_element(
    env: NAPIEnv,
    object: NAPIValue,
    index: u32,
    value: NAPIValue,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(object));
    let value = try_status!(value_arg(value));
    status_of(env.set_element(object, index, value))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_element(
    env: NAPIEnv,
    object: NAPIValue,
    index: u32,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.get_element(object, index), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_has_element(
    env: NAPIEnv,
    object: NAPIValue,
    index: u32,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.has_element(object, index), |b| b) }
}

/// `result` may be null.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_delete_element(
    env: NAPIEnv,
    object: NAPIValue,
    index: u32,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(object));
    let deleted = try_status!(env.delete_element(object, index).map_err(|err| err.status()));
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(deleted) };
    }
    Status::Ok
}

// ============================================================================
// Wrapping and finalizers
// ============================================================================

/// Write a weak reference to `object` if the caller asked for one
///
/// # Safety
/// `result` must be null or valid for writes.
unsafe fn write_optional_reference(
    env: &mut crate::env::Env,
    object: crate::env::Value,
    result: *mut NAPIRef,
) -> Status {
    if result.is_null() {
        return Status::Ok;
    }
    // SAFETY: non-null, caller guarantees validity
    unsafe { write_result(result, env.create_reference(object, 0), reference_to_raw) }
}

/// `result`, if non-null, receives a weak reference to `js_object`.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
/// `finalize_cb`, if given, must be safe to call with `native_object` and
/// `finalize_hint`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_wrap(
    env: NAPIEnv,
    js_object: NAPIValue,
    native_object: *mut c_void,
    finalize_cb: NAPIFinalize,
    finalize_hint: *mut c_void,
    result: *mut NAPIRef,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(js_object));
    let finalize = adapt_finalizer(finalize_cb);
    try_status!(
        env.wrap(object, native_object, finalize, finalize_hint)
            .map_err(|err| err.status())
    );
    // SAFETY: forwarded caller guarantee
    unsafe { write_optional_reference(env, object, result) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_unwrap(
    env: NAPIEnv,
    js_object: NAPIValue,
    result: *mut *mut c_void,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(js_object));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.unwrap(object), |data| data) }
}

/// `result` may be null.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_remove_wrap(
    env: NAPIEnv,
    js_object: NAPIValue,
    result: *mut *mut c_void,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(js_object));
    let data = try_status!(env.remove_wrap(object).map_err(|err| err.status()));
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(data) };
    }
    Status::Ok
}

/// `result`, if non-null, receives a weak reference to `js_object`.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
/// `finalize_cb` must be safe to call with `finalize_data` and
/// `finalize_hint`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_add_finalizer(
    env: NAPIEnv,
    js_object: NAPIValue,
    finalize_data: *mut c_void,
    finalize_cb: NAPIFinalize,
    finalize_hint: *mut c_void,
    result: *mut NAPIRef,
) -> Status {
    let env = check_env!(env);
    let object = try_status!(value_arg(js_object));
    let finalize = try_status!(adapt_finalizer(finalize_cb).ok_or(Status::InvalidArg));
    try_status!(
        env.add_finalizer(object, finalize_data, finalize, finalize_hint)
            .map_err(|err| err.status())
    );
    // SAFETY: forwarded caller guarantee
    unsafe { write_optional_reference(env, object, result) }
}

/// # Safety
/// `env` must be a live environment. `finalize_cb`, if given, must be safe
/// to call with `data` and `finalize_hint`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_set_instance_data(
    env: NAPIEnv,
    data: *mut c_void,
    finalize_cb: NAPIFinalize,
    finalize_hint: *mut c_void,
) -> Status {
    let env = check_env!(env);
    env.set_instance_data(data, adapt_finalizer(finalize_cb), finalize_hint);
    Status::Ok
}

/// # Safety
/// `env` must be a live environment and `data` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_instance_data(env: NAPIEnv, data: *mut *mut c_void) -> Status {
    let env = check_env!(env);
    check_arg!(data);
    // SAFETY: checked non-null above
    unsafe { data.write(env.get_instance_data()) };
    Status::Ok
}
