//! Native functions and calls.

use std::ffi::{c_char, c_void};

use super::{
    NAPICallback, NAPICallbackInfo, NAPIEnv, NAPIValue, adapt_callback, check_arg, check_env,
    optional_value_arg, try_status, utf8_arg, value_arg, write_result,
};
use crate::callback::CallbackInfo;
use crate::env::Value;
use crate::error::Status;

/// Read `argc` handles from `argv`
///
/// # Safety
/// `argv` must hold `argc` values when `argc > 0`.
unsafe fn args_arg(argc: usize, argv: *const NAPIValue) -> Result<Vec<Value>, Status> {
    if argc == 0 {
        return Ok(Vec::new());
    }
    if argv.is_null() {
        return Err(Status::InvalidArg);
    }
    // SAFETY: caller guarantees `argc` readable values
    let raw = unsafe { std::slice::from_raw_parts(argv, argc) };
    raw.iter().map(|raw| value_arg(*raw)).collect()
}

/// Borrow the callback info of the running call
///
/// # Safety
/// `info` must be the pointer handed to the running callback.
unsafe fn info_arg<'a>(info: NAPICallbackInfo) -> Result<&'a CallbackInfo, Status> {
    // SAFETY: caller guarantees the call is still running
    unsafe { info.as_ref() }.ok_or(Status::InvalidArg)
}

/// `utf8name` may be null for an anonymous function.
///
/// # Safety
/// `env` must be a live environment, `utf8name` null or holding `length`
/// bytes, and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_function(
    env: NAPIEnv,
    utf8name: *const c_char,
    length: usize,
    cb: NAPICallback,
    data: *mut c_void,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let cb = try_status!(cb.ok_or(Status::InvalidArg));
    let name = if utf8name.is_null() {
        None
    } else {
        // SAFETY: caller guarantees the buffer
        Some(try_status!(unsafe { utf8_arg(utf8name, length) }))
    };
    let function = env.create_function(name, data, adapt_callback(cb));
    // SAFETY: checked non-null above
    unsafe { write_result(result, function, |v| v.into_raw()) }
}

/// `recv` may be 0 to call with the global object as `this`. `result` may be
/// null when the return value is not needed.
///
/// # Safety
/// `env` must be a live environment, `argv` must hold `argc` values and
/// `result` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_call_function(
    env: NAPIEnv,
    recv: NAPIValue,
    func: NAPIValue,
    argc: usize,
    argv: *const NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    let func = try_status!(value_arg(func));
    // SAFETY: forwarded caller guarantee
    let args = try_status!(unsafe { args_arg(argc, argv) });
    let value = try_status!(
        env.call_function(optional_value_arg(recv), func, &args)
            .map_err(|err| err.status())
    );
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(value.into_raw()) };
    }
    Status::Ok
}

/// # Safety
/// `env` must be a live environment, `argv` must hold `argc` values and
/// `result` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_new_instance(
    env: NAPIEnv,
    constructor: NAPIValue,
    argc: usize,
    argv: *const NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let constructor = try_status!(value_arg(constructor));
    // SAFETY: forwarded caller guarantee
    let args = try_status!(unsafe { args_arg(argc, argv) });
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.new_instance(constructor, &args), |v| v.into_raw()) }
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_instanceof(
    env: NAPIEnv,
    object: NAPIValue,
    constructor: NAPIValue,
    result: *mut bool,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let object = try_status!(value_arg(object));
    let constructor = try_status!(value_arg(constructor));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.instance_of(object, constructor), |b| b) }
}

/// Read the arguments of the running call.
///
/// On input `*argc` is the capacity of `argv`; on output it is the actual
/// argument count. `argv` is filled up to its capacity, padding with
/// `undefined`. Every out-pointer may be null.
///
/// # Safety
/// `env` must be a live environment and `cbinfo` the info of the running
/// callback. Non-null pointers must be valid, and `argv` must hold `*argc`
/// values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_cb_info(
    env: NAPIEnv,
    cbinfo: NAPICallbackInfo,
    argc: *mut usize,
    argv: *mut NAPIValue,
    this_arg: *mut NAPIValue,
    data: *mut *mut c_void,
) -> Status {
    let env = check_env!(env);
    // SAFETY: forwarded caller guarantee
    let info = try_status!(unsafe { info_arg(cbinfo) });

    if !argv.is_null() {
        check_arg!(argc);
        // SAFETY: checked non-null above
        let capacity = unsafe { argc.read() };
        let (values, _) = try_status!(env.get_cb_info(info, capacity).map_err(|err| err.status()));
        for (i, value) in values.iter().enumerate() {
            // SAFETY: argv holds `capacity` values and i < capacity
            unsafe { argv.add(i).write(value.into_raw()) };
        }
    }
    if !argc.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { argc.write(info.argc()) };
    }
    if !this_arg.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { this_arg.write(info.this().into_raw()) };
    }
    if !data.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { data.write(info.data()) };
    }
    Status::Ok
}

/// Writes 0 when the call is not a construct call.
///
/// # Safety
/// `env` must be a live environment, `cbinfo` the info of the running
/// callback and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_new_target(
    env: NAPIEnv,
    cbinfo: NAPICallbackInfo,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: forwarded caller guarantee
    let info = try_status!(unsafe { info_arg(cbinfo) });
    let target = env.get_new_target(info).map_or(0, Value::into_raw);
    // SAFETY: checked non-null above
    unsafe { result.write(target) };
    Status::Ok
}

