//! Handle scopes and references.

use super::{
    NAPIEnv, NAPIEscapableHandleScope, NAPIHandleScope, NAPIRef, NAPIValue, check_arg, check_env,
    status_of, try_status, value_arg, write_result,
};
use crate::error::Status;
use crate::reference::Reference;
use crate::scope::{EscapableHandleScope, HandleScope};

pub(crate) fn reference_to_raw(reference: Reference) -> NAPIRef {
    reference.into_raw() as usize as NAPIRef
}

fn reference_arg(reference: NAPIRef) -> Result<Reference, Status> {
    Reference::from_raw(reference as usize as u64).ok_or(Status::InvalidArg)
}

// ============================================================================
// Handle Scopes
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_open_handle_scope(env: NAPIEnv, result: *mut NAPIHandleScope) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe {
        write_result(result, env.open_handle_scope(), |scope| {
            scope.into_raw() as usize as NAPIHandleScope
        })
    }
}

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_close_handle_scope(env: NAPIEnv, scope: NAPIHandleScope) -> Status {
    let env = check_env!(env);
    let scope = try_status!(HandleScope::from_raw(scope as usize as u64).ok_or(Status::InvalidArg));
    status_of(env.close_handle_scope(scope))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_open_escapable_handle_scope(
    env: NAPIEnv,
    result: *mut NAPIEscapableHandleScope,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    // SAFETY: checked non-null above
    unsafe {
        write_result(result, env.open_escapable_handle_scope(), |scope| {
            scope.into_raw() as usize as NAPIEscapableHandleScope
        })
    }
}

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_close_escapable_handle_scope(
    env: NAPIEnv,
    scope: NAPIEscapableHandleScope,
) -> Status {
    let env = check_env!(env);
    let scope = try_status!(
        EscapableHandleScope::from_raw(scope as usize as u64).ok_or(Status::InvalidArg)
    );
    status_of(env.close_escapable_handle_scope(scope))
}

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_escape_handle(
    env: NAPIEnv,
    scope: NAPIEscapableHandleScope,
    escapee: NAPIValue,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let scope = try_status!(
        EscapableHandleScope::from_raw(scope as usize as u64).ok_or(Status::InvalidArg)
    );
    let escapee = try_status!(value_arg(escapee));
    // SAFETY: checked non-null above
    unsafe { write_result(result, env.escape_handle(scope, escapee), |v| v.into_raw()) }
}

// ============================================================================
// References
// ============================================================================

/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_create_reference(
    env: NAPIEnv,
    value: NAPIValue,
    initial_ref_count: u32,
    result: *mut NAPIRef,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let value = try_status!(value_arg(value));
    // SAFETY: checked non-null above
    unsafe {
        write_result(
            result,
            env.create_reference(value, initial_ref_count),
            reference_to_raw,
        )
    }
}

/// # Safety
/// `env` must be a live environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_delete_reference(env: NAPIEnv, reference: NAPIRef) -> Status {
    let env = check_env!(env);
    let reference = try_status!(reference_arg(reference));
    status_of(env.delete_reference(reference))
}

/// `result` may be null.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_reference_ref(
    env: NAPIEnv,
    reference: NAPIRef,
    result: *mut u32,
) -> Status {
    let env = check_env!(env);
    let reference = try_status!(reference_arg(reference));
    let count = try_status!(env.reference_ref(reference).map_err(|err| err.status()));
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(count) };
    }
    Status::Ok
}

/// `result` may be null.
///
/// # Safety
/// `env` must be a live environment and `result` null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_reference_unref(
    env: NAPIEnv,
    reference: NAPIRef,
    result: *mut u32,
) -> Status {
    let env = check_env!(env);
    let reference = try_status!(reference_arg(reference));
    let count = try_status!(env.reference_unref(reference).map_err(|err| err.status()));
    if !result.is_null() {
        // SAFETY: non-null, caller guarantees validity
        unsafe { result.write(count) };
    }
    Status::Ok
}

/// Writes 0 when the target was collected or never held.
///
/// # Safety
/// `env` must be a live environment and `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn napi_get_reference_value(
    env: NAPIEnv,
    reference: NAPIRef,
    result: *mut NAPIValue,
) -> Status {
    let env = check_env!(env);
    check_arg!(result);
    let reference = try_status!(reference_arg(reference));
    // SAFETY: checked non-null above
    unsafe {
        write_result(result, env.get_reference_value(reference), |value| {
            value.map_or(0, |v| v.into_raw())
        })
    }
}
