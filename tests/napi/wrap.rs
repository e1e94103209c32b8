// Tests for wrapping, attached finalizers and instance data

use std::cell::RefCell;
use std::rc::Rc;

use super::{counter, counting_finalizer, create_test_env, recording_finalizer, token};
use hermes_napi::Status;

#[test]
fn test_wrap_and_unwrap() {
    let mut env = create_test_env();
    let obj = env.create_object().unwrap();
    env.wrap(obj, token(0x42), None, std::ptr::null_mut()).unwrap();
    assert_eq!(env.unwrap(obj).unwrap(), token(0x42));

    let err = env.wrap(obj, token(0x43), None, std::ptr::null_mut()).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
    assert_eq!(env.unwrap(obj).unwrap(), token(0x42));
}

#[test]
fn test_unwrap_of_unwrapped_object_fails() {
    let mut env = create_test_env();
    let obj = env.create_object().unwrap();
    assert_eq!(env.unwrap(obj).unwrap_err().status(), Status::InvalidArg);
}

#[test]
fn test_wrap_finalizer_runs_when_object_dies() {
    let mut env = create_test_env();
    let count = counter();

    let scope = env.open_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    let reference = env
        .wrap_with_reference(obj, token(1), Some(counting_finalizer(&count)), std::ptr::null_mut())
        .unwrap();
    env.close_handle_scope(scope).unwrap();

    env.collect_garbage();
    assert_eq!(count.get(), 1);
    assert_eq!(env.get_reference_value(reference).unwrap(), None);
}

#[test]
fn test_remove_wrap_disarms_finalizer() {
    let mut env = create_test_env();
    let count = counter();

    let scope = env.open_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    env.wrap(obj, token(7), Some(counting_finalizer(&count)), std::ptr::null_mut())
        .unwrap();
    assert_eq!(env.remove_wrap(obj).unwrap(), token(7));
    assert_eq!(env.unwrap(obj).unwrap_err().status(), Status::InvalidArg);

    // can be wrapped again after removal
    env.wrap(obj, token(8), None, std::ptr::null_mut()).unwrap();
    env.close_handle_scope(scope).unwrap();

    env.collect_garbage();
    drop(env);
    assert_eq!(count.get(), 0);
}

#[test]
fn test_multiple_finalizers_each_run_once() {
    let mut env = create_test_env();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let scope = env.open_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    env.add_finalizer(obj, token(1), recording_finalizer(&seen), std::ptr::null_mut())
        .unwrap();
    let reference = env
        .add_finalizer_with_reference(obj, token(2), recording_finalizer(&seen), std::ptr::null_mut())
        .unwrap();
    assert_eq!(env.reference_count(reference).unwrap(), 0);
    env.close_handle_scope(scope).unwrap();

    env.collect_garbage();
    env.collect_garbage();
    let mut finalized = seen.borrow().clone();
    finalized.sort_unstable();
    assert_eq!(finalized, [1, 2]);
}

#[test]
fn test_wrap_requires_an_object() {
    let mut env = create_test_env();
    let n = env.create_int32(1).unwrap();
    let err = env.wrap(n, token(1), None, std::ptr::null_mut()).unwrap_err();
    assert_eq!(err.status(), Status::ObjectExpected);
}

// ═══════════════════════════════════════════════════════════════════════════
// Instance data
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_instance_data_is_finalized_at_teardown() {
    let mut env = create_test_env();
    let count = counter();
    assert!(env.get_instance_data().is_null());

    env.set_instance_data(token(5), Some(counting_finalizer(&count)), std::ptr::null_mut());
    assert_eq!(env.get_instance_data(), token(5));
    env.collect_garbage();
    assert_eq!(count.get(), 0);

    env.destroy();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_replacing_instance_data_drops_old_finalizer() {
    let mut env = create_test_env();
    let seen = Rc::new(RefCell::new(Vec::new()));
    env.set_instance_data(token(1), Some(recording_finalizer(&seen)), std::ptr::null_mut());
    env.set_instance_data(token(2), Some(recording_finalizer(&seen)), std::ptr::null_mut());
    assert_eq!(env.get_instance_data(), token(2));

    drop(env);
    assert_eq!(*seen.borrow(), [2]);
}

#[test]
fn test_instance_data_finalized_after_externals() {
    let mut env = create_test_env();
    let order = Rc::new(RefCell::new(Vec::new()));
    env.create_external(token(10), Some(recording_finalizer(&order)), std::ptr::null_mut())
        .unwrap();
    env.set_instance_data(token(20), Some(recording_finalizer(&order)), std::ptr::null_mut());

    env.destroy();
    assert_eq!(*order.borrow(), [10, 20]);
}
