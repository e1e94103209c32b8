// Tests for externals and their finalizers

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

use super::{counter, counting_finalizer, create_test_env, recording_finalizer, token};
use hermes_napi::{Env, Status, ValueType};

#[test]
fn test_external_round_trips_its_pointer() {
    let mut env = create_test_env();
    let mut payload = 17u64;
    let data = (&mut payload as *mut u64).cast::<c_void>();
    let external = env.create_external(data, None, std::ptr::null_mut()).unwrap();

    assert_eq!(env.type_of(external).unwrap(), ValueType::External);
    assert_eq!(env.get_value_external(external).unwrap(), data);
    let ptr = env.get_value_external(external).unwrap().cast::<u64>();
    // SAFETY: points at `payload`, which is still alive
    assert_eq!(unsafe { *ptr }, 17);
}

#[test]
fn test_get_value_external_rejects_other_values() {
    let mut env = create_test_env();
    let obj = env.create_object().unwrap();
    let n = env.create_int32(1).unwrap();
    assert_eq!(env.get_value_external(obj).unwrap_err().status(), Status::InvalidArg);
    assert_eq!(env.get_value_external(n).unwrap_err().status(), Status::InvalidArg);
}

#[test]
fn test_unreachable_external_is_finalized_once() {
    let mut env = create_test_env();
    let count = counter();

    let scope = env.open_handle_scope().unwrap();
    env.create_external(token(1), Some(counting_finalizer(&count)), std::ptr::null_mut())
        .unwrap();
    env.close_handle_scope(scope).unwrap();

    env.collect_garbage();
    assert_eq!(count.get(), 1);
    env.collect_garbage();
    assert_eq!(count.get(), 1);

    drop(env);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_finalizer_receives_data_and_hint() {
    let mut env = create_test_env();
    let seen: Rc<RefCell<Vec<(usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let scope = env.open_handle_scope().unwrap();
    env.create_external(
        token(0x10),
        Some(Box::new(move |_env: &mut Env, data: *mut c_void, hint: *mut c_void| {
            sink.borrow_mut().push((data as usize, hint as usize));
        })),
        token(0x20),
    )
    .unwrap();
    env.close_handle_scope(scope).unwrap();
    env.collect_garbage();

    assert_eq!(*seen.borrow(), [(0x10, 0x20)]);
}

#[test]
fn test_teardown_finalizes_live_externals() {
    let mut env = create_test_env();
    let seen = Rc::new(RefCell::new(Vec::new()));

    // one rooted by a handle, one by a strong reference
    env.create_external(token(1), Some(recording_finalizer(&seen)), std::ptr::null_mut())
        .unwrap();
    let scope = env.open_handle_scope().unwrap();
    let held = env
        .create_external(token(2), Some(recording_finalizer(&seen)), std::ptr::null_mut())
        .unwrap();
    env.create_reference(held, 1).unwrap();
    env.close_handle_scope(scope).unwrap();

    env.collect_garbage();
    assert!(seen.borrow().is_empty());

    env.destroy();
    let mut finalized = seen.borrow().clone();
    finalized.sort_unstable();
    assert_eq!(finalized, [1, 2]);
}

#[test]
fn test_external_reachable_through_object_survives() {
    let mut env = create_test_env();
    let count = counter();
    let outer = env.open_handle_scope().unwrap();
    let holder = env.create_object().unwrap();

    let inner = env.open_handle_scope().unwrap();
    let external = env
        .create_external(token(3), Some(counting_finalizer(&count)), std::ptr::null_mut())
        .unwrap();
    env.set_named_property(holder, "native", external).unwrap();
    env.close_handle_scope(inner).unwrap();

    env.collect_garbage();
    assert_eq!(count.get(), 0);
    let native = env.get_named_property(holder, "native").unwrap();
    assert_eq!(env.get_value_external(native).unwrap(), token(3));

    env.close_handle_scope(outer).unwrap();
    env.collect_garbage();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_finalizer_can_use_the_environment() {
    let mut env = create_test_env();
    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);

    let scope = env.open_handle_scope().unwrap();
    env.create_external(
        token(4),
        Some(Box::new(move |env: &mut Env, _data, _hint| {
            let s = env.create_string_utf8("from finalizer").unwrap();
            *sink.borrow_mut() = Some(env.get_value_string_utf8(s).unwrap());
        })),
        std::ptr::null_mut(),
    )
    .unwrap();
    env.close_handle_scope(scope).unwrap();
    env.collect_garbage();

    assert_eq!(observed.borrow().as_deref(), Some("from finalizer"));
}
