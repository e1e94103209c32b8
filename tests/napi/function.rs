// Tests for native functions, callback info and construction

use std::cell::Cell;
use std::rc::Rc;

use super::{create_test_env, token};
use hermes_napi::{CallbackInfo, Env, NapiError, NapiResult, Status, Value, ValueType};

fn add(env: &mut Env, info: &CallbackInfo) -> NapiResult<Option<Value>> {
    let (args, _) = env.get_cb_info(info, 2)?;
    let a = env.get_value_double(args[0])?;
    let b = env.get_value_double(args[1])?;
    env.create_double(a + b).map(Some)
}

// ═══════════════════════════════════════════════════════════════════════════
// Calls
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_call_native_function() {
    let mut env = create_test_env();
    let f = env.create_function(Some("add"), std::ptr::null_mut(), add).unwrap();
    assert_eq!(env.type_of(f).unwrap(), ValueType::Function);

    let a = env.create_double(2.0).unwrap();
    let b = env.create_double(40.0).unwrap();
    let result = env.call_function(None, f, &[a, b]).unwrap();
    assert_eq!(env.get_value_double(result).unwrap(), 42.0);

    let name = env.get_named_property(f, "name").unwrap();
    assert_eq!(env.get_value_string_utf8(name).unwrap(), "add");
}

#[test]
fn test_missing_arguments_read_as_undefined() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |env: &mut Env, info: &CallbackInfo| {
            let (args, argc) = env.get_cb_info(info, 3)?;
            assert_eq!(argc, 1);
            assert_eq!(args.len(), 3);
            assert_eq!(env.type_of(args[1])?, ValueType::Undefined);
            assert_eq!(env.type_of(args[2])?, ValueType::Undefined);
            Ok(Some(args[0]))
        })
        .unwrap();
    let arg = env.create_string_utf8("only").unwrap();
    let result = env.call_function(None, f, &[arg]).unwrap();
    assert_eq!(env.get_value_string_utf8(result).unwrap(), "only");
}

#[test]
fn test_receiver_and_data_reach_the_callback() {
    let mut env = create_test_env();
    let f = env
        .create_function(Some("probe"), token(0xbeef), |env: &mut Env, info: &CallbackInfo| {
            assert_eq!(info.data(), token(0xbeef));
            let tag = env.get_named_property(info.this(), "tag")?;
            Ok(Some(tag))
        })
        .unwrap();

    let recv = env.create_object().unwrap();
    let tag = env.create_int32(9).unwrap();
    env.set_named_property(recv, "tag", tag).unwrap();
    let result = env.call_function(Some(recv), f, &[]).unwrap();
    assert_eq!(env.get_value_int32(result).unwrap(), 9);
}

#[test]
fn test_default_receiver_is_global() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |_env: &mut Env, info: &CallbackInfo| {
            Ok(Some(info.this()))
        })
        .unwrap();
    let this = env.call_function(None, f, &[]).unwrap();
    let global = env.get_global().unwrap();
    assert!(env.strict_equals(this, global).unwrap());
}

#[test]
fn test_returning_none_yields_undefined() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |_env: &mut Env, _info: &CallbackInfo| Ok(None))
        .unwrap();
    let result = env.call_function(None, f, &[]).unwrap();
    assert_eq!(env.type_of(result).unwrap(), ValueType::Undefined);
}

#[test]
fn test_calling_a_non_function_fails() {
    let mut env = create_test_env();
    let obj = env.create_object().unwrap();
    let err = env.call_function(None, obj, &[]).unwrap_err();
    assert_eq!(err.status(), Status::FunctionExpected);
}

#[test]
fn test_callback_handles_do_not_leak() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |env: &mut Env, _info: &CallbackInfo| {
            // deliberately left open; the call unwinds it
            env.open_handle_scope()?;
            for _ in 0..8 {
                env.create_object()?;
            }
            Ok(None)
        })
        .unwrap();
    let before = env.open_scope_count();
    env.call_function(None, f, &[]).unwrap();
    assert_eq!(env.open_scope_count(), before);
}

// ═══════════════════════════════════════════════════════════════════════════
// Errors from callbacks
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_thrown_exception_propagates() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |env: &mut Env, _info: &CallbackInfo| {
            env.throw_type_error(Some("E_BAD"), "bad input")?;
            Ok(None)
        })
        .unwrap();
    let err = env.call_function(None, f, &[]).unwrap_err();
    assert_eq!(err.status(), Status::PendingException);

    let exception = env.get_and_clear_last_exception().unwrap();
    let message = env.get_named_property(exception, "message").unwrap();
    assert_eq!(env.get_value_string_utf8(message).unwrap(), "bad input");
    let code = env.get_named_property(exception, "code").unwrap();
    assert_eq!(env.get_value_string_utf8(code).unwrap(), "E_BAD");
}

#[test]
fn test_error_result_becomes_an_exception() {
    let mut env = create_test_env();
    let f = env
        .create_function(None, std::ptr::null_mut(), |_env: &mut Env, _info: &CallbackInfo| {
            Err(NapiError::generic("native failure"))
        })
        .unwrap();
    let err = env.call_function(None, f, &[]).unwrap_err();
    assert_eq!(err.status(), Status::PendingException);

    let exception = env.get_and_clear_last_exception().unwrap();
    assert!(env.is_error(exception).unwrap());
    let message = env.get_named_property(exception, "message").unwrap();
    assert!(
        env.get_value_string_utf8(message)
            .unwrap()
            .contains("native failure")
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════════

fn point(env: &mut Env, info: &CallbackInfo) -> NapiResult<Option<Value>> {
    let (args, _) = env.get_cb_info(info, 2)?;
    let this = info.this();
    env.set_named_property(this, "x", args[0])?;
    env.set_named_property(this, "y", args[1])?;
    Ok(None)
}

#[test]
fn test_new_instance_builds_this() {
    let mut env = create_test_env();
    let ctor = env.create_function(Some("Point"), std::ptr::null_mut(), point).unwrap();
    let x = env.create_int32(3).unwrap();
    let y = env.create_int32(4).unwrap();
    let p = env.new_instance(ctor, &[x, y]).unwrap();

    let px = env.get_named_property(p, "x").unwrap();
    let py = env.get_named_property(p, "y").unwrap();
    assert_eq!(env.get_value_int32(px).unwrap(), 3);
    assert_eq!(env.get_value_int32(py).unwrap(), 4);
    assert!(env.instance_of(p, ctor).unwrap());

    let other = env.create_object().unwrap();
    assert!(!env.instance_of(other, ctor).unwrap());
}

#[test]
fn test_new_target_is_only_set_for_construction() {
    let mut env = create_test_env();
    let constructed = Rc::new(Cell::new(0u32));
    let plain = Rc::new(Cell::new(0u32));
    let (c, p) = (Rc::clone(&constructed), Rc::clone(&plain));
    let f = env
        .create_function(None, std::ptr::null_mut(), move |env: &mut Env, info: &CallbackInfo| {
            match env.get_new_target(info) {
                Some(_) => c.set(c.get() + 1),
                None => p.set(p.get() + 1),
            }
            Ok(None)
        })
        .unwrap();

    env.call_function(None, f, &[]).unwrap();
    env.new_instance(f, &[]).unwrap();
    assert_eq!(constructed.get(), 1);
    assert_eq!(plain.get(), 1);
}

#[test]
fn test_constructor_returning_object_replaces_this() {
    let mut env = create_test_env();
    let ctor = env
        .create_function(None, std::ptr::null_mut(), |env: &mut Env, _info: &CallbackInfo| {
            let replacement = env.create_array()?;
            Ok(Some(replacement))
        })
        .unwrap();
    let result = env.new_instance(ctor, &[]).unwrap();
    assert!(env.is_array(result).unwrap());
}

#[test]
fn test_function_prototype_links_back() {
    let mut env = create_test_env();
    let ctor = env.create_function(Some("Point"), std::ptr::null_mut(), point).unwrap();
    let proto = env.get_named_property(ctor, "prototype").unwrap();
    let back = env.get_named_property(proto, "constructor").unwrap();
    assert!(env.strict_equals(back, ctor).unwrap());
}
