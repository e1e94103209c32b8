// Tests for error objects and the pending exception

use super::create_test_env;
use hermes_napi::{Status, ValueType};

#[test]
fn test_create_error_kinds() {
    let mut env = create_test_env();
    let msg = env.create_string_utf8("boom").unwrap();
    let code = env.create_string_utf8("E_BOOM").unwrap();

    let error = env.create_error(Some(code), msg).unwrap();
    let type_error = env.create_type_error(None, msg).unwrap();
    let range_error = env.create_range_error(None, msg).unwrap();

    for (value, expected) in [
        (error, "Error"),
        (type_error, "TypeError"),
        (range_error, "RangeError"),
    ] {
        assert!(env.is_error(value).unwrap());
        let name = env.get_named_property(value, "name").unwrap();
        assert_eq!(env.get_value_string_utf8(name).unwrap(), expected);
        let message = env.get_named_property(value, "message").unwrap();
        assert_eq!(env.get_value_string_utf8(message).unwrap(), "boom");
    }

    let code = env.get_named_property(error, "code").unwrap();
    assert_eq!(env.get_value_string_utf8(code).unwrap(), "E_BOOM");
    assert!(!env.has_named_property(type_error, "code").unwrap());

    let text = env.coerce_to_string(type_error).unwrap();
    assert_eq!(env.get_value_string_utf8(text).unwrap(), "TypeError: boom");
}

#[test]
fn test_self_referential_error_coerces() {
    let mut env = create_test_env();
    let msg = env.create_string_utf8("boom").unwrap();
    let error = env.create_error(None, msg).unwrap();
    env.set_named_property(error, "message", error).unwrap();

    // the cycle back to the error stringifies as empty
    let text = env.coerce_to_string(error).unwrap();
    assert_eq!(env.get_value_string_utf8(text).unwrap(), "Error");
    let number = env.coerce_to_number(error).unwrap();
    assert!(env.get_value_double(number).unwrap().is_nan());

    let holder = env.create_object().unwrap();
    let flag = env.get_boolean(true).unwrap();
    env.set_property(holder, error, flag).unwrap();
    assert!(env.has_named_property(holder, "Error").unwrap());
}

#[test]
fn test_error_message_must_be_a_string() {
    let mut env = create_test_env();
    let n = env.create_int32(1).unwrap();
    assert_eq!(env.create_error(None, n).unwrap_err().status(), Status::StringExpected);
}

#[test]
fn test_pending_exception_blocks_engine_operations() {
    let mut env = create_test_env();
    env.throw_error(None, "first").unwrap();
    assert!(env.is_exception_pending());

    // anything that could run engine code fails fast
    assert_eq!(env.create_string_utf8("x").unwrap_err().status(), Status::PendingException);
    assert_eq!(env.throw_error(None, "second").unwrap_err().status(), Status::PendingException);

    // scopes and plain values keep working
    let scope = env.open_handle_scope().unwrap();
    env.get_undefined().unwrap();
    env.close_handle_scope(scope).unwrap();

    let exception = env.get_and_clear_last_exception().unwrap();
    let message = env.get_named_property(exception, "message").unwrap();
    assert_eq!(env.get_value_string_utf8(message).unwrap(), "first");
    assert!(!env.is_exception_pending());
}

#[test]
fn test_throw_any_value() {
    let mut env = create_test_env();
    let value = env.create_int32(13).unwrap();
    env.throw(value).unwrap();
    let caught = env.get_and_clear_last_exception().unwrap();
    assert_eq!(env.get_value_int32(caught).unwrap(), 13);
    assert!(!env.is_error(caught).unwrap());
}

#[test]
fn test_clear_without_exception_yields_undefined() {
    let mut env = create_test_env();
    let nothing = env.get_and_clear_last_exception().unwrap();
    assert_eq!(env.type_of(nothing).unwrap(), ValueType::Undefined);
}

#[test]
fn test_pending_exception_survives_collection() {
    let mut env = create_test_env();
    let scope = env.open_handle_scope().unwrap();
    env.throw_range_error(Some("E_RANGE"), "out of range").unwrap();
    env.close_handle_scope(scope).unwrap();
    env.collect_garbage();

    let exception = env.get_and_clear_last_exception().unwrap();
    let code = env.get_named_property(exception, "code").unwrap();
    assert_eq!(env.get_value_string_utf8(code).unwrap(), "E_RANGE");
}
