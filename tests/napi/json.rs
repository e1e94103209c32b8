// Tests for JSON parsing into engine values

use super::create_test_env;
use hermes_napi::{Status, ValueType};

#[test]
fn test_parse_nested_document() {
    let mut env = create_test_env();
    let scope = env.open_handle_scope().unwrap();
    let doc = env
        .parse_json(r#"{"name": "addon", "version": 3, "tags": ["a", "b"], "meta": {"ok": true, "none": null}}"#)
        .unwrap();
    env.collect_garbage();

    let name = env.get_named_property(doc, "name").unwrap();
    assert_eq!(env.get_value_string_utf8(name).unwrap(), "addon");
    let version = env.get_named_property(doc, "version").unwrap();
    assert_eq!(env.get_value_int32(version).unwrap(), 3);

    let tags = env.get_named_property(doc, "tags").unwrap();
    assert!(env.is_array(tags).unwrap());
    assert_eq!(env.get_array_length(tags).unwrap(), 2);
    let second = env.get_element(tags, 1).unwrap();
    assert_eq!(env.get_value_string_utf8(second).unwrap(), "b");

    let meta = env.get_named_property(doc, "meta").unwrap();
    let ok = env.get_named_property(meta, "ok").unwrap();
    assert!(env.get_value_bool(ok).unwrap());
    let none = env.get_named_property(meta, "none").unwrap();
    assert_eq!(env.type_of(none).unwrap(), ValueType::Null);

    env.close_handle_scope(scope).unwrap();
}

#[test]
fn test_parse_scalar_documents() {
    let mut env = create_test_env();
    let n = env.parse_json("1.25").unwrap();
    assert_eq!(env.get_value_double(n).unwrap(), 1.25);
    let s = env.parse_json(r#""text""#).unwrap();
    assert_eq!(env.get_value_string_utf8(s).unwrap(), "text");
    let null = env.parse_json("null").unwrap();
    assert_eq!(env.type_of(null).unwrap(), ValueType::Null);
}

#[test]
fn test_parse_leaves_only_the_result_in_scope() {
    let mut env = create_test_env();
    let before = env.open_scope_count();
    env.parse_json(r#"[{"a": 1}, {"b": 2}]"#).unwrap();
    assert_eq!(env.open_scope_count(), before);
}

#[test]
fn test_malformed_json_throws_syntax_error() {
    let mut env = create_test_env();
    let err = env.parse_json("[1, 2,").unwrap_err();
    assert_eq!(err.status(), Status::PendingException);
    let exception = env.get_and_clear_last_exception().unwrap();
    let name = env.get_named_property(exception, "name").unwrap();
    assert_eq!(env.get_value_string_utf8(name).unwrap(), "SyntaxError");
}
