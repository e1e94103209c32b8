// Tests for strong, weak and empty references

use super::create_test_env;
use hermes_napi::{Env, Reference, Status, Strength, ValueType};

/// Object with a marker property, created in its own scope so only the
/// returned reference can keep it alive
fn referenced_object(env: &mut Env, count: u32) -> Reference {
    let scope = env.open_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    let marker = env.create_string_utf8("marker").unwrap();
    env.set_named_property(obj, "tag", marker).unwrap();
    let reference = env.create_reference(obj, count).unwrap();
    env.close_handle_scope(scope).unwrap();
    reference
}

// ═══════════════════════════════════════════════════════════════════════════
// Counting
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_ref_and_unref_move_between_lists() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 0);
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Weak);
    assert_eq!(env.reference_list_len(Strength::Weak), 1);

    assert_eq!(env.reference_ref(reference).unwrap(), 1);
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Strong);
    assert_eq!(env.reference_list_len(Strength::Strong), 1);
    assert_eq!(env.reference_list_len(Strength::Weak), 0);

    assert_eq!(env.reference_ref(reference).unwrap(), 2);
    assert_eq!(env.reference_unref(reference).unwrap(), 1);
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Strong);
    assert_eq!(env.reference_unref(reference).unwrap(), 0);
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Weak);

    env.delete_reference(reference).unwrap();
    assert_eq!(env.reference_list_len(Strength::Weak), 0);
}

#[test]
fn test_unref_at_zero_is_rejected_without_change() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 0);
    let err = env.reference_unref(reference).unwrap_err();
    assert_eq!(err.status(), Status::GenericFailure);
    assert_eq!(env.reference_count(reference).unwrap(), 0);
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Weak);
}

#[test]
fn test_deleted_reference_is_invalid() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 1);
    env.delete_reference(reference).unwrap();

    assert_eq!(env.reference_ref(reference).unwrap_err().status(), Status::InvalidArg);
    assert_eq!(env.get_reference_value(reference).unwrap_err().status(), Status::InvalidArg);
    assert_eq!(env.delete_reference(reference).unwrap_err().status(), Status::InvalidArg);

    // a new reference reusing the slot does not revive the old one
    let fresh = referenced_object(&mut env, 1);
    assert_eq!(env.reference_count(fresh).unwrap(), 1);
    assert_eq!(env.reference_count(reference).unwrap_err().status(), Status::InvalidArg);
}

// ═══════════════════════════════════════════════════════════════════════════
// Liveness
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_strong_reference_keeps_object_alive() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 1);
    env.collect_garbage();

    let scope = env.open_handle_scope().unwrap();
    let obj = env.get_reference_value(reference).unwrap().unwrap();
    let tag = env.get_named_property(obj, "tag").unwrap();
    assert_eq!(env.get_value_string_utf8(tag).unwrap(), "marker");
    env.close_handle_scope(scope).unwrap();
}

#[test]
fn test_weak_reference_clears_on_collection() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 0);
    env.collect_garbage();

    assert_eq!(env.get_reference_value(reference).unwrap(), None);
    // still a valid reference, just empty
    assert_eq!(env.reference_count(reference).unwrap(), 0);
    env.delete_reference(reference).unwrap();
}

#[test]
fn test_weak_reference_follows_live_object() {
    let mut env = create_test_env();
    let scope = env.open_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    let reference = env.create_reference(obj, 0).unwrap();
    env.collect_garbage();

    let value = env.get_reference_value(reference).unwrap().unwrap();
    assert!(env.strict_equals(value, obj).unwrap());
    env.close_handle_scope(scope).unwrap();
}

#[test]
fn test_demoted_reference_lets_object_die() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 1);
    env.collect_garbage();
    assert!(env.get_reference_value(reference).unwrap().is_some());

    env.reference_unref(reference).unwrap();
    env.collect_garbage();
    assert_eq!(env.get_reference_value(reference).unwrap(), None);

    // promoting an empty weak reference holds nothing
    assert_eq!(env.reference_ref(reference).unwrap(), 1);
    let value = env.get_reference_value(reference).unwrap().unwrap();
    assert_eq!(env.type_of(value).unwrap(), ValueType::Undefined);
}

#[test]
fn test_primitive_reference_is_dropped_at_zero() {
    let mut env = create_test_env();
    let n = env.create_int32(5).unwrap();
    let reference = env.create_reference(n, 1).unwrap();
    let value = env.get_reference_value(reference).unwrap().unwrap();
    assert_eq!(env.get_value_int32(value).unwrap(), 5);

    env.reference_unref(reference).unwrap();
    assert_eq!(env.reference_strength(reference).unwrap(), Strength::Value);
    assert_eq!(env.get_reference_value(reference).unwrap(), None);
}

#[test]
fn test_raw_reference_round_trip() {
    let mut env = create_test_env();
    let reference = referenced_object(&mut env, 1);
    let raw = reference.into_raw();
    assert_ne!(raw, 0);
    assert_eq!(Reference::from_raw(raw), Some(reference));
    assert_eq!(Reference::from_raw(0), None);
}
