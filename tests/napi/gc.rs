// GC stress tests: rooting through scopes, references and object graphs

use super::{counter, counting_finalizer, create_test_env, token};
use hermes_napi::{Env, Reference, Strength};

/// Build a linked list of `len` objects, returning a strong reference to
/// its head
fn build_chain(env: &mut Env, len: i32) -> Reference {
    let scope = env.open_handle_scope().unwrap();
    let mut head = env.get_null().unwrap();
    for i in 0..len {
        let node = env.create_object().unwrap();
        let value = env.create_int32(i).unwrap();
        env.set_named_property(node, "value", value).unwrap();
        env.set_named_property(node, "next", head).unwrap();
        head = node;
    }
    let reference = env.create_reference(head, 1).unwrap();
    env.close_handle_scope(scope).unwrap();
    reference
}

fn chain_sum(env: &mut Env, reference: Reference) -> i32 {
    let scope = env.open_handle_scope().unwrap();
    let mut node = env.get_reference_value(reference).unwrap().unwrap();
    let mut sum = 0;
    while env.type_of(node).unwrap() == hermes_napi::ValueType::Object {
        let value = env.get_named_property(node, "value").unwrap();
        sum += env.get_value_int32(value).unwrap();
        node = env.get_named_property(node, "next").unwrap();
    }
    env.close_handle_scope(scope).unwrap();
    sum
}

#[test]
fn test_strongly_referenced_graph_survives_churn() {
    let mut env = create_test_env();
    let chain = build_chain(&mut env, 50);

    for _ in 0..10 {
        let scope = env.open_handle_scope().unwrap();
        for _ in 0..20 {
            env.create_object().unwrap();
        }
        env.close_handle_scope(scope).unwrap();
    }
    env.collect_garbage();

    assert_eq!(chain_sum(&mut env, chain), (0..50).sum::<i32>());
}

#[test]
fn test_unreferenced_graph_is_collected() {
    let mut env = create_test_env();
    let baseline = env.collect_garbage().live_objects;

    let chain = build_chain(&mut env, 20);
    env.collect_garbage();
    assert!(env.gc_stats().live_objects >= baseline + 20);

    env.delete_reference(chain).unwrap();
    let collection = env.collect_garbage();
    assert_eq!(collection.live_objects, baseline);
}

#[test]
fn test_cycles_are_collected() {
    let mut env = create_test_env();
    let count = counter();
    let baseline = env.collect_garbage().live_objects;

    let scope = env.open_handle_scope().unwrap();
    let a = env.create_object().unwrap();
    let b = env.create_object().unwrap();
    env.set_named_property(a, "peer", b).unwrap();
    env.set_named_property(b, "peer", a).unwrap();
    env.add_finalizer(a, token(1), counting_finalizer(&count), std::ptr::null_mut())
        .unwrap();
    env.close_handle_scope(scope).unwrap();

    let collection = env.collect_garbage();
    assert_eq!(collection.finalized, 1);
    assert_eq!(collection.live_objects, baseline);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_weak_references_clear_in_one_cycle() {
    let mut env = create_test_env();
    let mut weak = Vec::new();
    let scope = env.open_handle_scope().unwrap();
    for _ in 0..16 {
        let obj = env.create_object().unwrap();
        weak.push(env.create_reference(obj, 0).unwrap());
    }
    env.close_handle_scope(scope).unwrap();
    assert_eq!(env.reference_list_len(Strength::Weak), 16);

    env.collect_garbage();
    for reference in &weak {
        assert_eq!(env.get_reference_value(*reference).unwrap(), None);
    }
}

#[test]
fn test_automatic_collection_respects_roots() {
    // threshold 1 regardless of GC_THRESHOLD: every allocation collects
    let config = hermes_napi::RuntimeConfig::default().with_gc_threshold(1);
    let mut env = Env::with_config(config).unwrap();
    let scope = env.open_handle_scope().unwrap();
    let arr = env.create_array().unwrap();
    for i in 0..64u32 {
        let obj = env.create_object().unwrap();
        let n = env.create_uint32(i).unwrap();
        env.set_named_property(obj, "i", n).unwrap();
        env.set_element(arr, i, obj).unwrap();
    }
    for i in 0..64u32 {
        let obj = env.get_element(arr, i).unwrap();
        let n = env.get_named_property(obj, "i").unwrap();
        assert_eq!(env.get_value_uint32(n).unwrap(), i);
    }
    env.close_handle_scope(scope).unwrap();
    assert!(env.gc_stats().collections > 0);
}
