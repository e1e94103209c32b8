#![no_main]

use hermes_napi::{Env, EscapableHandleScope, HandleScope, Reference, RuntimeConfig, Value};
use libfuzzer_sys::fuzz_target;

/// Interpret each byte as one scope, reference or allocation operation.
/// Any sequence must leave the environment consistent: errors are fine,
/// panics and use of freed values are not.
fuzz_target!(|data: &[u8]| {
    if data.len() > 4_096 {
        return;
    }
    let Ok(mut env) = Env::with_config(RuntimeConfig::default().with_gc_threshold(4)) else {
        return;
    };

    let mut values: Vec<Value> = Vec::new();
    let mut scopes: Vec<HandleScope> = Vec::new();
    let mut escapable: Vec<EscapableHandleScope> = Vec::new();
    let mut references: Vec<Reference> = Vec::new();

    for (i, byte) in data.iter().enumerate() {
        let pick = |len: usize| if len == 0 { None } else { Some(i % len) };
        match byte % 12 {
            0 => {
                if let Ok(v) = env.create_object() {
                    values.push(v);
                }
            }
            1 => {
                if let Ok(v) = env.create_int32(i32::from(*byte)) {
                    values.push(v);
                }
            }
            2 => {
                if let Ok(scope) = env.open_handle_scope() {
                    scopes.push(scope);
                }
            }
            3 => {
                if let Some(idx) = pick(scopes.len()) {
                    let _ = env.close_handle_scope(scopes[idx]);
                }
            }
            4 => {
                if let Ok(scope) = env.open_escapable_handle_scope() {
                    escapable.push(scope);
                }
            }
            5 => {
                if let (Some(s), Some(v)) = (pick(escapable.len()), pick(values.len())) {
                    if let Ok(v) = env.escape_handle(escapable[s], values[v]) {
                        values.push(v);
                    }
                }
            }
            6 => {
                if let Some(idx) = pick(escapable.len()) {
                    let _ = env.close_escapable_handle_scope(escapable[idx]);
                }
            }
            7 => {
                if let Some(idx) = pick(values.len()) {
                    if let Ok(r) = env.create_reference(values[idx], u32::from(byte & 1)) {
                        references.push(r);
                    }
                }
            }
            8 => {
                if let Some(idx) = pick(references.len()) {
                    let _ = env.reference_ref(references[idx]);
                    let _ = env.reference_unref(references[idx]);
                    let _ = env.reference_unref(references[idx]);
                }
            }
            9 => {
                if let Some(idx) = pick(references.len()) {
                    if let Ok(Some(v)) = env.get_reference_value(references[idx]) {
                        values.push(v);
                    }
                }
            }
            10 => {
                if let (Some(a), Some(b)) = (pick(values.len()), pick(values.len())) {
                    let _ = env.set_named_property(values[a], "p", values[b]);
                    let _ = env.type_of(values[b]);
                }
            }
            _ => {
                if let Some(idx) = pick(references.len()) {
                    let _ = env.delete_reference(references[idx]);
                }
                env.collect_garbage();
            }
        }
    }
});
