#![no_main]

use hermes_napi::{Env, RuntimeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 10_000 {
        return;
    }

    let Ok(mut env) = Env::with_config(RuntimeConfig::default().with_gc_threshold(1)) else {
        return;
    };
    match env.parse_json(source) {
        Ok(value) => {
            let _ = env.type_of(value);
            let _ = env.coerce_to_string(value);
        }
        // malformed input must leave a SyntaxError pending
        Err(_) => assert!(env.is_exception_pending()),
    }
});
