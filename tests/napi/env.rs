// Tests for environment configuration, teardown and debugger attachment

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use super::{counter, counting_finalizer, create_test_env, token};
use hermes_napi::{
    DebuggerSession, DebuggerTransport, Env, MessageQueue, RuntimeConfig, Status,
};

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_env_from_json_config() {
    let config =
        RuntimeConfig::from_json(r#"{ "name": "addon-host", "gc": { "gc_threshold": 8 } }"#)
            .unwrap();
    let env = Env::with_config(config).unwrap();
    assert_eq!(env.name(), "addon-host");
    assert_eq!(env.runtime().heap().gc_threshold(), 8);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = RuntimeConfig::default().with_max_heap_objects(0);
    let err = Env::with_config(config).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
}

#[test]
fn test_heap_limit_reports_memory_error() {
    let config = RuntimeConfig::default()
        .with_gc_threshold(0)
        .with_max_heap_objects(64);
    let mut env = Env::with_config(config).unwrap();
    let mut status = Status::Ok;
    for _ in 0..128 {
        if let Err(err) = env.create_object() {
            status = err.status();
            break;
        }
    }
    assert_eq!(status, Status::MemoryError);
}

// ═══════════════════════════════════════════════════════════════════════════
// Teardown
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_teardown_with_open_scopes_and_references() {
    let mut env = create_test_env();
    let count = counter();
    let _outer = env.open_handle_scope().unwrap();
    let _inner = env.open_escapable_handle_scope().unwrap();
    let obj = env.create_object().unwrap();
    env.wrap(obj, token(1), Some(counting_finalizer(&count)), std::ptr::null_mut())
        .unwrap();
    env.create_reference(obj, 3).unwrap();
    env.create_reference(obj, 0).unwrap();
    env.throw_error(None, "left pending").unwrap();

    env.destroy();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_finalizer_may_delete_references_during_teardown() {
    let mut env = create_test_env();
    let obj = env.create_object().unwrap();
    let reference = env.create_reference(obj, 1).unwrap();
    let result = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&result);
    env.add_finalizer(
        obj,
        token(1),
        Box::new(move |env: &mut Env, _data, _hint| {
            *sink.borrow_mut() = Some(env.delete_reference(reference).map_err(|e| e.status()));
        }),
        std::ptr::null_mut(),
    )
    .unwrap();

    drop(env);
    // references are gone before finalizers run
    assert_eq!(*result.borrow(), Some(Err(Status::InvalidArg)));
}

// ═══════════════════════════════════════════════════════════════════════════
// Debugger
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct InlineQueue;

impl MessageQueue for InlineQueue {
    fn run_on_queue(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    events: Arc<Mutex<Vec<String>>>,
}

impl DebuggerTransport for RecordingTransport {
    fn enable(&mut self, session: &DebuggerSession) {
        let events = Arc::clone(&self.events);
        let title = session.title.clone();
        let wait = session.wait_for_debugger;
        session.queue.run_on_queue(Box::new(move || {
            events.lock().unwrap().push(format!("enable {title} {wait}"));
        }));
    }

    fn disable(&mut self) {
        self.events.lock().unwrap().push("disable".to_string());
    }
}

#[test]
fn test_debugger_requires_message_queue() {
    let mut env = create_test_env();
    let err = env
        .enable_debugger(Box::new(RecordingTransport::default()), None, false)
        .unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
    assert!(!env.is_debugger_enabled());
}

#[test]
fn test_debugger_lifecycle() {
    let mut env = create_test_env();
    let transport = RecordingTransport::default();
    let events = Arc::clone(&transport.events);
    env.set_message_queue(Arc::new(InlineQueue));

    env.enable_debugger(Box::new(transport.clone()), Some("my addon"), true)
        .unwrap();
    assert!(env.is_debugger_enabled());
    env.disable_debugger();
    assert!(!env.is_debugger_enabled());

    env.enable_debugger(Box::new(transport), None, false).unwrap();
    drop(env);

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "enable my addon true",
            "disable",
            "enable N-API Hermes false",
            "disable",
        ]
    );
}
