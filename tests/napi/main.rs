//! Integration tests for the binding layer, organized by feature
//!
//! These tests drive the environment through the public API only.
//!
//! ## Aggressive Test Defaults
//!
//! - `GC_THRESHOLD=1` - collect on every allocation to shake out rooting bugs
//!
//! Override via environment variables:
//!
//! ```bash
//! cargo test                           # Default: aggressive settings
//! GC_THRESHOLD=100 cargo test          # Less aggressive GC for faster runs
//! GC_THRESHOLD=0 cargo test            # Only explicit collections
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod env;
mod exception;
mod external;
mod function;
mod gc;
mod json;
mod reference;
mod wrap;

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::rc::Rc;

use hermes_napi::{Env, Finalize, RuntimeConfig};

/// Create an environment with aggressive defaults for testing:
/// - GC_THRESHOLD=1 (collect on every allocation)
pub fn create_test_env() -> Env {
    let gc_threshold = std::env::var("GC_THRESHOLD")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1);
    Env::with_config(RuntimeConfig::default().with_gc_threshold(gc_threshold)).unwrap()
}

/// Shared counter bumped by test finalizers
pub fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

/// Finalizer that bumps `count`
pub fn counting_finalizer(count: &Rc<Cell<usize>>) -> Finalize {
    let count = Rc::clone(count);
    Box::new(move |_env: &mut Env, _data, _hint| count.set(count.get() + 1))
}

/// Finalizer that records the data pointer it was called with
pub fn recording_finalizer(seen: &Rc<RefCell<Vec<usize>>>) -> Finalize {
    let seen = Rc::clone(seen);
    Box::new(move |_env: &mut Env, data: *mut c_void, _hint| {
        seen.borrow_mut().push(data as usize)
    })
}

/// Opaque non-null pointer for tests that never dereference it
pub fn token(n: usize) -> *mut c_void {
    n as *mut c_void
}
