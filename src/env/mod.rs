//! The N-API environment
//!
//! An `Env` owns one engine runtime together with everything the binding
//! layer tracks on top of it: the stack of open handle scopes, the reference
//! registry and the attached debugger. It is the only entry point for native
//! code; every operation takes `&mut Env` and runs synchronously on the
//! engine thread.
//!
//! # Rooting
//!
//! Values handed out to native code are `Value` handles pinned in the
//! current handle scope. A collection can only happen inside an allocation
//! (or an explicit `collect_garbage`), and it sees every handle slot, every
//! strong reference and the pending exception as roots. Weak references are
//! cleared when their target dies.
//!
//! Handles minted while no handle scope is open land in the base frame,
//! which is only released at teardown. Top-level code that creates many
//! values (or reads a reference in a loop) should open a scope around the
//! work so those slots are dropped when it closes.
//!
//! # Finalizers
//!
//! External finalizers never run inside the collector. The collector hands
//! dead externals back to the environment, which runs their finalizers with
//! full `&mut Env` access once marking and sweeping are over.

mod errors;
mod functions;
mod handles;
mod json;
mod objects;
mod references;
mod values;
mod wrap;

use std::sync::Arc;

pub use values::{Value, ValueType};

use crate::config::RuntimeConfig;
use crate::error::{NapiError, NapiResult};
use crate::external::External;
use crate::inspector::{AttachedDebugger, MessageQueue};
use crate::reference::ReferenceTable;
use crate::scope::ScopeStack;
use crate::vm::{GcStats, HostObject, JsValue, ObjectData, ObjectId, Runtime};

/// Summary of one `collect_garbage` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collection {
    /// Objects swept
    pub collected: usize,
    /// Weak references whose target died in this cycle
    pub weak_roots_cleared: usize,
    /// Objects alive after the sweep
    pub live_objects: usize,
    /// External finalizers run for the swept objects
    pub finalized: usize,
}

pub struct Env {
    runtime: Runtime,
    references: ReferenceTable,
    scopes: ScopeStack,
    pub(crate) debugger: Option<AttachedDebugger>,
    pub(crate) message_queue: Option<Arc<dyn MessageQueue>>,
    instance_data: Option<External>,
    name: String,
    /// Set while a collection or teardown is running finalizers
    collecting: bool,
    torn_down: bool,
}

impl Env {
    /// Create an environment with the default configuration
    pub fn new() -> NapiResult<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> NapiResult<Self> {
        config.validate()?;
        let runtime = Runtime::new(&config)?;
        tracing::info!(
            target: "hermes_napi::env",
            name = %config.name,
            gc_threshold = config.gc.gc_threshold,
            max_heap_objects = config.gc.max_heap_objects,
            "environment created"
        );
        Ok(Self {
            runtime,
            references: ReferenceTable::new(),
            scopes: ScopeStack::new(),
            debugger: None,
            message_queue: None,
            instance_data: None,
            name: config.name,
            collecting: false,
            torn_down: false,
        })
    }

    /// Tear the environment down now. Equivalent to dropping it.
    pub fn destroy(mut self) {
        self.teardown();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    // ------------------------------------------------------------------------
    // Handle plumbing shared by the operation modules
    // ------------------------------------------------------------------------

    /// Root a value in the innermost handle scope
    pub(crate) fn mint(&mut self, value: JsValue) -> NapiResult<Value> {
        Ok(Value::from_handle(
            self.runtime.handles_mut().make_handle(value)?,
        ))
    }

    /// Read the value behind a handle; stale handles are `InvalidArg`
    pub(crate) fn resolve(&self, value: Value) -> NapiResult<JsValue> {
        self.runtime
            .handles()
            .get(value.handle())
            .cloned()
            .ok_or(NapiError::InvalidArg("value handle is stale"))
    }

    pub(crate) fn resolve_object(&self, value: Value) -> NapiResult<ObjectId> {
        let id = self
            .resolve(value)?
            .as_object()
            .ok_or(NapiError::ObjectExpected)?;
        if !self.runtime.heap().is_live(id) {
            return Err(NapiError::ObjectExpected);
        }
        Ok(id)
    }

    /// Fail with `PendingException` if an exception is waiting to be caught
    pub(crate) fn preamble(&self) -> NapiResult<()> {
        if self.runtime.has_thrown() {
            return Err(NapiError::PendingException);
        }
        Ok(())
    }

    /// Allocate a heap object, collecting first when the threshold is hit.
    ///
    /// The id is unrooted: mint it before the next allocation.
    pub(crate) fn alloc(&mut self, data: ObjectData) -> NapiResult<ObjectId> {
        if !self.collecting && self.runtime.should_collect() {
            self.collect_garbage();
        }
        Ok(self.runtime.alloc(data)?)
    }

    pub(crate) fn alloc_value(&mut self, data: ObjectData) -> NapiResult<Value> {
        let id = self.alloc(data)?;
        self.mint(JsValue::Object(id))
    }

    // ------------------------------------------------------------------------
    // Garbage collection
    // ------------------------------------------------------------------------

    /// Run a full collection, then the finalizers of every External that
    /// died in it.
    pub fn collect_garbage(&mut self) -> Collection {
        if self.collecting {
            return Collection::default();
        }
        self.collecting = true;
        let (stats, dead) = self.runtime.collect(&self.references);
        let finalized = self.finalize_hosts(dead);
        self.collecting = false;

        tracing::debug!(
            target: "hermes_napi::gc",
            collected = stats.collected,
            weak_cleared = stats.weak_roots_cleared,
            live = stats.live_objects,
            finalized,
            "collection finished"
        );
        Collection {
            collected: stats.collected,
            weak_roots_cleared: stats.weak_roots_cleared,
            live_objects: stats.live_objects,
            finalized,
        }
    }

    pub fn gc_stats(&self) -> GcStats {
        self.runtime.heap().stats()
    }

    /// Run the finalizer of every External among `hosts`
    fn finalize_hosts(&mut self, hosts: Vec<Box<dyn HostObject>>) -> usize {
        let mut finalized = 0;
        for host in hosts {
            if let Ok(external) = host.into_any().downcast::<External>() {
                external.finalize(self);
                finalized += 1;
            }
        }
        finalized
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.collecting = true;

        self.disable_debugger();
        self.close_all_scopes();
        let references = self.references.total();
        self.references.clear();

        let mut finalized = self.drain_externals();
        if let Some(instance_data) = self.instance_data.take() {
            instance_data.finalize(self);
            finalized += self.drain_externals();
        }

        tracing::info!(
            target: "hermes_napi::env",
            name = %self.name,
            references,
            finalized,
            "environment destroyed"
        );
    }

    /// Finalize every External still on the heap, including ones created by
    /// finalizers while draining.
    fn drain_externals(&mut self) -> usize {
        let mut finalized = 0;
        loop {
            let hosts = self.runtime.drain_host_objects();
            if hosts.is_empty() {
                return finalized;
            }
            finalized += self.finalize_hosts(hosts);
        }
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("name", &self.name)
            .field("open_scopes", &self.scopes.len())
            .field("references", &self.references.total())
            .field("debugger", &self.debugger.is_some())
            .finish_non_exhaustive()
    }
}
