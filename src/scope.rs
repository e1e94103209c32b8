//! Handle scope bookkeeping
//!
//! `ScopeStack` mirrors the runtime's GC-scope frames with one record per
//! open scope. Records are identified by a monotonically increasing id, so a
//! closed scope can never be confused with one opened later.

use crate::error::{NapiError, NapiResult};
use crate::vm::Handle;

/// A plain handle scope opened with `Env::open_handle_scope`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleScope {
    id: u64,
}

/// A handle scope that can promote one value to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EscapableHandleScope {
    id: u64,
}

macro_rules! scope_id_conversions {
    ($ty:ident) => {
        impl $ty {
            pub(crate) fn new(id: u64) -> Self {
                Self { id }
            }

            pub(crate) fn id(self) -> u64 {
                self.id
            }

            /// Opaque non-zero form passed across the C boundary
            pub fn into_raw(self) -> u64 {
                self.id
            }

            pub fn from_raw(raw: u64) -> Option<Self> {
                (raw != 0).then_some(Self { id: raw })
            }
        }
    };
}

scope_id_conversions!(HandleScope);
scope_id_conversions!(EscapableHandleScope);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Plain,
    Escapable {
        /// Slot reserved in the parent frame
        slot: Handle,
        escaped: bool,
    },
    /// Opened around a native callback invocation
    Callback,
}

impl ScopeKind {
    fn describe(&self) -> &'static str {
        match self {
            ScopeKind::Plain => "handle scope",
            ScopeKind::Escapable { .. } => "escapable handle scope",
            ScopeKind::Callback => "callback scope",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScopeRecord {
    pub id: u64,
    /// Frame depth on the runtime handle stack
    pub gc_depth: usize,
    pub kind: ScopeKind,
}

#[derive(Debug)]
pub(crate) struct ScopeStack {
    records: Vec<ScopeRecord>,
    next_id: u64,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn push(&mut self, gc_depth: usize, kind: ScopeKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(ScopeRecord { id, gc_depth, kind });
        id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top(&self) -> Option<&ScopeRecord> {
        self.records.last()
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut ScopeRecord> {
        self.records.iter_mut().rev().find(|record| record.id == id)
    }

    /// Check that `id` names the innermost open scope and has the expected
    /// kind. Unknown ids and kind mismatches are `InvalidArg`; a known scope
    /// that is not innermost is `HandleScopeMismatch`.
    pub fn check_top(&self, id: u64, expected: fn(&ScopeKind) -> bool) -> NapiResult<&ScopeRecord> {
        let Some(position) = self.records.iter().rposition(|record| record.id == id) else {
            return Err(NapiError::InvalidArg("handle scope is not open"));
        };
        let record = self
            .records
            .get(position)
            .ok_or(NapiError::InvalidArg("handle scope is not open"))?;
        if !expected(&record.kind) {
            tracing::warn!(
                target: "hermes_napi::scope",
                scope = id,
                kind = record.kind.describe(),
                "scope closed through the wrong entry point"
            );
            return Err(NapiError::InvalidArg("wrong handle scope kind"));
        }
        if position + 1 != self.records.len() {
            tracing::warn!(
                target: "hermes_napi::scope",
                scope = id,
                open = self.records.len(),
                "handle scope closed out of order"
            );
            return Err(NapiError::HandleScopeMismatch);
        }
        Ok(record)
    }

    pub fn pop(&mut self) -> Option<ScopeRecord> {
        self.records.pop()
    }
}
