//! Handle scopes

use super::{Env, Value};
use crate::error::{NapiError, NapiResult};
use crate::scope::{EscapableHandleScope, HandleScope, ScopeKind};
use crate::vm::JsValue;

fn is_plain(kind: &ScopeKind) -> bool {
    matches!(kind, ScopeKind::Plain)
}

fn is_escapable(kind: &ScopeKind) -> bool {
    matches!(kind, ScopeKind::Escapable { .. })
}

impl Env {
    fn push_scope(&mut self, kind: ScopeKind) -> u64 {
        let gc_depth = self.runtime.handles_mut().push_scope();
        self.scopes.push(gc_depth, kind)
    }

    /// Pop the innermost scope record together with its GC frame
    fn pop_top_scope(&mut self) -> NapiResult<()> {
        if let Some(record) = self.scopes.pop() {
            self.runtime.handles_mut().pop_scope(record.gc_depth)?;
        }
        Ok(())
    }

    pub fn open_handle_scope(&mut self) -> NapiResult<HandleScope> {
        Ok(HandleScope::new(self.push_scope(ScopeKind::Plain)))
    }

    /// Close `scope`, releasing every handle minted inside it. Only the
    /// innermost scope can be closed; this works with an exception pending.
    pub fn close_handle_scope(&mut self, scope: HandleScope) -> NapiResult<()> {
        self.scopes.check_top(scope.id(), is_plain)?;
        self.pop_top_scope()
    }

    /// Open a scope that can hand one value back to the current scope.
    pub fn open_escapable_handle_scope(&mut self) -> NapiResult<EscapableHandleScope> {
        let slot = self.runtime.handles_mut().make_handle(JsValue::Undefined)?;
        Ok(EscapableHandleScope::new(self.push_scope(
            ScopeKind::Escapable {
                slot,
                escaped: false,
            },
        )))
    }

    /// Copy `value` into the slot reserved in the parent scope. Allowed once
    /// per scope; the returned handle outlives `scope`.
    pub fn escape_handle(&mut self, scope: EscapableHandleScope, value: Value) -> NapiResult<Value> {
        let (slot, escaped) = match self.scopes.find_mut(scope.id()).map(|record| record.kind) {
            Some(ScopeKind::Escapable { slot, escaped }) => (slot, escaped),
            Some(_) => return Err(NapiError::InvalidArg("not an escapable handle scope")),
            None => return Err(NapiError::InvalidArg("handle scope is not open")),
        };
        if escaped {
            tracing::warn!(
                target: "hermes_napi::scope",
                scope = scope.id(),
                "escape called twice"
            );
            return Err(NapiError::EscapeCalledTwice);
        }

        let value = self.resolve(value)?;
        self.runtime.handles_mut().set(slot, value)?;
        if let Some(record) = self.scopes.find_mut(scope.id()) {
            record.kind = ScopeKind::Escapable {
                slot,
                escaped: true,
            };
        }
        Ok(Value::from_handle(slot))
    }

    pub fn close_escapable_handle_scope(&mut self, scope: EscapableHandleScope) -> NapiResult<()> {
        self.scopes.check_top(scope.id(), is_escapable)?;
        self.pop_top_scope()
    }

    /// Number of scopes currently open, callback scopes included
    pub fn open_scope_count(&self) -> usize {
        self.scopes.len()
    }

    // ------------------------------------------------------------------------
    // Callback scopes
    // ------------------------------------------------------------------------

    pub(crate) fn open_callback_scope(&mut self) -> NapiResult<u64> {
        Ok(self.push_scope(ScopeKind::Callback))
    }

    /// Close a callback scope, first unwinding any scope the callback left
    /// open inside it.
    pub(crate) fn close_callback_scope(&mut self, id: u64) {
        while let Some(top) = self.scopes.top().copied() {
            if top.id == id {
                if let Err(err) = self.pop_top_scope() {
                    tracing::error!(target: "hermes_napi::scope", %err, "callback scope corrupted");
                }
                return;
            }
            tracing::warn!(
                target: "hermes_napi::scope",
                scope = top.id,
                "native callback returned with a handle scope still open"
            );
            if let Err(err) = self.pop_top_scope() {
                tracing::error!(target: "hermes_napi::scope", %err, "callback scope corrupted");
                return;
            }
        }
    }

    /// Close every open scope, innermost first (teardown)
    pub(crate) fn close_all_scopes(&mut self) {
        while !self.scopes.is_empty() {
            if self.pop_top_scope().is_err() {
                break;
            }
        }
    }
}
