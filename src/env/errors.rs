//! Error objects and exceptions
//!
//! Native code throws by storing a value as the pending exception. While it
//! is pending, operations that could run engine code fail fast with
//! `PendingException`; scope and reference bookkeeping keeps working.

use super::{Env, Value};
use crate::error::{NapiError, NapiResult};
use crate::vm::{ErrorKind, JsString, JsValue, ObjectData, ObjectKind};

impl Env {
    /// Allocate an error object with `message` and an optional `code`.
    /// The result is unrooted.
    pub(crate) fn create_error_object(
        &mut self,
        kind: ErrorKind,
        message: &str,
        code: Option<JsString>,
    ) -> NapiResult<JsValue> {
        let proto = self.runtime().intrinsics().error_prototype(kind);
        let id = self.alloc(ObjectData::with_prototype(
            ObjectKind::Error(kind),
            Some(proto),
        ))?;
        let error = self.runtime_mut().object_mut(id)?;
        error.set_own("message".into(), JsValue::from(message));
        if let Some(code) = code {
            error.set_own("code".into(), JsValue::String(code));
        }
        Ok(JsValue::Object(id))
    }

    /// Throw a fresh error of `kind` and fail with `PendingException`
    pub(crate) fn raise<T>(&mut self, kind: ErrorKind, message: &str) -> NapiResult<T> {
        let error = self.create_error_object(kind, message, None)?;
        self.runtime_mut().throw(error);
        Err(NapiError::PendingException)
    }

    fn string_arg(&self, value: Value) -> NapiResult<JsString> {
        match self.resolve(value)? {
            JsValue::String(s) => Ok(s),
            _ => Err(NapiError::StringExpected),
        }
    }

    fn create_error_of(
        &mut self,
        kind: ErrorKind,
        code: Option<Value>,
        message: Value,
    ) -> NapiResult<Value> {
        let message = self.string_arg(message)?;
        let code = code.map(|code| self.string_arg(code)).transpose()?;
        let error = self.create_error_object(kind, message.as_str(), code)?;
        self.mint(error)
    }

    pub fn create_error(&mut self, code: Option<Value>, message: Value) -> NapiResult<Value> {
        self.create_error_of(ErrorKind::Error, code, message)
    }

    pub fn create_type_error(&mut self, code: Option<Value>, message: Value) -> NapiResult<Value> {
        self.create_error_of(ErrorKind::TypeError, code, message)
    }

    pub fn create_range_error(&mut self, code: Option<Value>, message: Value) -> NapiResult<Value> {
        self.create_error_of(ErrorKind::RangeError, code, message)
    }

    /// Make `error` the pending exception
    pub fn throw(&mut self, error: Value) -> NapiResult<()> {
        self.preamble()?;
        let error = self.resolve(error)?;
        self.runtime_mut().throw(error);
        Ok(())
    }

    fn throw_new(&mut self, kind: ErrorKind, code: Option<&str>, message: &str) -> NapiResult<()> {
        self.preamble()?;
        let error = self.create_error_object(kind, message, code.map(JsString::from))?;
        self.runtime_mut().throw(error);
        Ok(())
    }

    pub fn throw_error(&mut self, code: Option<&str>, message: &str) -> NapiResult<()> {
        self.throw_new(ErrorKind::Error, code, message)
    }

    pub fn throw_type_error(&mut self, code: Option<&str>, message: &str) -> NapiResult<()> {
        self.throw_new(ErrorKind::TypeError, code, message)
    }

    pub fn throw_range_error(&mut self, code: Option<&str>, message: &str) -> NapiResult<()> {
        self.throw_new(ErrorKind::RangeError, code, message)
    }

    pub fn is_error(&self, value: Value) -> NapiResult<bool> {
        Ok(match self.resolve(value)? {
            JsValue::Object(id) => matches!(self.runtime().object(id)?.kind, ObjectKind::Error(_)),
            _ => false,
        })
    }

    pub fn is_exception_pending(&self) -> bool {
        self.runtime().has_thrown()
    }

    /// Take the pending exception; `undefined` when there is none
    pub fn get_and_clear_last_exception(&mut self) -> NapiResult<Value> {
        let exception = self.runtime_mut().take_thrown().unwrap_or_default();
        self.mint(exception)
    }
}
