//! Primitive values, type inspection and conversions

use std::ffi::c_void;

use super::Env;
use crate::external::{External, Finalize};
use crate::error::{NapiError, NapiResult};
use crate::vm::{ErrorKind, Handle, JsString, JsValue, ObjectData, ObjectKind};

/// Handle to an engine value, valid until its handle scope closes.
///
/// A `Value` is a plain index into the handle stack. Using one after its
/// scope was closed fails with `InvalidArg` instead of reading another value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(Handle);

impl Value {
    pub(crate) fn from_handle(handle: Handle) -> Self {
        Value(handle)
    }

    pub(crate) fn handle(self) -> Handle {
        self.0
    }

    /// Packed 64-bit form used by the C ABI. Never 0.
    pub fn into_raw(self) -> u64 {
        self.0.to_bits()
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        Handle::from_bits(raw).map(Value)
    }
}

/// Result of `type_of`. Discriminants are part of the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Symbol,
    Object,
    Function,
    External,
}

/// ToInt32: modulo 2^32, non-finite values become 0
fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

impl Env {
    // ------------------------------------------------------------------------
    // Singletons and primitives
    // ------------------------------------------------------------------------

    pub fn get_undefined(&mut self) -> NapiResult<Value> {
        self.mint(JsValue::Undefined)
    }

    pub fn get_null(&mut self) -> NapiResult<Value> {
        self.mint(JsValue::Null)
    }

    pub fn get_global(&mut self) -> NapiResult<Value> {
        let global = self.runtime().global();
        self.mint(JsValue::Object(global))
    }

    pub fn get_boolean(&mut self, value: bool) -> NapiResult<Value> {
        self.mint(JsValue::Boolean(value))
    }

    pub fn create_double(&mut self, value: f64) -> NapiResult<Value> {
        self.mint(JsValue::Number(value))
    }

    pub fn create_int32(&mut self, value: i32) -> NapiResult<Value> {
        self.mint(JsValue::Number(f64::from(value)))
    }

    pub fn create_uint32(&mut self, value: u32) -> NapiResult<Value> {
        self.mint(JsValue::Number(f64::from(value)))
    }

    pub fn create_int64(&mut self, value: i64) -> NapiResult<Value> {
        self.mint(JsValue::Number(value as f64))
    }

    pub fn create_string_utf8(&mut self, value: &str) -> NapiResult<Value> {
        self.preamble()?;
        self.mint(JsValue::String(JsString::from(value)))
    }

    /// Create a unique symbol. The description, if given, must be a string.
    pub fn create_symbol(&mut self, description: Option<Value>) -> NapiResult<Value> {
        let description = match description {
            Some(value) => match self.resolve(value)? {
                JsValue::String(s) => Some(s),
                _ => return Err(NapiError::StringExpected),
            },
            None => None,
        };
        let symbol = self.runtime_mut().new_symbol(description);
        self.mint(JsValue::Symbol(symbol))
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn type_of(&self, value: Value) -> NapiResult<ValueType> {
        Ok(match self.resolve(value)? {
            JsValue::Undefined => ValueType::Undefined,
            JsValue::Null => ValueType::Null,
            JsValue::Boolean(_) => ValueType::Boolean,
            JsValue::Number(_) => ValueType::Number,
            JsValue::String(_) => ValueType::String,
            JsValue::Symbol(_) => ValueType::Symbol,
            JsValue::Object(id) => match &self.runtime().object(id)?.kind {
                ObjectKind::Function(_) => ValueType::Function,
                ObjectKind::Host(host) if host.as_any().is::<External>() => ValueType::External,
                _ => ValueType::Object,
            },
        })
    }

    pub fn get_value_double(&self, value: Value) -> NapiResult<f64> {
        match self.resolve(value)? {
            JsValue::Number(n) => Ok(n),
            _ => Err(NapiError::NumberExpected),
        }
    }

    pub fn get_value_int32(&self, value: Value) -> NapiResult<i32> {
        self.get_value_double(value).map(to_int32)
    }

    pub fn get_value_uint32(&self, value: Value) -> NapiResult<u32> {
        self.get_value_double(value).map(|n| to_int32(n) as u32)
    }

    /// Saturating conversion; NaN and infinities map to 0
    pub fn get_value_int64(&self, value: Value) -> NapiResult<i64> {
        self.get_value_double(value)
            .map(|n| if n.is_finite() { n as i64 } else { 0 })
    }

    pub fn get_value_bool(&self, value: Value) -> NapiResult<bool> {
        match self.resolve(value)? {
            JsValue::Boolean(b) => Ok(b),
            _ => Err(NapiError::BooleanExpected),
        }
    }

    pub fn get_value_string_utf8(&self, value: Value) -> NapiResult<String> {
        match self.resolve(value)? {
            JsValue::String(s) => Ok(s.as_str().to_owned()),
            _ => Err(NapiError::StringExpected),
        }
    }

    pub fn strict_equals(&self, lhs: Value, rhs: Value) -> NapiResult<bool> {
        Ok(self.resolve(lhs)?.strict_equals(&self.resolve(rhs)?))
    }

    // ------------------------------------------------------------------------
    // Coercion
    // ------------------------------------------------------------------------

    pub fn coerce_to_bool(&mut self, value: Value) -> NapiResult<Value> {
        let b = self.resolve(value)?.to_boolean();
        self.mint(JsValue::Boolean(b))
    }

    pub fn coerce_to_number(&mut self, value: Value) -> NapiResult<Value> {
        self.preamble()?;
        let value = self.resolve(value)?;
        if matches!(value, JsValue::Symbol(_)) {
            return self.raise(ErrorKind::TypeError, "Cannot convert a Symbol value to a number");
        }
        let n = self.runtime().to_number(&value)?;
        self.mint(JsValue::Number(n))
    }

    pub fn coerce_to_string(&mut self, value: Value) -> NapiResult<Value> {
        self.preamble()?;
        let value = self.resolve(value)?;
        if matches!(value, JsValue::Symbol(_)) {
            return self.raise(ErrorKind::TypeError, "Cannot convert a Symbol value to a string");
        }
        let s = self.runtime().to_string(&value)?;
        self.mint(JsValue::String(s))
    }

    // ------------------------------------------------------------------------
    // Externals
    // ------------------------------------------------------------------------

    /// Wrap a native pointer in an External. `finalize` runs exactly once,
    /// when the External is collected or the environment is destroyed.
    pub fn create_external(
        &mut self,
        data: *mut c_void,
        finalize: Option<Finalize>,
        hint: *mut c_void,
    ) -> NapiResult<Value> {
        self.preamble()?;
        let external = External::new(data, finalize, hint);
        self.alloc_value(ObjectData::new(ObjectKind::Host(Box::new(external))))
    }

    pub fn get_value_external(&self, value: Value) -> NapiResult<*mut c_void> {
        let id = self
            .resolve(value)?
            .as_object()
            .ok_or(NapiError::InvalidArg("value is not an external"))?;
        match &self.runtime().object(id)?.kind {
            ObjectKind::Host(host) => host
                .as_any()
                .downcast_ref::<External>()
                .map(External::data)
                .ok_or(NapiError::InvalidArg("value is not an external")),
            _ => Err(NapiError::InvalidArg("value is not an external")),
        }
    }
}
