//! JSON parsing into engine values

use serde_json::Value as Json;

use super::{Env, Value};
use crate::error::NapiResult;
use crate::vm::{ErrorKind, JsString, JsValue};

impl Env {
    /// Parse a UTF-8 JSON document into engine values.
    ///
    /// Malformed input throws a `SyntaxError` and fails with
    /// `PendingException`.
    pub fn parse_json(&mut self, source: &str) -> NapiResult<Value> {
        self.preamble()?;
        let document: Json = match serde_json::from_str(source) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!(target: "hermes_napi::env", %err, "JSON parse failed");
                return self.raise(ErrorKind::SyntaxError, &err.to_string());
            }
        };

        let scope = self.open_escapable_handle_scope()?;
        let result = self
            .json_to_value(&document)
            .and_then(|value| self.escape_handle(scope, value));
        self.close_escapable_handle_scope(scope)?;
        result
    }

    /// Every intermediate object is minted in the current scope, so it stays
    /// rooted while its children are allocated.
    fn json_to_value(&mut self, json: &Json) -> NapiResult<Value> {
        match json {
            Json::Null => self.get_null(),
            Json::Bool(b) => self.get_boolean(*b),
            Json::Number(n) => self.create_double(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => self.mint(JsValue::String(JsString::from(s.as_str()))),
            Json::Array(items) => {
                let array = self.create_array()?;
                for (index, item) in (0u32..).zip(items) {
                    let element = self.json_to_value(item)?;
                    self.set_element(array, index, element)?;
                }
                Ok(array)
            }
            Json::Object(members) => {
                let object = self.create_object()?;
                for (name, member) in members {
                    let value = self.json_to_value(member)?;
                    self.set_named_property(object, name, value)?;
                }
                Ok(object)
            }
        }
    }
}
