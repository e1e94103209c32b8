//! N-API compatible native binding layer over a garbage-collected engine
//!
//! Native addons talk to the engine through an [`Env`]: they create values,
//! pin them in handle scopes, keep them alive across calls with
//! [`Reference`]s and attach native memory through externals whose
//! finalizers run exactly once.
//!
//! # Example
//!
//! ```
//! use hermes_napi::{Env, ValueType};
//!
//! let mut env = Env::new().unwrap();
//! let scope = env.open_handle_scope().unwrap();
//! let answer = env.create_int32(42).unwrap();
//! let reference = env.create_reference(answer, 1).unwrap();
//! env.close_handle_scope(scope).unwrap();
//!
//! env.collect_garbage();
//! let value = env.get_reference_value(reference).unwrap().unwrap();
//! assert_eq!(env.type_of(value).unwrap(), ValueType::Number);
//! assert_eq!(env.get_value_int32(value).unwrap(), 42);
//! env.delete_reference(reference).unwrap();
//! ```
//!
//! The C ABI lives in the `ffi` module behind the `c-api` feature.

pub mod callback;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod inspector;
pub mod prelude;
pub mod reference;
pub mod scope;
pub mod vm;

#[cfg(all(feature = "c-api", target_pointer_width = "64"))]
pub mod ffi;

pub use callback::{Callback, CallbackInfo, FunctionInfo};
pub use config::{ConfigError, GcConfig, RuntimeConfig};
pub use env::{Collection, Env, Value, ValueType};
pub use error::{NapiError, NapiResult, Status, VmError};
pub use external::{External, Finalize};
pub use inspector::{DebuggerSession, DebuggerTransport, MessageQueue};
pub use reference::{Reference, Strength};
pub use scope::{EscapableHandleScope, HandleScope};
