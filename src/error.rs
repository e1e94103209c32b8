//! Error types for the binding layer and the engine core

use thiserror::Error;

use crate::config::ConfigError;

/// Status code returned by every N-API entry point.
///
/// Discriminants are part of the C ABI and must not be reordered.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    InvalidArg,
    ObjectExpected,
    StringExpected,
    NameExpected,
    FunctionExpected,
    NumberExpected,
    BooleanExpected,
    ArrayExpected,
    GenericFailure,
    PendingException,
    Cancelled,
    EscapeCalledTwice,
    HandleScopeMismatch,
    CallbackScopeMismatch,
    QueueFull,
    Closing,
    BigintExpected,
    DateExpected,
    ArrayBufferExpected,
    DetachableArrayBufferExpected,
    WouldDeadlock,
    MemoryError,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl<T> From<&NapiResult<T>> for Status {
    fn from(result: &NapiResult<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => err.status(),
        }
    }
}

/// Errors raised by the engine core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The handle's scope was closed or its slot was reused
    #[error("stale handle")]
    StaleHandle,

    /// The object id no longer names a live heap object
    #[error("object has been collected")]
    DeadObject,

    /// A GC scope was popped out of order
    #[error("scope closed out of order")]
    ScopeMismatch,

    #[error("heap exhausted ({limit} objects)")]
    HeapExhausted { limit: usize },

    #[error("too many live handles")]
    HandleOverflow,

    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),

    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Errors returned by the binding layer.
///
/// Each variant maps onto exactly one `Status`; the payloads only carry
/// diagnostics for Rust callers.
#[derive(Debug, Error)]
pub enum NapiError {
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),

    #[error("object expected")]
    ObjectExpected,

    #[error("string expected")]
    StringExpected,

    #[error("string, number or symbol expected as property name")]
    NameExpected,

    #[error("function expected")]
    FunctionExpected,

    #[error("number expected")]
    NumberExpected,

    #[error("boolean expected")]
    BooleanExpected,

    #[error("array expected")]
    ArrayExpected,

    #[error("{0}")]
    GenericFailure(String),

    /// A JavaScript exception is pending; fetch it with
    /// `get_and_clear_last_exception`
    #[error("exception pending")]
    PendingException,

    #[error("escape called twice on the same scope")]
    EscapeCalledTwice,

    #[error("handle scope closed out of order")]
    HandleScopeMismatch,

    #[error("callback scope mismatch")]
    CallbackScopeMismatch,

    #[error("out of memory")]
    MemoryError,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Vm(#[from] VmError),
}

impl NapiError {
    pub fn generic(message: impl Into<String>) -> Self {
        NapiError::GenericFailure(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            NapiError::InvalidArg(_) => Status::InvalidArg,
            NapiError::ObjectExpected => Status::ObjectExpected,
            NapiError::StringExpected => Status::StringExpected,
            NapiError::NameExpected => Status::NameExpected,
            NapiError::FunctionExpected => Status::FunctionExpected,
            NapiError::NumberExpected => Status::NumberExpected,
            NapiError::BooleanExpected => Status::BooleanExpected,
            NapiError::ArrayExpected => Status::ArrayExpected,
            NapiError::GenericFailure(_) => Status::GenericFailure,
            NapiError::PendingException => Status::PendingException,
            NapiError::EscapeCalledTwice => Status::EscapeCalledTwice,
            NapiError::HandleScopeMismatch => Status::HandleScopeMismatch,
            NapiError::CallbackScopeMismatch => Status::CallbackScopeMismatch,
            NapiError::MemoryError => Status::MemoryError,
            NapiError::Config(_) => Status::InvalidArg,
            NapiError::Vm(err) => match err {
                VmError::StaleHandle | VmError::DeadObject => Status::InvalidArg,
                VmError::ScopeMismatch => Status::HandleScopeMismatch,
                VmError::HeapExhausted { .. } | VmError::HandleOverflow => Status::MemoryError,
                VmError::InvalidConfig(_) | VmError::Internal(_) => Status::GenericFailure,
            },
        }
    }
}

pub type NapiResult<T> = Result<T, NapiError>;
