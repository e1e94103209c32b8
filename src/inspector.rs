//! Debugger attachment
//!
//! The binding layer does not speak any debugger protocol. It only tracks
//! whether a debugger transport is attached, hands it the message queue the
//! host uses to run work on the engine thread, and detaches it before the
//! environment goes away.

use std::fmt;
use std::sync::Arc;

use crate::env::Env;
use crate::error::{NapiError, NapiResult};

/// Title used when `enable_debugger` is given none
pub const DEFAULT_DEBUGGER_TITLE: &str = "N-API Hermes";

/// Host-provided queue that runs tasks on the engine thread.
///
/// This is the only piece of the environment that may be shared with other
/// threads; tasks must not assume they run synchronously.
pub trait MessageQueue: Send + Sync {
    fn run_on_queue(&self, task: Box<dyn FnOnce() + Send>);
}

/// Everything a transport needs to register the runtime
#[derive(Clone)]
pub struct DebuggerSession {
    pub title: String,
    pub wait_for_debugger: bool,
    pub queue: Arc<dyn MessageQueue>,
}

impl fmt::Debug for DebuggerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebuggerSession")
            .field("title", &self.title)
            .field("wait_for_debugger", &self.wait_for_debugger)
            .finish_non_exhaustive()
    }
}

/// Connection to an external debugger front end
pub trait DebuggerTransport {
    fn enable(&mut self, session: &DebuggerSession);

    fn disable(&mut self);
}

pub(crate) struct AttachedDebugger {
    transport: Box<dyn DebuggerTransport>,
    title: String,
}

impl Env {
    /// Register the queue debugger transports use to reach the engine thread
    pub fn set_message_queue(&mut self, queue: Arc<dyn MessageQueue>) {
        self.message_queue = Some(queue);
    }

    /// Attach a debugger. Requires a message queue; an already attached
    /// debugger is detached first.
    pub fn enable_debugger(
        &mut self,
        mut transport: Box<dyn DebuggerTransport>,
        title: Option<&str>,
        wait_for_debugger: bool,
    ) -> NapiResult<()> {
        let Some(queue) = self.message_queue.clone() else {
            return Err(NapiError::InvalidArg(
                "set_message_queue must be called before enable_debugger",
            ));
        };
        self.disable_debugger();

        let session = DebuggerSession {
            title: title.unwrap_or(DEFAULT_DEBUGGER_TITLE).to_string(),
            wait_for_debugger,
            queue,
        };
        transport.enable(&session);
        tracing::info!(
            target: "hermes_napi::env",
            title = %session.title,
            wait_for_debugger,
            "debugger enabled"
        );
        self.debugger = Some(AttachedDebugger {
            transport,
            title: session.title,
        });
        Ok(())
    }

    /// Detach the debugger, if any
    pub fn disable_debugger(&mut self) {
        if let Some(mut attached) = self.debugger.take() {
            attached.transport.disable();
            tracing::info!(
                target: "hermes_napi::env",
                title = %attached.title,
                "debugger disabled"
            );
        }
    }

    pub fn is_debugger_enabled(&self) -> bool {
        self.debugger.is_some()
    }
}
