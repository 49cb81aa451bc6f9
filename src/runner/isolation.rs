//! Where the run protocol executes.
//!
//! A dedicated thread isolates only thread-scoped state (thread locals). Process-wide statics are shared
//! with every other behavior regardless of the isolation mode.

use std::thread;

use specula_core::Specification;
use specula_core::expect::payload_message;

use super::outcome::{ExecutionError, Outcome};

const ISOLATED_THREAD_NAME: &str = "specula-isolated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isolation {
    /// Run on the calling thread.
    #[default]
    CurrentThread,
    /// Run on a fresh thread created for this one behavior; the caller blocks until it finishes.
    DedicatedThread,
}

impl Isolation {
    /// The mode a freshly constructed specification asks for.
    pub fn for_spec(spec: &dyn Specification) -> Self {
        if spec.needs_thread_isolation() {
            Isolation::DedicatedThread
        } else {
            Isolation::CurrentThread
        }
    }

    /// Execute `protocol` in this mode. There is no timeout: a hung behavior hangs the run.
    pub fn run<F>(self, protocol: F) -> Outcome
    where
        F: FnOnce() -> Outcome + Send,
    {
        match self {
            Isolation::CurrentThread => protocol(),
            Isolation::DedicatedThread => thread::scope(|scope| {
                let spawned = thread::Builder::new()
                    .name(ISOLATED_THREAD_NAME.to_string())
                    .spawn_scoped(scope, protocol);
                let handle = match spawned {
                    Ok(handle) => handle,
                    Err(source) => return Outcome::Error(ExecutionError::Isolation { source }),
                };
                match handle.join() {
                    Ok(outcome) => outcome,
                    Err(payload) => Outcome::Error(ExecutionError::Panicked {
                        message: payload_message(payload.as_ref())
                            .unwrap_or_else(|| "isolated thread panicked".to_string()),
                    }),
                }
            }),
        }
    }
}
