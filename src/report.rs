//! Observability sink
//!
//! Callers can attach a [`Reporter`] to receive every call attempt with its
//! original parameters. Errors are not reported separately; they surface to
//! the caller at settlement.

use serde_json::Value;

/// Receives call attempts and stage progress from the client
pub trait Reporter: Send + Sync {
    /// Reports an event with an optional tag and structured payload
    fn report(&self, message: &str, tag: Option<&str>, payload: Option<&Value>);
}

/// Reporter that discards everything; used when no sink is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _message: &str, _tag: Option<&str>, _payload: Option<&Value>) {}
}
