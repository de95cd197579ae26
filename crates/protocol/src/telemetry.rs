//! Observability hook called by the registry and the coordinator.
//!
//! Implementations live outside the core. Calls are fire-and-forget: a sink
//! must return quickly and must not block on I/O.

use crate::report::AuditorStatus;

/// One event per registry invocation, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationEvent {
    pub tool_name: String,
    pub version: Option<String>,
    /// `success`, `queued`, or the lowercase error code.
    pub status: &'static str,
    pub latency_ms: u64,
    pub request_id: String,
    pub trace_id: String,
}

/// One event per auditor slot inside a coordinator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditorEvent {
    pub auditor_name: String,
    pub status: AuditorStatus,
    pub latency_ms: u64,
    pub request_id: String,
}

pub trait ObservabilitySink: Send + Sync {
    fn record_invocation(&self, event: &InvocationEvent);

    fn record_auditor(&self, _event: &AuditorEvent) {}
}

pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn record_invocation(&self, _event: &InvocationEvent) {}
}
