//! Observability sinks: structured logs, metrics, fan-out, and an in-memory
//! recorder for tests and diagnostics.

use docucheck_protocol::{AuditorEvent, InvocationEvent, ObservabilitySink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

pub const TOOL_INVOCATIONS_TOTAL: &str = "tool_invocations_total";
pub const TOOL_INVOCATION_LATENCY_MS: &str = "tool_invocation_latency_ms";
pub const AUDITOR_RUNS_TOTAL: &str = "auditor_runs_total";
pub const AUDITOR_LATENCY_MS: &str = "auditor_latency_ms";

/// Writes one structured log line per event.
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record_invocation(&self, event: &InvocationEvent) {
        info!(
            target: "docucheck::telemetry",
            tool = %event.tool_name,
            version = event.version.as_deref().unwrap_or("-"),
            status = event.status,
            latency_ms = event.latency_ms,
            request_id = %event.request_id,
            trace_id = %event.trace_id,
            "invocation"
        );
    }

    fn record_auditor(&self, event: &AuditorEvent) {
        debug!(
            target: "docucheck::telemetry",
            auditor = %event.auditor_name,
            status = event.status.as_str(),
            latency_ms = event.latency_ms,
            request_id = %event.request_id,
            "auditor"
        );
    }
}

/// Feeds the `metrics` facade. Without an installed recorder this is a no-op.
pub struct MetricsSink;

impl ObservabilitySink for MetricsSink {
    fn record_invocation(&self, event: &InvocationEvent) {
        metrics::counter!(
            TOOL_INVOCATIONS_TOTAL,
            1,
            "tool" => event.tool_name.clone(),
            "status" => event.status
        );
        metrics::histogram!(
            TOOL_INVOCATION_LATENCY_MS,
            event.latency_ms as f64,
            "tool" => event.tool_name.clone()
        );
    }

    fn record_auditor(&self, event: &AuditorEvent) {
        metrics::counter!(
            AUDITOR_RUNS_TOTAL,
            1,
            "auditor" => event.auditor_name.clone(),
            "status" => event.status.as_str()
        );
        metrics::histogram!(
            AUDITOR_LATENCY_MS,
            event.latency_ms as f64,
            "auditor" => event.auditor_name.clone()
        );
    }
}

/// Forwards every event to each inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ObservabilitySink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn ObservabilitySink>>) -> Self {
        Self { sinks }
    }
}

impl ObservabilitySink for FanoutSink {
    fn record_invocation(&self, event: &InvocationEvent) {
        for sink in &self.sinks {
            sink.record_invocation(event);
        }
    }

    fn record_auditor(&self, event: &AuditorEvent) {
        for sink in &self.sinks {
            sink.record_auditor(event);
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    invocations: Mutex<Vec<InvocationEvent>>,
    auditors: Mutex<Vec<AuditorEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> Vec<InvocationEvent> {
        self.invocations.lock().clone()
    }

    pub fn auditors(&self) -> Vec<AuditorEvent> {
        self.auditors.lock().clone()
    }
}

impl ObservabilitySink for RecordingSink {
    fn record_invocation(&self, event: &InvocationEvent) {
        self.invocations.lock().push(event.clone());
    }

    fn record_auditor(&self, event: &AuditorEvent) {
        self.auditors.lock().push(event.clone());
    }
}
