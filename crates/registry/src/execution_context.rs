use docucheck_protocol::{ToolInvokeContext, ToolLimits};
use std::time::Duration;
use tokio::time::Instant;

/// What a tool receives alongside its arguments: the caller's context, the
/// limits it runs under, and the absolute deadline of the call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub invoke: ToolInvokeContext,
    pub limits: ToolLimits,
    deadline: Instant,
}

impl ExecutionContext {
    pub fn new(invoke: ToolInvokeContext, limits: ToolLimits) -> Self {
        let deadline = Instant::now() + limits.timeout();
        Self::with_deadline(invoke, limits, deadline)
    }

    pub fn with_deadline(invoke: ToolInvokeContext, limits: ToolLimits, deadline: Instant) -> Self {
        Self {
            invoke,
            limits,
            deadline,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn request_id(&self) -> &str {
        &self.invoke.request_id
    }
}
