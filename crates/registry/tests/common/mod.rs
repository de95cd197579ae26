#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use docucheck_protocol::{ToolError, ToolLimits, ToolSpec};
use docucheck_registry::{ExecutionContext, Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Echoes its input and counts how often it ran.
#[derive(Default)]
pub struct CountingTool {
    pub calls: AtomicUsize,
}

impl CountingTool {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, ctx: ExecutionContext, arguments: Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::Completed(json!({
            "echo": arguments,
            "request_id": ctx.request_id(),
            "user_id": ctx.invoke.user_id,
        })))
    }
}

/// Requires a `message` string.
pub struct StrictTool;

#[async_trait]
impl Tool for StrictTool {
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"],
            "additionalProperties": false
        })
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        match arguments["message"].as_str() {
            Some(m) if m.trim().is_empty() => Err(ToolError::validation("message must not be blank")),
            _ => Ok(()),
        }
    }

    async fn execute(&self, _ctx: ExecutionContext, arguments: Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::Completed(arguments))
    }
}

/// Sleeps for `delay`, then marks itself finished.
pub struct SlowTool {
    pub delay: Duration,
    pub finished: Arc<AtomicBool>,
}

#[async_trait]
impl Tool for SlowTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _ctx: ExecutionContext, _arguments: Value) -> Result<ToolResult, ToolError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(ToolResult::Completed(json!({"done": true})))
    }
}

pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _ctx: ExecutionContext, _arguments: Value) -> Result<ToolResult, ToolError> {
        panic!("renderer state corrupted");
    }
}

/// Panics while checking its arguments; counts executions.
#[derive(Default)]
pub struct PanickyValidateTool {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Tool for PanickyValidateTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn validate(&self, _arguments: &Value) -> Result<(), ToolError> {
        panic!("rule table not loaded");
    }

    async fn execute(&self, _ctx: ExecutionContext, _arguments: Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::Completed(json!({})))
    }
}

/// Returns whatever error it was built with.
pub struct FailingTool(pub ToolError);

#[async_trait]
impl Tool for FailingTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _ctx: ExecutionContext, _arguments: Value) -> Result<ToolResult, ToolError> {
        Err(self.0.clone())
    }
}

pub struct QueueingTool;

#[async_trait]
impl Tool for QueueingTool {
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, ctx: ExecutionContext, _arguments: Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::Queued(json!({"job_id": ctx.request_id()})))
    }
}

pub fn spec(name: &str, version: &str) -> ToolSpec {
    ToolSpec::new(name, version, format!("{name} test tool"))
}

pub fn spec_with_limits(name: &str, max_payload_kb: u64, timeout_seconds: u64) -> ToolSpec {
    spec(name, "1.0.0").with_limits(ToolLimits {
        max_payload_kb,
        max_attachment_mb: 1,
        timeout_seconds,
    })
}
