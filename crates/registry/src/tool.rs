use crate::execution_context::ExecutionContext;
use async_trait::async_trait;
use docucheck_protocol::ToolError;
use serde_json::Value;

/// Successful outcome of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Completed(Value),
    /// Accepted for background processing; the payload describes the job.
    Queued(Value),
}

impl ToolResult {
    pub fn output(&self) -> &Value {
        match self {
            ToolResult::Completed(value) | ToolResult::Queued(value) => value,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// JSON schema the registry checks `arguments` against before dispatch.
    fn input_schema(&self) -> Value;

    /// Extra argument checks that a schema cannot express.
    fn validate(&self, _arguments: &Value) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, ctx: ExecutionContext, arguments: Value) -> Result<ToolResult, ToolError>;
}
