use crate::auditor_registry::AuditorRegistry;
use crate::traits::PolicyResolver;
use async_trait::async_trait;
use docucheck_protocol::{ToolError, ToolLimits, ToolSpec};
use docucheck_registry::{ExecutionContext, Tool, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct DescribeArguments {
    policy_id: Option<String>,
}

/// The `auditors.describe` tool: lists registered auditors in run order,
/// optionally narrowed to the ones a policy selects.
pub struct DescribeAuditorsTool {
    auditors: Arc<AuditorRegistry>,
    policies: Arc<dyn PolicyResolver>,
}

impl DescribeAuditorsTool {
    pub const TOOL_NAME: &'static str = "auditors.describe";
    pub const TOOL_VERSION: &'static str = "1.0.0";

    pub fn new(auditors: Arc<AuditorRegistry>, policies: Arc<dyn PolicyResolver>) -> Self {
        Self { auditors, policies }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            Self::TOOL_NAME,
            Self::TOOL_VERSION,
            "List registered auditors, optionally filtered by policy",
        )
        .with_limits(ToolLimits {
            max_payload_kb: 4,
            max_attachment_mb: 0,
            timeout_seconds: 5,
        })
    }
}

#[async_trait]
impl Tool for DescribeAuditorsTool {
    fn input_schema(&self) -> Value {
        // Omitted arguments arrive as null and mean "no filter".
        json!({
            "type": ["object", "null"],
            "properties": {
                "policy_id": { "type": "string", "minLength": 1 }
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, _ctx: ExecutionContext, arguments: Value) -> Result<ToolResult, ToolError> {
        let args: DescribeArguments = if arguments.is_null() {
            DescribeArguments::default()
        } else {
            serde_json::from_value(arguments)
                .map_err(|e| ToolError::validation(format!("Invalid describe arguments: {e}")))?
        };

        let output = match args.policy_id {
            Some(policy_id) => {
                let policy = self.policies.resolve(&policy_id).await?;
                let names: Vec<String> = self
                    .auditors
                    .applicable(&policy)
                    .iter()
                    .map(|a| a.name().to_string())
                    .collect();
                json!({ "policy_id": policy_id, "auditors": names })
            }
            None => json!({ "auditors": self.auditors.names() }),
        };
        Ok(ToolResult::Completed(output))
    }
}
