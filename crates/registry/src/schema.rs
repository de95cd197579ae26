use docucheck_protocol::ToolError;
use jsonschema::{Draft, Validator};
use serde_json::Value;

/// Input schema compiled once at registration.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn compile(schema: &Value) -> Result<Self, ToolError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|err| ToolError::validation(format!("Invalid input schema: {err}")))?;
        Ok(Self { validator })
    }

    pub fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        let messages: Vec<String> = self
            .validator
            .iter_errors(arguments)
            .map(|err| err.to_string())
            .collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ToolError::validation(format!(
                "Arguments do not match schema: {}",
                messages.join("; ")
            )))
        }
    }
}
