use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure class carried by every [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorCode {
    NotFound,
    PayloadTooLarge,
    ValidationFailed,
    Timeout,
    ExecutionFailed,
    RegistryConflict,
}

impl ToolErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorCode::NotFound => "NOT_FOUND",
            ToolErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ToolErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ToolErrorCode::Timeout => "TIMEOUT",
            ToolErrorCode::ExecutionFailed => "EXECUTION_FAILED",
            ToolErrorCode::RegistryConflict => "REGISTRY_CONFLICT",
        }
    }

    /// Precondition failures are rejected before any work is dispatched.
    pub fn is_precondition(self) -> bool {
        matches!(
            self,
            ToolErrorCode::NotFound
                | ToolErrorCode::PayloadTooLarge
                | ToolErrorCode::ValidationFailed
                | ToolErrorCode::RegistryConflict
        )
    }
}

impl fmt::Display for ToolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned by the registry instead of a response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: ToolErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(code: ToolErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code == ToolErrorCode::Timeout,
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(ToolErrorCode::NotFound, format!("Tool not found: {what}"))
    }

    pub fn payload_too_large(actual_bytes: u64, limit_bytes: u64) -> Self {
        Self::new(
            ToolErrorCode::PayloadTooLarge,
            format!("Payload of {actual_bytes} bytes exceeds limit of {limit_bytes} bytes"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorCode::ValidationFailed, message)
    }

    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::new(
            ToolErrorCode::Timeout,
            format!("Tool execution exceeded {timeout_seconds}s deadline"),
        )
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorCode::ExecutionFailed, message)
    }

    pub fn conflict(what: impl fmt::Display) -> Self {
        Self::new(
            ToolErrorCode::RegistryConflict,
            format!("Already registered: {what}"),
        )
    }

    #[must_use]
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}
