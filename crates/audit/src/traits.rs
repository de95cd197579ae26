use async_trait::async_trait;
use docucheck_protocol::{Document, Finding, Policy, ToolError};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Invalid {auditor} configuration: {reason}")]
    Config { auditor: String, reason: String },

    #[error("Document content unavailable: {0}")]
    Content(String),

    #[error("External service failed: {0}")]
    Service(String),

    #[error("Auditor failed: {0}")]
    Failed(String),
}

impl AuditError {
    pub fn config(auditor: &str, reason: impl fmt::Display) -> Self {
        AuditError::Config {
            auditor: auditor.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A pluggable content analyzer.
///
/// Implementations receive the document and policy by shared reference and
/// must not keep mutable state shared with other auditors; the coordinator
/// runs every applicable auditor concurrently.
#[async_trait]
pub trait Auditor: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this auditor has anything to check for the pair. Applicable
    /// auditors that return `false` are reported as skipped.
    fn supports(&self, _document: &Document, _policy: &Policy) -> bool {
        true
    }

    async fn audit(&self, document: &Document, policy: &Policy) -> Result<Vec<Finding>, AuditError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<CollaboratorError> for ToolError {
    fn from(err: CollaboratorError) -> Self {
        let retryable = matches!(err, CollaboratorError::Unavailable(_));
        ToolError::execution(err.to_string()).with_retryable(retryable)
    }
}

/// Resolves a document id to a local, read-only materialized document.
#[async_trait]
pub trait DocumentMaterializer: Send + Sync {
    async fn materialize(&self, document_id: &str) -> Result<Document, CollaboratorError>;
}

/// Resolves a policy id to its configuration.
#[async_trait]
pub trait PolicyResolver: Send + Sync {
    async fn resolve(&self, policy_id: &str) -> Result<Policy, CollaboratorError>;
}
