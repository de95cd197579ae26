//! Tool descriptors and the invocation envelope.

use crate::error::ToolErrorCode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Per-tool resource limits, enforced by the registry before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLimits {
    pub max_payload_kb: u64,
    pub max_attachment_mb: u64,
    pub timeout_seconds: u64,
}

impl ToolLimits {
    pub fn max_payload_bytes(&self) -> u64 {
        self.max_payload_kb.saturating_mul(1024)
    }

    pub fn max_attachment_bytes(&self) -> u64 {
        self.max_attachment_mb.saturating_mul(1024 * 1024)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self {
            max_payload_kb: 512,
            max_attachment_mb: 25,
            timeout_seconds: 30,
        }
    }
}

/// Registry key: a tool name paired with one of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolKey {
    pub name: String,
    pub version: String,
}

impl ToolKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Immutable descriptor advertised for a registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub limits: ToolLimits,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            limits: ToolLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ToolLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn key(&self) -> ToolKey {
        ToolKey::new(self.name.clone(), self.version.clone())
    }
}

/// Compares dotted version strings component by component.
///
/// Numeric components compare numerically; anything else falls back to a
/// lexical comparison so ordering is total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Per-call context. Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvokeContext {
    pub request_id: String,
    pub user_id: String,
    pub session_id: String,
    pub trace_id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ToolInvokeContext {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns a new context with `overrides` layered on top.
    ///
    /// `request_id` and `user_id` are never overridable, and metadata
    /// overrides cannot replace keys that the caller's context already set.
    pub fn apply(&self, overrides: &ContextOverrides) -> Self {
        let mut next = self.clone();
        if let Some(session_id) = &overrides.session_id {
            next.session_id = session_id.clone();
        }
        if let Some(trace_id) = &overrides.trace_id {
            next.trace_id = trace_id.clone();
        }
        for (key, value) in &overrides.metadata {
            next.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        next
    }
}

/// Caller-supplied adjustments to the auth-derived context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOverrides {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Declared attachment accompanying an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub document_id: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvokeRequest {
    pub tool_name: String,
    /// Absent means the highest registered version of `tool_name`.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arguments: serde_json::Value,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub context: Option<ContextOverrides>,
}

impl ToolInvokeRequest {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            version: None,
            arguments,
            attachments: Vec::new(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, document_id: impl Into<String>, size_bytes: u64) -> Self {
        self.attachments.push(AttachmentRef {
            document_id: document_id.into(),
            size_bytes,
        });
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ContextOverrides) -> Self {
        self.context = Some(overrides);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokeStatus {
    Success,
    Queued,
    Error,
}

impl InvokeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvokeStatus::Success => "success",
            InvokeStatus::Queued => "queued",
            InvokeStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvokeResponse {
    pub tool_name: String,
    pub version: String,
    pub request_id: String,
    pub result: serde_json::Value,
    pub status: InvokeStatus,
    pub latency_ms: u64,
    pub limits_applied: ToolLimits,
}

/// Outcome label for telemetry: the status for responses, the code for errors.
pub fn outcome_label(outcome: &Result<ToolInvokeResponse, crate::ToolError>) -> &'static str {
    match outcome {
        Ok(response) => response.status.as_str(),
        Err(err) => match err.code {
            ToolErrorCode::NotFound => "not_found",
            ToolErrorCode::PayloadTooLarge => "payload_too_large",
            ToolErrorCode::ValidationFailed => "validation_failed",
            ToolErrorCode::Timeout => "timeout",
            ToolErrorCode::ExecutionFailed => "execution_failed",
            ToolErrorCode::RegistryConflict => "registry_conflict",
        },
    }
}
