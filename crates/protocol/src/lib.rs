//! Shared data contracts for the docucheck tool registry and audit engine.
//!
//! Nothing in this crate performs I/O. The registry, the coordinator and the
//! service binary all speak these types.

pub mod document;
pub mod error;
pub mod policy;
pub mod report;
pub mod telemetry;
pub mod tool;

pub use document::{Document, Location, TextFragment};
pub use error::{ToolError, ToolErrorCode};
pub use policy::Policy;
pub use report::{
    AuditorErrorPolicy, AuditorFailure, AuditorStatus, AuditorStatusMap, Finding, OverallStatus,
    Severity, ValidationReport,
};
pub use telemetry::{AuditorEvent, InvocationEvent, NoopSink, ObservabilitySink};
pub use tool::{
    compare_versions, outcome_label, AttachmentRef, ContextOverrides, InvokeStatus,
    ToolInvokeContext, ToolInvokeRequest, ToolInvokeResponse, ToolKey, ToolLimits, ToolSpec,
};
