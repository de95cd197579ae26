//! Tool invocation registry.
//!
//! Holds versioned tool descriptors and their implementations, enforces the
//! declared limits, and dispatches each call behind a deadline and a panic
//! boundary so that every invocation ends in either a response or a
//! structured [`ToolError`].

pub mod dispatcher;
pub mod execution_context;
pub mod registry;
pub mod schema;
pub mod sinks;
pub mod task;
pub mod tool;

pub use docucheck_protocol::{ToolError, ToolErrorCode};
pub use execution_context::ExecutionContext;
pub use registry::ToolRegistry;
pub use schema::SchemaValidator;
pub use sinks::{FanoutSink, MetricsSink, RecordingSink, TracingSink};
pub use task::AbortOnDrop;
pub use tool::{Tool, ToolResult};
