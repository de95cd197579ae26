//! The invocation pipeline: resolve, gate, validate, dispatch, report.

use crate::execution_context::ExecutionContext;
use crate::registry::{Entry, ToolRegistry};
use crate::task::{panic_message, payload_message, AbortOnDrop};
use crate::tool::{Tool, ToolResult};
use docucheck_protocol::{
    outcome_label, InvocationEvent, InvokeStatus, ToolError, ToolErrorCode, ToolInvokeContext,
    ToolInvokeRequest, ToolInvokeResponse, ToolLimits,
};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Instrument};

impl ToolRegistry {
    /// Invokes a registered tool.
    ///
    /// Always returns exactly one of a response or a [`ToolError`], and
    /// records exactly one observability event, whatever happens inside the
    /// tool.
    pub async fn invoke(
        &self,
        request: ToolInvokeRequest,
        context: ToolInvokeContext,
    ) -> Result<ToolInvokeResponse, ToolError> {
        let started = Instant::now();
        let context = match &request.context {
            Some(overrides) => context.apply(overrides),
            None => context,
        };
        let tool_name = request.tool_name.clone();

        let span = tracing::info_span!(
            "tool_invoke",
            tool = %tool_name,
            request_id = %context.request_id,
            trace_id = %context.trace_id,
        );

        let Some(entry) = self.resolve(&tool_name, request.version.as_deref()) else {
            let target = match &request.version {
                Some(version) => format!("{tool_name}@{version}"),
                None => tool_name.clone(),
            };
            let outcome = Err(ToolError::not_found(target));
            return self.finish(&tool_name, None, &context, started, outcome);
        };
        let version = entry.spec.version.clone();

        info!(parent: &span, version = %version, user_id = %context.user_id, "Dispatching tool");
        let outcome = dispatch(entry, request, &context).instrument(span).await;
        self.finish(&tool_name, Some(version), &context, started, outcome)
    }

    fn finish(
        &self,
        tool_name: &str,
        version: Option<String>,
        context: &ToolInvokeContext,
        started: Instant,
        outcome: Result<ToolInvokeResponse, ToolError>,
    ) -> Result<ToolInvokeResponse, ToolError> {
        let latency_ms = elapsed_ms(started);
        match &outcome {
            Ok(response) => info!(
                tool = %tool_name,
                request_id = %context.request_id,
                status = response.status.as_str(),
                latency_ms,
                "Tool invocation completed"
            ),
            Err(err) => warn!(
                tool = %tool_name,
                request_id = %context.request_id,
                code = %err.code,
                retryable = err.retryable,
                latency_ms,
                "Tool invocation failed: {}",
                err.message
            ),
        }

        let event = InvocationEvent {
            tool_name: tool_name.to_string(),
            version,
            status: outcome_label(&outcome),
            latency_ms,
            request_id: context.request_id.clone(),
            trace_id: context.trace_id.clone(),
        };
        // The sink must never fail the invocation path.
        let sink = self.sink.clone();
        if std::panic::catch_unwind(AssertUnwindSafe(|| sink.record_invocation(&event))).is_err() {
            error!(tool = %tool_name, "Observability sink panicked while recording invocation");
        }

        outcome
    }
}

async fn dispatch(
    entry: Arc<Entry>,
    request: ToolInvokeRequest,
    context: &ToolInvokeContext,
) -> Result<ToolInvokeResponse, ToolError> {
    let limits = entry.spec.limits;

    // Preconditions: nothing below this block runs on a rejected request.
    check_payload(&limits, &request)?;
    validate_arguments(&entry, &request.arguments)?;

    let ctx = ExecutionContext::new(context.clone(), limits);
    let dispatch_started = Instant::now();
    let result = execute_with_protection(entry.tool.clone(), ctx, request.arguments).await?;
    let latency_ms = elapsed_ms(dispatch_started);

    let (status, result) = match result {
        ToolResult::Completed(value) => (InvokeStatus::Success, value),
        ToolResult::Queued(value) => (InvokeStatus::Queued, value),
    };
    Ok(ToolInvokeResponse {
        tool_name: entry.spec.name.clone(),
        version: entry.spec.version.clone(),
        request_id: context.request_id.clone(),
        result,
        status,
        latency_ms,
        limits_applied: limits,
    })
}

fn check_payload(limits: &ToolLimits, request: &ToolInvokeRequest) -> Result<(), ToolError> {
    let serialized = serde_json::to_vec(&request.arguments)
        .map_err(|e| ToolError::validation(format!("Arguments are not serializable: {e}")))?;
    let size = u64::try_from(serialized.len()).unwrap_or(u64::MAX);
    if size > limits.max_payload_bytes() {
        return Err(ToolError::payload_too_large(size, limits.max_payload_bytes()));
    }

    let max_attachment = limits.max_attachment_bytes();
    if let Some(attachment) = request
        .attachments
        .iter()
        .find(|a| a.size_bytes > max_attachment)
    {
        return Err(ToolError::new(
            ToolErrorCode::PayloadTooLarge,
            format!(
                "Attachment {} of {} bytes exceeds limit of {} bytes",
                attachment.document_id, attachment.size_bytes, max_attachment
            ),
        ));
    }
    Ok(())
}

/// Schema check followed by the tool's own hook. The hook is tool code, so a
/// panic in it is contained here like one in `execute`.
fn validate_arguments(entry: &Entry, arguments: &Value) -> Result<(), ToolError> {
    std::panic::catch_unwind(AssertUnwindSafe(|| {
        entry.schema.validate(arguments)?;
        entry.tool.validate(arguments)
    }))
    .unwrap_or_else(|payload| {
        let message = payload_message(payload.as_ref());
        error!("Argument validation panicked: {}", message);
        Err(ToolError::execution(format!("Argument validation panicked: {message}")))
    })
}

/// Runs the tool on its own task so that a panic stays contained, and
/// aborts it once the context deadline passes.
async fn execute_with_protection(
    tool: Arc<dyn Tool>,
    ctx: ExecutionContext,
    arguments: Value,
) -> Result<ToolResult, ToolError> {
    let deadline = ctx.deadline();
    let timeout_seconds = ctx.limits.timeout_seconds;

    let mut handle = AbortOnDrop::spawn(async move { tool.execute(ctx, arguments).await });

    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(result)) => result.map_err(normalize_tool_error),
        Ok(Err(join_err)) if join_err.is_panic() => {
            let message = panic_message(join_err);
            error!("Tool execution panicked: {}", message);
            Err(ToolError::execution(format!("Tool execution panicked: {message}")))
        }
        Ok(Err(_)) => {
            error!("Tool execution cancelled");
            Err(ToolError::execution("Tool execution was cancelled"))
        }
        Err(_) => {
            handle.abort();
            warn!("Tool execution timed out after {}s", timeout_seconds);
            Err(ToolError::timeout(timeout_seconds))
        }
    }
}

/// Conflicts are a registration-time condition; a tool cannot report one.
fn normalize_tool_error(err: ToolError) -> ToolError {
    if err.code == ToolErrorCode::RegistryConflict {
        ToolError::execution(err.message).with_retryable(err.retryable)
    } else {
        err
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
