//! Fan-out of one document to every applicable auditor.

use crate::auditor_registry::AuditorRegistry;
use crate::budget::{AuditBudget, DEFAULT_BUDGET_RATIO};
use crate::slot::{assemble_report, AuditSlot, SlotOutcome};
use crate::traits::{Auditor, DocumentMaterializer, PolicyResolver};
use async_trait::async_trait;
use docucheck_protocol::{
    AuditorErrorPolicy, AuditorEvent, Document, NoopSink, ObservabilitySink, Policy, ToolError,
    ToolErrorCode, ToolLimits, ToolSpec, ValidationReport,
};
use docucheck_registry::task::panic_message;
use docucheck_registry::{AbortOnDrop, ExecutionContext, Tool, ToolResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Share of the remaining time each auditor may use, in `(0, 1]`.
    pub auditor_budget_ratio: f64,
    pub error_policy: AuditorErrorPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auditor_budget_ratio: DEFAULT_BUDGET_RATIO,
            error_policy: AuditorErrorPolicy::Warn,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuditArguments {
    document_id: String,
    policy_id: String,
}

/// The `document_audit` tool.
pub struct AuditCoordinator {
    auditors: Arc<AuditorRegistry>,
    documents: Arc<dyn DocumentMaterializer>,
    policies: Arc<dyn PolicyResolver>,
    sink: Arc<dyn ObservabilitySink>,
    config: CoordinatorConfig,
}

impl AuditCoordinator {
    pub const TOOL_NAME: &'static str = "document_audit";
    pub const TOOL_VERSION: &'static str = "1.0.0";

    pub fn new(
        auditors: Arc<AuditorRegistry>,
        documents: Arc<dyn DocumentMaterializer>,
        policies: Arc<dyn PolicyResolver>,
    ) -> Self {
        Self {
            auditors,
            documents,
            policies,
            sink: Arc::new(NoopSink),
            config: CoordinatorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn spec(limits: ToolLimits) -> ToolSpec {
        ToolSpec::new(
            Self::TOOL_NAME,
            Self::TOOL_VERSION,
            "Run every auditor a policy selects against an uploaded document",
        )
        .with_limits(limits)
    }

    /// Runs the applicable auditors concurrently and aggregates their output.
    ///
    /// A failing or slow auditor becomes an error slot in the report. Only
    /// missing the overall `deadline` fails the whole run, in which case every
    /// auditor still running is cancelled and no partial report is returned.
    pub async fn audit(
        &self,
        document: Arc<Document>,
        policy: Arc<Policy>,
        deadline: Instant,
        request_id: &str,
    ) -> Result<ValidationReport, ToolError> {
        if Instant::now() >= deadline {
            return Err(ToolError::new(
                ToolErrorCode::Timeout,
                format!("Audit of document {} started after its deadline", document.id),
            ));
        }

        let auditors = self.auditors.applicable(&policy);
        let budget = AuditBudget::new(
            deadline.saturating_duration_since(Instant::now()),
            self.config.auditor_budget_ratio,
        );
        info!(
            document_id = %document.id,
            policy_id = %policy.policy_id,
            request_id,
            auditors = auditors.len(),
            budget_ms = u64::try_from(budget.overall().as_millis()).unwrap_or(u64::MAX),
            "Starting audit"
        );

        let runs = auditors.into_iter().enumerate().map(|(position, auditor)| {
            let timeout = budget.timeout_for(auditor.name(), &policy);
            run_slot(position, auditor, document.clone(), policy.clone(), timeout)
        });

        // Sub-timeouts are capped at the remaining time, so on a tie the
        // overall deadline has to win.
        let slots = tokio::select! {
            biased;
            () = tokio::time::sleep_until(deadline) => {
                warn!(
                    document_id = %document.id,
                    request_id,
                    "Audit missed its overall deadline; running auditors cancelled"
                );
                return Err(ToolError::new(
                    ToolErrorCode::Timeout,
                    format!(
                        "Audit of document {} did not finish within {}ms",
                        document.id,
                        budget.overall().as_millis()
                    ),
                ));
            }
            slots = join_all(runs) => slots,
        };

        for slot in &slots {
            self.record_slot(slot, request_id);
        }

        let report = assemble_report(
            &document.id,
            &policy.policy_id,
            slots,
            self.config.error_policy,
        );
        info!(
            document_id = %report.document_id,
            request_id,
            findings = report.findings.len(),
            errors = report.auditor_errors.len(),
            overall = ?report.overall_status,
            "Audit completed"
        );
        Ok(report)
    }

    fn record_slot(&self, slot: &AuditSlot, request_id: &str) {
        let event = AuditorEvent {
            auditor_name: slot.auditor_name.clone(),
            status: slot.status(),
            latency_ms: slot.latency_ms,
            request_id: request_id.to_string(),
        };
        let sink = self.sink.clone();
        if std::panic::catch_unwind(AssertUnwindSafe(|| sink.record_auditor(&event))).is_err() {
            error!(auditor = %slot.auditor_name, "Observability sink panicked while recording auditor");
        }
    }
}

async fn run_slot(
    position: usize,
    auditor: Arc<dyn Auditor>,
    document: Arc<Document>,
    policy: Arc<Policy>,
    timeout: Duration,
) -> AuditSlot {
    let auditor_name = auditor.name().to_string();
    let started = Instant::now();

    // `supports` is auditor code too, so it runs inside the isolated task.
    let mut handle = AbortOnDrop::spawn(async move {
        if !auditor.supports(&document, &policy) {
            return None;
        }
        Some(auditor.audit(&document, &policy).await)
    });
    let outcome = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(None)) => {
            return AuditSlot {
                position,
                auditor_name,
                outcome: SlotOutcome::Skipped,
                latency_ms: 0,
            };
        }
        Ok(Ok(Some(Ok(findings)))) => SlotOutcome::Completed(findings),
        Ok(Ok(Some(Err(err)))) => SlotOutcome::Failed(err.to_string()),
        Ok(Err(join_err)) if join_err.is_panic() => {
            SlotOutcome::Failed(format!("Auditor panicked: {}", panic_message(join_err)))
        }
        Ok(Err(_)) => SlotOutcome::Failed("Auditor task was cancelled".to_string()),
        Err(_) => {
            handle.abort();
            SlotOutcome::Failed(format!("Auditor timed out after {}ms", timeout.as_millis()))
        }
    };

    if let SlotOutcome::Failed(message) = &outcome {
        warn!(auditor = %auditor_name, "Auditor failed: {message}");
    }

    AuditSlot {
        position,
        auditor_name,
        outcome,
        latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

#[async_trait]
impl Tool for AuditCoordinator {
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_id": { "type": "string", "minLength": 1 },
                "policy_id": { "type": "string", "minLength": 1 }
            },
            "required": ["document_id", "policy_id"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, ctx: ExecutionContext, arguments: Value) -> Result<ToolResult, ToolError> {
        let args: AuditArguments = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation(format!("Invalid audit arguments: {e}")))?;

        let (document, policy) = tokio::try_join!(
            async { self.documents.materialize(&args.document_id).await.map_err(ToolError::from) },
            async { self.policies.resolve(&args.policy_id).await.map_err(ToolError::from) },
        )?;

        let report = self
            .audit(Arc::new(document), Arc::new(policy), ctx.deadline(), ctx.request_id())
            .await?;
        let value = serde_json::to_value(&report)
            .map_err(|e| ToolError::execution(format!("Failed to encode report: {e}")))?;
        Ok(ToolResult::Completed(value))
    }
}
