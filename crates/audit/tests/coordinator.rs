#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use docucheck_audit::{
    AuditCoordinator, AuditError, Auditor, AuditorRegistry, CollaboratorError, CoordinatorConfig,
    DocumentMaterializer, PolicyResolver,
};
use docucheck_protocol::{
    AuditorErrorPolicy, AuditorStatus, Document, Finding, OverallStatus, Policy, Severity,
    ToolErrorCode,
};
use docucheck_registry::RecordingSink;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct Scripted {
    name: &'static str,
    delay: Duration,
    outcome: Result<Vec<Finding>, AuditError>,
    supported: bool,
    finished: Arc<AtomicBool>,
}

impl Scripted {
    fn new(name: &'static str, outcome: Result<Vec<Finding>, AuditError>) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            outcome,
            supported: true,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    fn emitting(name: &'static str, findings: Vec<Finding>) -> Self {
        Self::new(name, Ok(findings))
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }
}

#[async_trait]
impl Auditor for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self, _document: &Document, _policy: &Policy) -> bool {
        self.supported
    }

    async fn audit(&self, _document: &Document, _policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.store(true, Ordering::SeqCst);
        self.outcome.clone()
    }
}

struct Panicking;

#[async_trait]
impl Auditor for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn audit(&self, _document: &Document, _policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        panic!("tokenizer table missing");
    }
}

/// Blows up while deciding whether it applies.
struct PanicsInSupports;

#[async_trait]
impl Auditor for PanicsInSupports {
    fn name(&self) -> &str {
        "brittle"
    }

    fn supports(&self, _document: &Document, _policy: &Policy) -> bool {
        panic!("mime table corrupt");
    }

    async fn audit(&self, _document: &Document, _policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        Ok(vec![Finding::critical("brittle", "unreachable")])
    }
}

#[derive(Default)]
struct Store {
    documents: HashMap<String, Document>,
    policies: HashMap<String, Policy>,
}

#[async_trait]
impl DocumentMaterializer for Store {
    async fn materialize(&self, document_id: &str) -> Result<Document, CollaboratorError> {
        self.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("document {document_id}")))
    }
}

#[async_trait]
impl PolicyResolver for Store {
    async fn resolve(&self, policy_id: &str) -> Result<Policy, CollaboratorError> {
        self.policies
            .get(policy_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("policy {policy_id}")))
    }
}

fn document() -> Arc<Document> {
    Arc::new(Document::new("doc-1", "text/plain").with_fragment(1, 0, "Hello world"))
}

fn coordinator(auditors: Vec<Arc<dyn Auditor>>) -> AuditCoordinator {
    let registry = Arc::new(AuditorRegistry::new());
    for auditor in auditors {
        registry.register(auditor).unwrap();
    }
    let store = Arc::new(Store::default());
    AuditCoordinator::new(registry, store.clone(), store)
}

fn deadline(secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(secs)
}

fn messages(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.message.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_report_order_follows_registration_not_completion() {
    let coordinator = coordinator(vec![
        Arc::new(
            Scripted::emitting("slow", vec![Finding::info("slow", "a1"), Finding::info("slow", "a2")])
                .delayed(Duration::from_millis(50)),
        ),
        Arc::new(Scripted::emitting("fast", vec![Finding::info("fast", "b1")])),
    ]);

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(messages(&report.findings), vec!["a1", "a2", "b1"]);
    assert_eq!(report.per_auditor_status.keys(), vec!["slow", "fast"]);
    assert_eq!(report.overall_status, OverallStatus::Pass);
}

#[tokio::test(start_paused = true)]
async fn test_failing_auditor_yields_partial_report_with_warnings() {
    let coordinator = coordinator(vec![
        Arc::new(Scripted::new("a", Err(AuditError::Service("model endpoint down".into())))),
        Arc::new(Scripted::emitting("b", vec![Finding::info("b", "looks fine")])),
    ]);

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.per_auditor_status.get("a"), Some(AuditorStatus::Error));
    assert_eq!(report.per_auditor_status.get("b"), Some(AuditorStatus::Success));
    assert_eq!(messages(&report.findings), vec!["looks fine"]);
    assert_eq!(report.auditor_errors.len(), 1);
    assert!(report.auditor_errors[0].message.contains("model endpoint down"));
    assert_eq!(report.overall_status, OverallStatus::Warnings);
}

#[tokio::test(start_paused = true)]
async fn test_warning_plus_raising_auditor_is_warnings() {
    let coordinator = coordinator(vec![
        Arc::new(Scripted::emitting("a", vec![Finding::warning("a", "odd spacing")])),
        Arc::new(Scripted::new("b", Err(AuditError::Failed("dictionary missing".into())))),
    ]);

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.per_auditor_status.get("a"), Some(AuditorStatus::Success));
    assert_eq!(report.per_auditor_status.get("b"), Some(AuditorStatus::Error));
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].severity, Severity::Warning);
    assert_eq!(report.findings[0].auditor_name, "a");
    assert_eq!(report.auditor_errors.len(), 1);
    assert_eq!(report.overall_status, OverallStatus::Warnings);
}

#[tokio::test(start_paused = true)]
async fn test_panic_in_supports_is_isolated_to_its_slot() {
    let coordinator = coordinator(vec![
        Arc::new(Scripted::emitting("good", vec![Finding::warning("good", "stale date")])),
        Arc::new(PanicsInSupports),
    ]);

    let outcome = tokio::spawn(async move {
        coordinator
            .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
            .await
    })
    .await
    .expect("audit must not panic");
    let report = outcome.unwrap();

    assert_eq!(report.per_auditor_status.get("good"), Some(AuditorStatus::Success));
    assert_eq!(report.per_auditor_status.get("brittle"), Some(AuditorStatus::Error));
    assert_eq!(messages(&report.findings), vec!["stale date"]);
    assert_eq!(report.auditor_errors[0].message, "Auditor panicked: mime table corrupt");
    assert_eq!(report.overall_status, OverallStatus::Warnings);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_are_identical_apart_from_timestamp() {
    let coordinator = coordinator(vec![
        Arc::new(
            Scripted::emitting("x", vec![Finding::warning("x", "x1")]).delayed(Duration::from_millis(30)),
        ),
        Arc::new(Scripted::emitting("y", vec![Finding::info("y", "y1"), Finding::info("y", "y2")])),
        Arc::new(Scripted::emitting("z", vec![]).delayed(Duration::from_millis(10))),
    ]);
    let policy = Arc::new(Policy::new("p"));

    let first = coordinator
        .audit(document(), policy.clone(), deadline(5), "req-1")
        .await
        .unwrap();
    let second = coordinator
        .audit(document(), policy, deadline(5), "req-2")
        .await
        .unwrap();

    assert_eq!(first.findings, second.findings);
    assert_eq!(first.per_auditor_status, second.per_auditor_status);
    assert_eq!(first.overall_status, second.overall_status);
    assert_eq!(first.overall_status, OverallStatus::Warnings);
}

#[tokio::test(start_paused = true)]
async fn test_critical_finding_fails_report() {
    let coordinator = coordinator(vec![
        Arc::new(Scripted::emitting("minor", vec![Finding::warning("minor", "typo")])),
        Arc::new(Scripted::emitting("legal", vec![Finding::critical("legal", "no disclaimer")])),
    ]);

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.overall_status, OverallStatus::Fail);
    assert_eq!(report.findings[1].severity, Severity::Critical);
}

#[tokio::test(start_paused = true)]
async fn test_slow_auditor_is_cut_off_and_cancelled() {
    let slow = Scripted::emitting("slow", vec![Finding::info("slow", "never")])
        .delayed(Duration::from_secs(30));
    let finished = slow.finished.clone();
    let coordinator = coordinator(vec![
        Arc::new(slow),
        Arc::new(Scripted::emitting("fast", vec![Finding::info("fast", "done")])),
    ]);
    let policy = Policy::new("p").with_auditor_timeout("slow", Duration::from_millis(100));

    let started = Instant::now();
    let report = coordinator
        .audit(document(), Arc::new(policy), deadline(5), "req-1")
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.per_auditor_status.get("slow"), Some(AuditorStatus::Error));
    assert!(report.auditor_errors[0].message.contains("timed out after 100ms"));
    assert_eq!(messages(&report.findings), vec!["done"]);
    assert_eq!(report.overall_status, OverallStatus::Warnings);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_default_sub_timeout_is_share_of_overall() {
    let coordinator = coordinator(vec![Arc::new(
        Scripted::emitting("slow", vec![]).delayed(Duration::from_secs(30)),
    )])
    .with_config(CoordinatorConfig {
        auditor_budget_ratio: 0.5,
        error_policy: AuditorErrorPolicy::Warn,
    });

    let started = Instant::now();
    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(10), "req-1")
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    assert_eq!(report.per_auditor_status.get("slow"), Some(AuditorStatus::Error));
}

#[tokio::test(start_paused = true)]
async fn test_expired_deadline_is_timeout() {
    let coordinator = coordinator(vec![Arc::new(Scripted::emitting("a", vec![]))]);
    let err = coordinator
        .audit(document(), Arc::new(Policy::new("p")), Instant::now(), "req-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ToolErrorCode::Timeout);
    assert!(err.retryable);
}

#[tokio::test(start_paused = true)]
async fn test_overall_deadline_cancels_running_auditors() {
    let slow = Scripted::emitting("slow", vec![Finding::info("slow", "late")])
        .delayed(Duration::from_secs(30));
    let finished = slow.finished.clone();
    let coordinator = coordinator(vec![
        Arc::new(slow),
        Arc::new(Scripted::emitting("fast", vec![Finding::info("fast", "done")])),
    ])
    .with_config(CoordinatorConfig {
        auditor_budget_ratio: 1.0,
        error_policy: AuditorErrorPolicy::Warn,
    });
    let policy = Policy::new("p").with_auditor_timeout("slow", Duration::from_secs(60));

    let started = Instant::now();
    let err = coordinator
        .audit(document(), Arc::new(policy), deadline(2), "req-1")
        .await
        .unwrap_err();

    assert_eq!(err.code, ToolErrorCode::Timeout);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_auditor_is_skipped() {
    let skipped = Scripted::emitting("ocr", vec![Finding::critical("ocr", "unreachable")]).unsupported();
    let finished = skipped.finished.clone();
    let coordinator = coordinator(vec![
        Arc::new(skipped),
        Arc::new(Scripted::emitting("text", vec![])),
    ]);

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.per_auditor_status.get("ocr"), Some(AuditorStatus::Skipped));
    assert!(report.findings.is_empty());
    assert_eq!(report.overall_status, OverallStatus::Pass);
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_policy_restricts_applicable_auditors() {
    let coordinator = coordinator(vec![
        Arc::new(Scripted::emitting("a", vec![Finding::info("a", "a1")])),
        Arc::new(Scripted::emitting("b", vec![Finding::info("b", "b1")])),
    ]);
    let policy = Policy::new("p").with_auditors(["b"]);

    let report = coordinator
        .audit(document(), Arc::new(policy), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.per_auditor_status.keys(), vec!["b"]);
    assert_eq!(messages(&report.findings), vec!["b1"]);
}

#[tokio::test(start_paused = true)]
async fn test_fail_error_policy_escalates_auditor_errors() {
    let coordinator = coordinator(vec![Arc::new(Panicking)]).with_config(CoordinatorConfig {
        auditor_budget_ratio: 0.8,
        error_policy: AuditorErrorPolicy::Fail,
    });

    let report = coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-1")
        .await
        .unwrap();

    assert_eq!(report.per_auditor_status.get("panicking"), Some(AuditorStatus::Error));
    assert!(report.auditor_errors[0].message.contains("tokenizer table missing"));
    assert_eq!(report.overall_status, OverallStatus::Fail);
}

#[tokio::test(start_paused = true)]
async fn test_auditor_events_recorded_per_slot() {
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(vec![
        Arc::new(Scripted::emitting("first", vec![]).delayed(Duration::from_millis(20))),
        Arc::new(Scripted::new("second", Err(AuditError::Failed("boom".into())))),
        Arc::new(Scripted::emitting("third", vec![]).unsupported()),
    ])
    .with_sink(sink.clone());

    coordinator
        .audit(document(), Arc::new(Policy::new("p")), deadline(5), "req-9")
        .await
        .unwrap();

    let events = sink.auditors();
    let summary: Vec<(&str, AuditorStatus)> = events
        .iter()
        .map(|e| (e.auditor_name.as_str(), e.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("first", AuditorStatus::Success),
            ("second", AuditorStatus::Error),
            ("third", AuditorStatus::Skipped),
        ]
    );
    assert!(events.iter().all(|e| e.request_id == "req-9"));
}
