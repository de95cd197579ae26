use docucheck_protocol::{
    AuditorErrorPolicy, AuditorFailure, AuditorStatus, AuditorStatusMap, Finding,
    ValidationReport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    Completed(Vec<Finding>),
    Failed(String),
    Skipped,
}

/// Result of one auditor inside one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSlot {
    /// Registration index of the auditor.
    pub position: usize,
    pub auditor_name: String,
    pub outcome: SlotOutcome,
    pub latency_ms: u64,
}

impl AuditSlot {
    pub fn status(&self) -> AuditorStatus {
        match self.outcome {
            SlotOutcome::Completed(_) => AuditorStatus::Success,
            SlotOutcome::Failed(_) => AuditorStatus::Error,
            SlotOutcome::Skipped => AuditorStatus::Skipped,
        }
    }
}

/// Folds slots into a report. Completion order is irrelevant: slots are
/// placed by registration position, findings keep the order each auditor
/// emitted them in, and every finding is attributed to its slot's auditor.
pub fn assemble_report(
    document_id: &str,
    policy_id: &str,
    mut slots: Vec<AuditSlot>,
    error_policy: AuditorErrorPolicy,
) -> ValidationReport {
    slots.sort_by_key(|slot| slot.position);

    let mut findings = Vec::new();
    let mut statuses = AuditorStatusMap::new();
    let mut errors = Vec::new();

    for slot in slots {
        statuses.insert(slot.auditor_name.clone(), slot.status());
        match slot.outcome {
            SlotOutcome::Completed(emitted) => {
                findings.extend(emitted.into_iter().map(|mut finding| {
                    finding.auditor_name.clone_from(&slot.auditor_name);
                    finding
                }));
            }
            SlotOutcome::Failed(message) => errors.push(AuditorFailure {
                auditor_name: slot.auditor_name,
                message,
            }),
            SlotOutcome::Skipped => {}
        }
    }

    ValidationReport::assemble(document_id, policy_id, findings, statuses, errors, error_policy)
}
