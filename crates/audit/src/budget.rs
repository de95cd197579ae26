use docucheck_protocol::Policy;
use std::time::Duration;

pub const DEFAULT_BUDGET_RATIO: f64 = 0.8;

/// Per-auditor soft deadlines derived from the overall one.
///
/// Auditors run concurrently, so each may use the same share of the overall
/// time: `overall * ratio`. A policy can lower an individual auditor's
/// timeout but never raise it above that share. The remainder of the overall
/// budget is left for aggregation, so a slow auditor is absorbed as an error
/// slot before the hard deadline discards the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditBudget {
    overall: Duration,
    ratio: f64,
}

impl AuditBudget {
    /// Ratios outside `(0, 1]` fall back to [`DEFAULT_BUDGET_RATIO`].
    pub fn new(overall: Duration, ratio: f64) -> Self {
        let ratio = if ratio > 0.0 && ratio <= 1.0 {
            ratio
        } else {
            DEFAULT_BUDGET_RATIO
        };
        Self { overall, ratio }
    }

    pub fn overall(&self) -> Duration {
        self.overall
    }

    pub fn default_timeout(&self) -> Duration {
        self.overall.mul_f64(self.ratio)
    }

    pub fn timeout_for(&self, auditor: &str, policy: &Policy) -> Duration {
        let cap = self.default_timeout();
        policy
            .auditor_timeout(auditor)
            .map_or(cap, |requested| requested.min(cap))
    }
}
