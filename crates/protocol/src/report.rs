//! Findings and the aggregated validation report.

use crate::document::Location;
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One observation produced by an auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub auditor_name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Finding {
    pub fn new(auditor_name: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            auditor_name: auditor_name.into(),
            severity,
            message: message.into(),
            location: None,
            evidence: None,
        }
    }

    pub fn info(auditor_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(auditor_name, Severity::Info, message)
    }

    pub fn warning(auditor_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(auditor_name, Severity::Warning, message)
    }

    pub fn critical(auditor_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(auditor_name, Severity::Critical, message)
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditorStatus {
    Success,
    Error,
    Skipped,
}

impl AuditorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditorStatus::Success => "success",
            AuditorStatus::Error => "error",
            AuditorStatus::Skipped => "skipped",
        }
    }
}

/// Auditor name to status, kept in auditor registration order.
///
/// Serializes as a JSON object whose keys appear in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditorStatusMap {
    entries: Vec<(String, AuditorStatus)>,
}

impl AuditorStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status for `auditor`, keeping its original position if present.
    pub fn insert(&mut self, auditor: impl Into<String>, status: AuditorStatus) {
        let auditor = auditor.into();
        match self.entries.iter_mut().find(|(name, _)| *name == auditor) {
            Some(entry) => entry.1 = status,
            None => self.entries.push((auditor, status)),
        }
    }

    pub fn get(&self, auditor: &str) -> Option<AuditorStatus> {
        self.entries
            .iter()
            .find(|(name, _)| name == auditor)
            .map(|(_, status)| *status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AuditorStatus)> {
        self.entries.iter().map(|(name, status)| (name.as_str(), *status))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn any(&self, status: AuditorStatus) -> bool {
        self.entries.iter().any(|(_, s)| *s == status)
    }
}

impl<S: Into<String>> FromIterator<(S, AuditorStatus)> for AuditorStatusMap {
    fn from_iter<I: IntoIterator<Item = (S, AuditorStatus)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, status) in iter {
            map.insert(name, status);
        }
        map
    }
}

impl Serialize for AuditorStatusMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, status) in &self.entries {
            map.serialize_entry(name, status)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AuditorStatusMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = AuditorStatusMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of auditor name to status")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AuditorStatusMap::new();
                while let Some((name, status)) = access.next_entry::<String, AuditorStatus>()? {
                    map.insert(name, status);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// How an auditor execution error counts toward the overall status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditorErrorPolicy {
    #[default]
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Pass,
    Warnings,
    Fail,
}

impl OverallStatus {
    /// `fail` on any critical finding, else `warnings` on any warning finding
    /// or errored auditor, else `pass`. Under [`AuditorErrorPolicy::Fail`] an
    /// errored auditor is treated like a critical finding.
    pub fn evaluate(
        findings: &[Finding],
        statuses: &AuditorStatusMap,
        error_policy: AuditorErrorPolicy,
    ) -> Self {
        let auditor_error = statuses.any(AuditorStatus::Error);
        if findings.iter().any(|f| f.severity == Severity::Critical)
            || (auditor_error && error_policy == AuditorErrorPolicy::Fail)
        {
            return OverallStatus::Fail;
        }
        if auditor_error || findings.iter().any(|f| f.severity == Severity::Warning) {
            return OverallStatus::Warnings;
        }
        OverallStatus::Pass
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorFailure {
    pub auditor_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub document_id: String,
    pub policy_id: String,
    pub findings: Vec<Finding>,
    pub per_auditor_status: AuditorStatusMap,
    #[serde(default)]
    pub auditor_errors: Vec<AuditorFailure>,
    pub overall_status: OverallStatus,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Builds a report from already-ordered parts and derives the overall status.
    pub fn assemble(
        document_id: impl Into<String>,
        policy_id: impl Into<String>,
        findings: Vec<Finding>,
        per_auditor_status: AuditorStatusMap,
        auditor_errors: Vec<AuditorFailure>,
        error_policy: AuditorErrorPolicy,
    ) -> Self {
        let overall_status = OverallStatus::evaluate(&findings, &per_auditor_status, error_policy);
        Self {
            document_id: document_id.into(),
            policy_id: policy_id.into(),
            findings,
            per_auditor_status,
            auditor_errors,
            overall_status,
            generated_at: Utc::now(),
        }
    }

    pub fn findings_by<'a>(&'a self, auditor: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.auditor_name == auditor)
    }
}
