//! Audit policy: which auditors run and how each one is configured.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    /// Restricts the applicable auditors. `None` applies every registered one.
    #[serde(default)]
    pub auditors: Option<Vec<String>>,
    #[serde(default)]
    pub auditor_timeouts_ms: BTreeMap<String, u64>,
    /// Per-auditor configuration blocks keyed by auditor name.
    #[serde(default)]
    pub blocks: BTreeMap<String, serde_json::Value>,
}

impl Policy {
    pub fn new(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_auditors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auditors = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_block(mut self, auditor: impl Into<String>, block: serde_json::Value) -> Self {
        self.blocks.insert(auditor.into(), block);
        self
    }

    #[must_use]
    pub fn with_auditor_timeout(mut self, auditor: impl Into<String>, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.auditor_timeouts_ms.insert(auditor.into(), millis);
        self
    }

    pub fn applies(&self, auditor: &str) -> bool {
        match &self.auditors {
            Some(names) => names.iter().any(|n| n == auditor),
            None => true,
        }
    }

    pub fn has_block(&self, auditor: &str) -> bool {
        self.blocks.contains_key(auditor)
    }

    /// Decodes the configuration block for `auditor`, if the policy has one.
    pub fn block<T: DeserializeOwned>(&self, auditor: &str) -> Result<Option<T>, serde_json::Error> {
        self.blocks
            .get(auditor)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    pub fn auditor_timeout(&self, auditor: &str) -> Option<Duration> {
        self.auditor_timeouts_ms
            .get(auditor)
            .map(|ms| Duration::from_millis(*ms))
    }
}
