use crate::traits::Auditor;
use docucheck_protocol::{Policy, ToolError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

type Snapshot = Vec<Arc<dyn Auditor>>;

/// Auditors in fixed registration order.
///
/// That order is the order of findings and status keys in every report.
/// Changes swap in a new snapshot; running audits keep the one they started
/// with.
pub struct AuditorRegistry {
    auditors: RwLock<Arc<Snapshot>>,
}

impl AuditorRegistry {
    pub fn new() -> Self {
        Self {
            auditors: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.auditors.read().clone()
    }

    pub fn register(&self, auditor: Arc<dyn Auditor>) -> Result<(), ToolError> {
        let name = auditor.name().to_string();
        if name.trim().is_empty() {
            return Err(ToolError::validation("Auditor name must not be empty"));
        }

        let mut guard = self.auditors.write();
        if guard.iter().any(|a| a.name() == name) {
            warn!(auditor = %name, "Rejected duplicate auditor registration");
            return Err(ToolError::conflict(format!("auditor {name}")));
        }
        let mut next = (**guard).clone();
        next.push(auditor);
        *guard = Arc::new(next);
        drop(guard);

        info!(auditor = %name, "Registered auditor");
        Ok(())
    }

    /// Audited re-registration. Keeps the original position when the name is
    /// already registered, otherwise appends. Returns whether one was replaced.
    pub fn replace(&self, auditor: Arc<dyn Auditor>) -> bool {
        let name = auditor.name().to_string();

        let mut guard = self.auditors.write();
        let mut next = (**guard).clone();
        let replaced = match next.iter().position(|a| a.name() == name) {
            Some(index) => {
                next[index] = auditor;
                true
            }
            None => {
                next.push(auditor);
                false
            }
        };
        *guard = Arc::new(next);
        drop(guard);

        if replaced {
            warn!(auditor = %name, "Re-registered auditor");
        } else {
            info!(auditor = %name, "Registered auditor via replace");
        }
        replaced
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|a| a.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Auditors the policy applies to, in registration order.
    pub fn applicable(&self, policy: &Policy) -> Vec<Arc<dyn Auditor>> {
        let snapshot = self.snapshot();
        if let Some(requested) = &policy.auditors {
            for name in requested {
                if !snapshot.iter().any(|a| a.name() == name) {
                    warn!(
                        policy_id = %policy.policy_id,
                        auditor = %name,
                        "Policy names an auditor that is not registered"
                    );
                }
            }
        }
        snapshot
            .iter()
            .filter(|a| policy.applies(a.name()))
            .cloned()
            .collect()
    }
}

impl Default for AuditorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
