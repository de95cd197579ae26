//! Reference auditors. Each reads its own block from the policy, keyed by
//! the auditor name, and is skipped when the policy carries no such block.

pub mod disclaimer;
pub mod entity;
pub mod numeric_format;

pub use disclaimer::DisclaimerAuditor;
pub use entity::EntityConsistencyAuditor;
pub use numeric_format::NumericFormatAuditor;

use crate::traits::AuditError;
use docucheck_protocol::Policy;
use serde::de::DeserializeOwned;

pub(crate) fn config_block<T: DeserializeOwned>(policy: &Policy, auditor: &str) -> Result<T, AuditError> {
    policy
        .block(auditor)
        .map_err(|e| AuditError::config(auditor, e))?
        .ok_or_else(|| AuditError::config(auditor, "policy has no configuration block"))
}
