//! Multi-auditor validation engine.
//!
//! [`AuditCoordinator`] is a registry tool that fans a document out to every
//! auditor applicable to a policy, bounds each one with its own soft
//! deadline, and folds the results into one [`ValidationReport`] whose order
//! depends only on auditor registration order.
//!
//! [`ValidationReport`]: docucheck_protocol::ValidationReport

pub mod auditor_registry;
pub mod auditors;
pub mod budget;
pub mod coordinator;
pub mod describe;
pub mod slot;
pub mod traits;

pub use auditor_registry::AuditorRegistry;
pub use budget::AuditBudget;
pub use coordinator::{AuditCoordinator, CoordinatorConfig};
pub use describe::DescribeAuditorsTool;
pub use slot::{AuditSlot, SlotOutcome};
pub use traits::{AuditError, Auditor, CollaboratorError, DocumentMaterializer, PolicyResolver};
