//! Wires collaborators, auditors and tools into a ready registry.

use crate::config::AuditConfig;
use crate::error::AppError;
use crate::stores::{FsDocumentMaterializer, YamlPolicyResolver};
use docucheck_audit::auditors::{DisclaimerAuditor, EntityConsistencyAuditor, NumericFormatAuditor};
use docucheck_audit::{
    AuditCoordinator, AuditorRegistry, DescribeAuditorsTool, DocumentMaterializer, PolicyResolver,
};
use docucheck_protocol::ObservabilitySink;
use docucheck_registry::{FanoutSink, MetricsSink, ToolRegistry, TracingSink};
use std::sync::Arc;
use tracing::info;

pub fn default_sink() -> Arc<dyn ObservabilitySink> {
    Arc::new(FanoutSink::new(vec![
        Arc::new(TracingSink),
        Arc::new(MetricsSink),
    ]))
}

pub fn reference_auditors() -> Result<Arc<AuditorRegistry>, AppError> {
    let auditors = Arc::new(AuditorRegistry::new());
    auditors.register(Arc::new(DisclaimerAuditor))?;
    auditors.register(Arc::new(NumericFormatAuditor))?;
    auditors.register(Arc::new(EntityConsistencyAuditor))?;
    Ok(auditors)
}

pub fn build_registry(
    config: &AuditConfig,
    sink: Arc<dyn ObservabilitySink>,
) -> Result<ToolRegistry, AppError> {
    let documents: Arc<dyn DocumentMaterializer> =
        Arc::new(FsDocumentMaterializer::new(&config.documents_dir));
    let policies: Arc<dyn PolicyResolver> = Arc::new(YamlPolicyResolver::new(&config.policies_dir));
    let auditors = reference_auditors()?;

    let coordinator = AuditCoordinator::new(auditors.clone(), documents, policies.clone())
        .with_sink(sink.clone())
        .with_config(config.coordinator);
    let describe = DescribeAuditorsTool::new(auditors.clone(), policies);

    let registry = ToolRegistry::new(sink);
    registry.register(AuditCoordinator::spec(config.limits), Arc::new(coordinator))?;
    registry.register(DescribeAuditorsTool::spec(), Arc::new(describe))?;

    info!(
        tools = registry.count(),
        auditors = ?auditors.names(),
        documents_dir = %config.documents_dir.display(),
        policies_dir = %config.policies_dir.display(),
        "Registry ready"
    );
    Ok(registry)
}
