use super::config_block;
use crate::traits::{AuditError, Auditor};
use async_trait::async_trait;
use docucheck_protocol::{Document, Finding, Policy, Severity};
use serde::Deserialize;

pub const NAME: &str = "disclaimer";

#[derive(Debug, Clone, Deserialize)]
pub struct DisclaimerConfig {
    pub templates: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Critical
}

/// Requires every configured disclaimer template to appear in the document.
/// Matching ignores case and collapses whitespace, so line breaks introduced
/// by extraction do not cause false positives.
pub struct DisclaimerAuditor;

#[async_trait]
impl Auditor for DisclaimerAuditor {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, document: &Document, policy: &Policy) -> bool {
        document.is_textual() && policy.has_block(NAME)
    }

    async fn audit(&self, document: &Document, policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        let config: DisclaimerConfig = config_block(policy, NAME)?;
        if config.templates.iter().all(|t| t.trim().is_empty()) {
            return Err(AuditError::config(NAME, "templates must not be empty"));
        }

        let haystack = normalize(&document.full_text());
        let findings = config
            .templates
            .iter()
            .filter(|template| !template.trim().is_empty())
            .filter(|template| !haystack.contains(&normalize(template)))
            .map(|template| {
                Finding::new(
                    NAME,
                    config.severity,
                    format!("Required disclaimer missing: \"{}\"", preview(template)),
                )
                .with_evidence(template.as_str())
            })
            .collect();
        Ok(findings)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn preview(template: &str) -> String {
    const MAX_CHARS: usize = 60;
    let trimmed = template.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_CHARS).collect();
    format!("{head}...")
}
