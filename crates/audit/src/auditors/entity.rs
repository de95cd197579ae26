use super::config_block;
use crate::traits::{AuditError, Auditor};
use async_trait::async_trait;
use docucheck_protocol::{Document, Finding, Location, Policy, Severity};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub const NAME: &str = "entity_consistency";

const ENTITY_PATTERN: &str = r"\b((?:[A-Z][\w&'-]*\s+){0,3}[A-Z][\w&'-]*),?\s+(Inc|Ltd|LLC|GmbH|Corp|PLC|AG|SA|Limited|Corporation)\b\.?";

static ENTITY_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(ENTITY_PATTERN));

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Approved spellings of legal entity names, suffix included.
    pub allowed: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Warning
}

/// Reports legal entity names that do not match an approved spelling.
///
/// A mention passes when an approved name equals it or ends it, so a
/// leading capitalized word ("The Acme Corp") does not count against it.
/// Each unapproved entity is reported once, at its first mention.
pub struct EntityConsistencyAuditor;

#[async_trait]
impl Auditor for EntityConsistencyAuditor {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, document: &Document, policy: &Policy) -> bool {
        document.is_textual() && policy.has_block(NAME)
    }

    async fn audit(&self, document: &Document, policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        let config: EntityConfig = config_block(policy, NAME)?;
        let pattern = ENTITY_RE.as_ref().map_err(|e| AuditError::Failed(e.to_string()))?;
        let allowed: Vec<String> = config.allowed.iter().map(|a| normalize(a)).collect();

        let mut reported = BTreeSet::new();
        let mut findings = Vec::new();
        for fragment in &document.fragments {
            for captures in pattern.captures_iter(&fragment.text) {
                let (Some(whole), Some(name), Some(suffix)) =
                    (captures.get(0), captures.get(1), captures.get(2))
                else {
                    continue;
                };
                let mention = format!("{} {}", name.as_str(), suffix.as_str());
                let key = normalize(&mention);
                if is_allowed(&key, &allowed) || !reported.insert(key) {
                    continue;
                }
                let mention: String = mention.split_whitespace().collect::<Vec<_>>().join(" ");
                findings.push(
                    Finding::new(
                        NAME,
                        config.severity,
                        format!("Entity \"{mention}\" is not an approved name"),
                    )
                    .at(Location::new(fragment.page, fragment.offset + whole.start()))
                    .with_evidence(whole.as_str()),
                );
            }
        }
        Ok(findings)
    }
}

fn normalize(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim_end_matches('.').to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_allowed(mention: &str, allowed: &[String]) -> bool {
    allowed
        .iter()
        .any(|a| mention == a || mention.ends_with(&format!(" {a}")))
}
