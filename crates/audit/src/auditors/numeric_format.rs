use super::config_block;
use crate::traits::{AuditError, Auditor};
use async_trait::async_trait;
use docucheck_protocol::{Document, Finding, Location, Policy, Severity};
use regex::Regex;
use std::sync::LazyLock;
use serde::Deserialize;

pub const NAME: &str = "numeric_format";

const NUMBER_PATTERN: &str = r"\d[\d.,\x{00A0}\x{202F}]*\d";

static NUMBER_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(NUMBER_PATTERN));

#[derive(Debug, Clone, Deserialize)]
pub struct NumericFormatConfig {
    /// Locale tags the document may use, e.g. `en-US`.
    pub locales: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Warning
}

#[derive(Debug)]
struct LocaleFormat {
    tag: &'static str,
    group: &'static [char],
    decimal: char,
    /// Lakh grouping: 12,34,567.
    indian: bool,
}

const LOCALES: &[LocaleFormat] = &[
    LocaleFormat {
        tag: "en-US",
        group: &[','],
        decimal: '.',
        indian: false,
    },
    LocaleFormat {
        tag: "de-DE",
        group: &['.'],
        decimal: ',',
        indian: false,
    },
    LocaleFormat {
        tag: "fr-FR",
        group: &['\u{00A0}', '\u{202F}'],
        decimal: ',',
        indian: false,
    },
    LocaleFormat {
        tag: "en-IN",
        group: &[','],
        decimal: '.',
        indian: true,
    },
];

/// Flags numbers whose separators only make sense in a locale the policy
/// does not accept. Numbers that read validly in an accepted locale pass,
/// even when they are ambiguous (`1.234`); tokens that match no known locale
/// (dates, version strings) are ignored.
pub struct NumericFormatAuditor;

#[async_trait]
impl Auditor for NumericFormatAuditor {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, document: &Document, policy: &Policy) -> bool {
        document.is_textual() && policy.has_block(NAME)
    }

    async fn audit(&self, document: &Document, policy: &Policy) -> Result<Vec<Finding>, AuditError> {
        let config: NumericFormatConfig = config_block(policy, NAME)?;
        let accepted = accepted_locales(&config.locales)?;
        let pattern = NUMBER_RE.as_ref().map_err(|e| AuditError::Failed(e.to_string()))?;

        let mut findings = Vec::new();
        for fragment in &document.fragments {
            for token in pattern.find_iter(&fragment.text) {
                let text = token.as_str();
                if text.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                let readings: Vec<&LocaleFormat> =
                    LOCALES.iter().filter(|locale| conforms(text, locale)).collect();
                if readings.is_empty() || readings.iter().any(|r| accepted.iter().any(|a| a.tag == r.tag)) {
                    continue;
                }
                let tags: Vec<&str> = readings.iter().map(|r| r.tag).collect();
                let allowed: Vec<&str> = accepted.iter().map(|a| a.tag).collect();
                findings.push(
                    Finding::new(
                        NAME,
                        config.severity,
                        format!(
                            "Number \"{text}\" is formatted for {}; accepted: {}",
                            tags.join(", "),
                            allowed.join(", ")
                        ),
                    )
                    .at(Location::new(fragment.page, fragment.offset + token.start()))
                    .with_evidence(text),
                );
            }
        }
        Ok(findings)
    }
}

fn accepted_locales(tags: &[String]) -> Result<Vec<&'static LocaleFormat>, AuditError> {
    if tags.is_empty() {
        return Err(AuditError::config(NAME, "locales must not be empty"));
    }
    tags.iter()
        .map(|tag| {
            LOCALES
                .iter()
                .find(|locale| locale.tag.eq_ignore_ascii_case(tag))
                .ok_or_else(|| AuditError::config(NAME, format!("unsupported locale {tag}")))
        })
        .collect()
}

fn conforms(token: &str, locale: &LocaleFormat) -> bool {
    let (integer, fraction) = match token.split_once(locale.decimal) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (token, None),
    };
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    let groups: Vec<&str> = integer.split(|c| locale.group.contains(&c)).collect();
    if groups
        .iter()
        .any(|g| g.is_empty() || !g.chars().all(|c| c.is_ascii_digit()))
    {
        return false;
    }

    match groups.split_first() {
        None => false,
        Some((_, [])) => true,
        Some((first, rest)) if locale.indian => match rest.split_last() {
            Some((last, middle)) => {
                (1..=2).contains(&first.len())
                    && last.len() == 3
                    && middle.iter().all(|g| g.len() == 2)
            }
            None => true,
        },
        Some((first, rest)) => (1..=3).contains(&first.len()) && rest.iter().all(|g| g.len() == 3),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locale(tag: &str) -> &'static LocaleFormat {
        LOCALES.iter().find(|l| l.tag == tag).unwrap()
    }

    #[test]
    fn test_pattern_compiles() {
        assert!(NUMBER_RE.is_ok());
    }

    #[test]
    fn test_conforms_per_locale() {
        assert!(conforms("1,234,567.89", locale("en-US")));
        assert!(!conforms("1,234,567.89", locale("de-DE")));
        assert!(conforms("1.234.567,89", locale("de-DE")));
        assert!(conforms("1\u{202F}234,5", locale("fr-FR")));
        assert!(conforms("12,34,567.00", locale("en-IN")));
        assert!(!conforms("12,34,567.00", locale("en-US")));
        assert!(!conforms("12.05.2024", locale("de-DE")));
        assert!(!conforms("12.05.2024", locale("en-US")));
    }

    #[tokio::test]
    async fn test_flags_foreign_numbers_with_location() {
        let document = Document::new("doc", "text/plain")
            .with_fragment(1, 0, "Revenue was 1,250,000.50 this year.")
            .with_fragment(2, 120, "Kosten: 3.400,75 EUR, released 12.05.2024");
        let policy = Policy::new("us").with_block(NAME, json!({ "locales": ["en-US"] }));

        let findings = NumericFormatAuditor.audit(&document, &policy).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence.as_deref(), Some("3.400,75"));
        assert_eq!(findings[0].location, Some(Location::new(2, 128)));
        assert!(findings[0].message.contains("de-DE"));
    }

    #[tokio::test]
    async fn test_ambiguous_number_passes_when_any_reading_accepted() {
        let document = Document::new("doc", "text/plain").with_fragment(1, 0, "Ratio 1.234 overall");
        let policy = Policy::new("de").with_block(NAME, json!({ "locales": ["de-DE"] }));
        assert!(NumericFormatAuditor.audit(&document, &policy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_locale_is_config_error() {
        let document = Document::new("doc", "text/plain");
        let policy = Policy::new("x").with_block(NAME, json!({ "locales": ["xx-YY"] }));
        let err = NumericFormatAuditor.audit(&document, &policy).await.unwrap_err();
        assert!(err.to_string().contains("unsupported locale xx-YY"));
    }
}
