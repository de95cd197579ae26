//! Filesystem-backed document and policy collaborators.

use async_trait::async_trait;
use docucheck_audit::{CollaboratorError, DocumentMaterializer, PolicyResolver};
use docucheck_protocol::{Document, Policy, TextFragment};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const PAGE_BREAK: char = '\x0c';

const DOCUMENT_EXTENSIONS: &[(&str, &str)] = &[("txt", "text/plain"), ("md", "text/markdown")];
const POLICY_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
fn check_id(kind: &str, id: &str) -> Result<(), CollaboratorError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CollaboratorError::Invalid(format!("{kind} id {id:?}")))
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, CollaboratorError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CollaboratorError::Unavailable(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}

/// Reads `<root>/<id>.txt` or `<root>/<id>.md`.
pub struct FsDocumentMaterializer {
    root: PathBuf,
}

impl FsDocumentMaterializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentMaterializer for FsDocumentMaterializer {
    async fn materialize(&self, document_id: &str) -> Result<Document, CollaboratorError> {
        check_id("document", document_id)?;

        for (extension, mime_type) in DOCUMENT_EXTENSIONS {
            let path = self.root.join(format!("{document_id}.{extension}"));
            if let Some(content) = read_optional(&path).await? {
                let mut document = Document::new(document_id, *mime_type).with_content_path(&path);
                document.fragments = split_fragments(&content);
                debug!(
                    document_id,
                    pages = document.page_count(),
                    fragments = document.fragments.len(),
                    "Materialized document"
                );
                return Ok(document);
            }
        }
        Err(CollaboratorError::NotFound(format!("document {document_id}")))
    }
}

/// Splits text into pages on form feeds and pages into paragraphs on blank
/// lines. Offsets are byte offsets into the whole text; pages start at 1.
pub fn split_fragments(content: &str) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    let mut page_start = 0;

    for (index, page_text) in content.split(PAGE_BREAK).enumerate() {
        let page = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let mut paragraph: Option<(usize, usize)> = None;
        let mut line_start = 0;

        for line in page_text.split_inclusive('\n') {
            if line.trim().is_empty() {
                if let Some((start, end)) = paragraph.take() {
                    fragments.push(TextFragment {
                        page,
                        offset: page_start + start,
                        text: page_text[start..end].to_string(),
                    });
                }
            } else {
                let end = line_start + line.trim_end().len();
                paragraph = Some(match paragraph {
                    Some((start, _)) => (start, end),
                    None => (line_start, end),
                });
            }
            line_start += line.len();
        }
        if let Some((start, end)) = paragraph {
            fragments.push(TextFragment {
                page,
                offset: page_start + start,
                text: page_text[start..end].to_string(),
            });
        }

        page_start += page_text.len() + PAGE_BREAK.len_utf8();
    }
    fragments
}

/// Reads `<root>/<policy_id>.yaml` (or `.yml`).
pub struct YamlPolicyResolver {
    root: PathBuf,
}

impl YamlPolicyResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PolicyResolver for YamlPolicyResolver {
    async fn resolve(&self, policy_id: &str) -> Result<Policy, CollaboratorError> {
        check_id("policy", policy_id)?;

        for extension in POLICY_EXTENSIONS {
            let path = self.root.join(format!("{policy_id}.{extension}"));
            let Some(content) = read_optional(&path).await? else {
                continue;
            };
            let policy: Policy = serde_yaml::from_str(&content).map_err(|e| {
                CollaboratorError::Invalid(format!("policy {}: {e}", path.display()))
            })?;
            if policy.policy_id != policy_id {
                return Err(CollaboratorError::Invalid(format!(
                    "policy file {} declares policy_id {:?}",
                    path.display(),
                    policy.policy_id
                )));
            }
            return Ok(policy);
        }
        Err(CollaboratorError::NotFound(format!("policy {policy_id}")))
    }
}
