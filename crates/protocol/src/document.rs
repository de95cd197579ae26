use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of a fragment or finding inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub page: u32,
    pub offset: usize,
}

impl Location {
    pub fn new(page: u32, offset: usize) -> Self {
        Self { page, offset }
    }
}

/// Extracted text with the page and byte offset it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub page: u32,
    pub offset: usize,
    pub text: String,
}

impl TextFragment {
    pub fn location(&self) -> Location {
        Location::new(self.page, self.offset)
    }
}

/// A materialized upload. Read-only for the whole audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content_path: PathBuf,
    pub mime_type: String,
    #[serde(default)]
    pub fragments: Vec<TextFragment>,
}

impl Document {
    pub fn new(id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_path: PathBuf::new(),
            mime_type: mime_type.into(),
            fragments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = path.into();
        self
    }

    #[must_use]
    pub fn with_fragment(mut self, page: u32, offset: usize, text: impl Into<String>) -> Self {
        self.fragments.push(TextFragment {
            page,
            offset,
            text: text.into(),
        });
        self
    }

    /// All fragment text joined with newlines, in extraction order.
    pub fn full_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_textual(&self) -> bool {
        self.mime_type.starts_with("text/")
            || self.mime_type == "application/pdf"
            || self.mime_type.ends_with("wordprocessingml.document")
    }

    pub fn page_count(&self) -> u32 {
        self.fragments.iter().map(|f| f.page).max().unwrap_or(0)
    }
}
