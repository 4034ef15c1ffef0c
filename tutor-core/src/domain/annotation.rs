//! Retrieval annotations

use serde::{Deserialize, Serialize};

/// A citation linking a span of generated text to a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalAnnotation {
    pub kind: AnnotationKind,
    /// The text in the generated response being cited
    pub cited_text: String,
    /// Identifier of the source file
    pub source_id: String,
    pub start_index: Option<u32>,
    pub end_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    FileCitation,
    FilePath,
}

impl RetrievalAnnotation {
    /// The cited text shortened to at most `max_chars` characters
    pub fn cited_excerpt(&self, max_chars: usize) -> String {
        match self.cited_text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &self.cited_text[..idx]),
            None => self.cited_text.clone(),
        }
    }
}
