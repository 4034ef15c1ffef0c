//! Message DTOs

use serde::{Deserialize, Serialize};

use crate::domain::annotation::{AnnotationKind, RetrievalAnnotation};
use crate::domain::trace::{Role, TextSegment, TraceMessage};

/// A message in a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: Vec<MessageContent>,
    pub run_id: Option<String>,
    pub created_at: i64,
}

/// A content block of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Citation attached to a span of text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    FileCitation {
        text: String,
        file_citation: FileReference,
        start_index: Option<u32>,
        end_index: Option<u32>,
    },
    FilePath {
        text: String,
        file_path: FileReference,
        start_index: Option<u32>,
        end_index: Option<u32>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReference {
    pub file_id: String,
}

impl Annotation {
    /// Converts into a retrieval annotation; annotations without a source file are dropped
    pub fn into_retrieval(self) -> Option<RetrievalAnnotation> {
        match self {
            Annotation::FileCitation {
                text,
                file_citation,
                start_index,
                end_index,
            } => Some(RetrievalAnnotation {
                kind: AnnotationKind::FileCitation,
                cited_text: text,
                source_id: file_citation.file_id,
                start_index,
                end_index,
            }),
            Annotation::FilePath {
                text,
                file_path,
                start_index,
                end_index,
            } => Some(RetrievalAnnotation {
                kind: AnnotationKind::FilePath,
                cited_text: text,
                source_id: file_path.file_id,
                start_index,
                end_index,
            }),
            Annotation::Other => None,
        }
    }
}

impl From<Message> for TraceMessage {
    fn from(message: Message) -> Self {
        let segments = message
            .content
            .into_iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(TextSegment {
                    text: text.value,
                    annotations: text
                        .annotations
                        .into_iter()
                        .filter_map(Annotation::into_retrieval)
                        .collect(),
                }),
                MessageContent::Other => None,
            })
            .collect();

        TraceMessage {
            id: message.id,
            role: message.role,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_with_citations_decodes() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "id": "msg_abc123",
            "object": "thread.message",
            "created_at": 1699017614,
            "thread_id": "thread_abc123",
            "role": "assistant",
            "run_id": "run_abc123",
            "content": [
                {
                    "type": "text",
                    "text": {
                        "value": "KMP runs in O(n + m) time【4:0†kmp.pdf】.",
                        "annotations": [
                            {
                                "type": "file_citation",
                                "text": "【4:0†kmp.pdf】",
                                "start_index": 26,
                                "end_index": 39,
                                "file_citation": {"file_id": "file-abc"}
                            }
                        ]
                    }
                },
                {"type": "image_file", "image_file": {"file_id": "file-img"}},
                {"type": "text", "text": {"value": " Preprocessing is O(m).", "annotations": []}}
            ]
        }))
        .unwrap();

        let trace: TraceMessage = message.into();
        assert_eq!(trace.role, Role::Assistant);
        assert_eq!(trace.segments.len(), 2);
        assert_eq!(
            trace.text(),
            "KMP runs in O(n + m) time【4:0†kmp.pdf】. Preprocessing is O(m)."
        );

        let annotations: Vec<_> = trace.annotations().collect();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].source_id, "file-abc");
        assert_eq!(annotations[0].start_index, Some(26));
    }

    #[test]
    fn test_file_path_annotation() {
        let annotation: Annotation = serde_json::from_value(serde_json::json!({
            "type": "file_path",
            "text": "sandbox:/mnt/data/out.csv",
            "file_path": {"file_id": "file-out"},
            "start_index": 0,
            "end_index": 25
        }))
        .unwrap();

        let retrieval = annotation.into_retrieval().unwrap();
        assert_eq!(retrieval.kind, AnnotationKind::FilePath);
        assert_eq!(retrieval.source_id, "file-out");
    }
}
