//! Lecture summary contract
//!
//! The structure the structured-output lab asks the assistant to produce.

use serde::{Deserialize, Serialize};
use tutor_core::domain::schema::{FieldSpec, FieldType, SchemaContract};

/// Structured explanation of a lecture topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureSummary {
    pub topic: String,
    pub explanation: String,
    pub examples: Vec<String>,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

/// Function name the assistant invokes in tool-call mode
pub const CAPABILITY: &str = "summarize_lecture_topic";

/// Schema contract matching [`LectureSummary`]
pub fn contract() -> SchemaContract {
    SchemaContract::new(
        "LectureSummary",
        CAPABILITY,
        "Summarizes a lecture topic providing explanation, examples, key points, and optionally difficulty and resources.",
    )
    .field(FieldSpec::required(
        "topic",
        FieldType::String,
        "The name of the topic being explained",
    ))
    .field(FieldSpec::required(
        "explanation",
        FieldType::String,
        "Simple and clear explanation of the topic",
    ))
    .field(FieldSpec::required(
        "examples",
        FieldType::StringList,
        "Practical examples related to the topic",
    ))
    .field(FieldSpec::required(
        "key_points",
        FieldType::StringList,
        "Main takeaways or important ideas",
    ))
    .field(FieldSpec::optional(
        "difficulty",
        FieldType::String,
        "Difficulty level: Beginner, Intermediate, or Advanced",
    ))
    .field(FieldSpec::optional(
        "resources",
        FieldType::StringList,
        "Suggested resources to learn more",
    ))
}
