//! Schema contracts
//!
//! A [`SchemaContract`] describes the expected shape of a job's result. The
//! same contract is used to request structured output (field enumeration for
//! inline-format, a strict parameter schema for tool-call) and to validate the
//! result afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use crate::domain::job::{FunctionDefinition, ToolDeclaration};

/// A named structure of typed fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaContract {
    /// Type name, e.g. "LectureSummary"
    pub name: String,
    /// Function name used in tool-call mode
    pub capability: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
}

/// A single field of a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
    pub required: bool,
    pub description: String,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// Value types a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
}

impl FieldType {
    fn json_schema(self) -> JsonValue {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }

    fn matches(self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(JsonValue::is_string)),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::StringList => "list of strings",
        };
        f.write_str(name)
    }
}

/// How unknown fields are treated during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Unknown fields are violations
    #[default]
    Strict,
    /// Unknown fields are accepted and kept
    Loose,
}

/// One reason a value does not satisfy a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    NotAnObject { found: String },
    MissingField { field: String },
    WrongType { field: String, expected: FieldType, found: String },
    UnknownField { field: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { found } => write!(f, "expected a JSON object, found {}", found),
            Self::MissingField { field } => write!(f, "missing required field '{}'", field),
            Self::WrongType {
                field,
                expected,
                found,
            } => write!(f, "field '{}' should be {}, found {}", field, expected, found),
            Self::UnknownField { field } => write!(f, "unexpected field '{}'", field),
        }
    }
}

impl SchemaContract {
    pub fn new(
        name: impl Into<String>,
        capability: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capability: capability.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the contract
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.required)
    }

    /// Strict parameter schema for tool-call mode
    ///
    /// Required fields are the non-optional ones, optional fields accept null
    /// and default to it, and additional properties are disallowed.
    pub fn parameters_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        for field in &self.fields {
            let schema = if field.required {
                let mut schema = field.kind.json_schema();
                schema["description"] = JsonValue::String(field.description.clone());
                schema
            } else {
                json!({
                    "anyOf": [field.kind.json_schema(), { "type": "null" }],
                    "default": null,
                    "description": field.description,
                })
            };
            properties.insert(field.name.clone(), schema);
        }

        let required: Vec<&str> = self.required_fields().map(|f| f.name.as_str()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Function tool declaring this contract as an invokable capability
    pub fn function_tool(&self) -> ToolDeclaration {
        ToolDeclaration::Function {
            function: FunctionDefinition {
                name: self.capability.clone(),
                description: self.description.clone(),
                strict: true,
                parameters: self.parameters_schema(),
            },
        }
    }

    /// Human-readable field enumeration used in inline-format prompts
    ///
    /// e.g. "topic, examples (list), and optionally difficulty"
    pub fn field_summary(&self) -> String {
        fn label(field: &FieldSpec) -> String {
            match field.kind {
                FieldType::StringList => format!("{} (list)", field.name),
                _ => field.name.clone(),
            }
        }

        let required: Vec<String> = self.required_fields().map(label).collect();
        let optional: Vec<String> = self.optional_fields().map(label).collect();

        match (required.is_empty(), optional.is_empty()) {
            (_, true) => required.join(", "),
            (true, false) => format!("optionally {}", optional.join(" and ")),
            (false, false) => format!(
                "{}, and optionally {}",
                required.join(", "),
                optional.join(" and ")
            ),
        }
    }

    /// Validates a parsed value field by field
    ///
    /// All violations are collected rather than stopping at the first one.
    pub fn validate(&self, value: &JsonValue, strictness: Strictness) -> Result<(), Vec<Violation>> {
        let Some(object) = value.as_object() else {
            return Err(vec![Violation::NotAnObject {
                found: json_kind(value).to_string(),
            }]);
        };

        let mut violations = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                None if field.required => violations.push(Violation::MissingField {
                    field: field.name.clone(),
                }),
                None => {}
                Some(JsonValue::Null) if !field.required => {}
                Some(found) if !field.kind.matches(found) => {
                    violations.push(Violation::WrongType {
                        field: field.name.clone(),
                        expected: field.kind,
                        found: json_kind(found).to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        if strictness == Strictness::Strict {
            for key in object.keys() {
                if !self.fields.iter().any(|f| &f.name == key) {
                    violations.push(Violation::UnknownField { field: key.clone() });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
