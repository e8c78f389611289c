use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::spec::field::FieldDefinition;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("schema document is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("schema document has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("schema document must be an array of fields or an object with `fields`")]
    NotADocument,
}

/// A questionnaire: an ordered field schema plus the metadata printed above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

fn default_id() -> String {
    "form".into()
}

fn default_title() -> String {
    "Untitled form".into()
}

impl FormSpec {
    pub fn from_fields(fields: Vec<FieldDefinition>) -> Self {
        Self {
            id: default_id(),
            title: default_title(),
            description: None,
            fields,
        }
    }

    /// Accepts either a bare `FieldDefinition[]` or the `{ id, title, fields }` envelope.
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(raw).map_err(SpecError::Json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(Self::from_fields)
                .map_err(SpecError::Shape),
            Value::Object(_) => serde_json::from_value(value).map_err(SpecError::Shape),
            _ => Err(SpecError::NotADocument),
        }
    }
}
