use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Comparison used by a visibility condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Neq,
    In,
    Contains,
    Present,
    /// Not understood by this build; always holds.
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::In => "in",
            Operator::Contains => "contains",
            Operator::Present => "present",
            Operator::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Other(_))
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "in" => Operator::In,
            "contains" => Operator::Contains,
            "present" => Operator::Present,
            _ => Operator::Other(value),
        }
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[fieldId, operator, value]`; the value may be omitted for `present`.
///
/// An omitted value is `None` and differs from an explicit `null`: it is
/// never equal to, in, or contained by any answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition(
    pub String,
    #[schemars(with = "String")] pub Operator,
    #[serde(
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub Option<Value>,
);

fn explicit_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Condition {
    pub fn new(field_id: impl Into<String>, operator: Operator, value: Value) -> Self {
        Condition(field_id.into(), operator, Some(value))
    }

    pub fn field_id(&self) -> &str {
        &self.0
    }

    pub fn operator(&self) -> &Operator {
        &self.1
    }

    pub fn value(&self) -> Option<&Value> {
        self.2.as_ref()
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition(String::new(), Operator::Eq, Some(Value::String(String::new())))
    }
}

/// A single condition or an AND-list of conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum VisibilityRule {
    Single(Condition),
    All(Vec<Condition>),
}

impl VisibilityRule {
    pub fn conditions(&self) -> &[Condition] {
        match self {
            VisibilityRule::Single(condition) => std::slice::from_ref(condition),
            VisibilityRule::All(conditions) => conditions,
        }
    }

    pub fn into_conditions(self) -> Vec<Condition> {
        match self {
            VisibilityRule::Single(condition) => vec![condition],
            VisibilityRule::All(conditions) => conditions,
        }
    }
}

impl From<Condition> for VisibilityRule {
    fn from(condition: Condition) -> Self {
        VisibilityRule::Single(condition)
    }
}
