use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field id -> value mapping for one form instance.
///
/// Mutation always produces a new snapshot (`with`), so a presentation built
/// from one snapshot never observes a half-applied change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Map<String, Value>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object values degrade to an empty answer set.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&Value> {
        self.0.get(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.0.contains_key(field_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New snapshot with `field_id` set to `value`.
    pub fn with(&self, field_id: &str, value: Value) -> Self {
        let mut map = self.0.clone();
        map.insert(field_id.to_string(), value);
        Self(map)
    }

    /// Raw repeater entries; anything other than an array reads as no entries.
    pub fn entry_values(&self, field_id: &str) -> &[Value] {
        self.get(field_id)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Repeater entries as nested answer sets.
    pub fn entries(&self, field_id: &str) -> Vec<AnswerSet> {
        self.entry_values(field_id)
            .iter()
            .cloned()
            .map(AnswerSet::from_value)
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(&self.0)
    }
}

impl From<Map<String, Value>> for AnswerSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<AnswerSet> for Value {
    fn from(answers: AnswerSet) -> Self {
        answers.into_value()
    }
}
