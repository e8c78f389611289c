use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Entry(usize),
    Field(String),
}

/// Location of a field inside an answer set, e.g. `["items", 0, "name"]`.
///
/// Field ids and repeater entry positions alternate, starting with a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root(field_id: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(field_id.into())])
    }

    pub fn field(&self, field_id: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(field_id.into()));
        Self(segments)
    }

    pub fn entry(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Entry(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(id) if position == 0 => write!(f, "{id}")?,
                PathSegment::Field(id) => write!(f, ".{id}")?,
                PathSegment::Entry(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
