use serde_json::Value;
use tracing::trace;

use crate::answers::AnswerSet;
use crate::spec::field::FieldDefinition;
use crate::spec::rule::{Condition, Operator, VisibilityRule};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Whether `field` should be rendered against `answers`.
pub fn is_visible(field: &FieldDefinition, answers: &AnswerSet) -> bool {
    match &field.visible_if {
        None => true,
        Some(rule) => {
            let visible = rule.holds(answers);
            trace!(field = %field.id, visible, "visibility evaluated");
            visible
        }
    }
}

/// Visibility of every field at one schema level.
pub fn resolve_visibility(schema: &[FieldDefinition], answers: &AnswerSet) -> VisibilityMap {
    schema
        .iter()
        .map(|field| (field.id.clone(), is_visible(field, answers)))
        .collect()
}

impl VisibilityRule {
    /// AND over every condition; an empty list holds.
    pub fn holds(&self, answers: &AnswerSet) -> bool {
        self.conditions()
            .iter()
            .all(|condition| condition.holds(answers))
    }
}

impl Condition {
    pub fn holds(&self, answers: &AnswerSet) -> bool {
        let answer = answers.get(self.field_id());
        let expected = self.value();
        let equals = || {
            matches!((answer, expected), (Some(actual), Some(expected)) if strict_equals(actual, expected))
        };
        match self.operator() {
            Operator::Eq => equals(),
            Operator::Neq => !equals(),
            Operator::In => match (expected.and_then(Value::as_array), answer) {
                (Some(allowed), Some(actual)) => {
                    allowed.iter().any(|item| strict_equals(item, actual))
                }
                _ => false,
            },
            Operator::Contains => match (answer.and_then(Value::as_array), expected) {
                (Some(items), Some(expected)) => {
                    items.iter().any(|item| strict_equals(item, expected))
                }
                _ => false,
            },
            Operator::Present => match answer {
                None | Some(Value::Null) => false,
                Some(Value::String(text)) => !text.is_empty(),
                Some(_) => true,
            },
            Operator::Other(_) => true,
        }
    }
}

/// Identity-style equality: primitives compare by value, numbers
/// numerically, and two compound values are never equal.
fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => false,
    }
}
