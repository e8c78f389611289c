//! Visibility and value selection shared by the interactive and static
//! renderers. Both presentations are thin adapters over [`ResolvedField`],
//! which is what keeps their visible fields and displayed values identical.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::answers::AnswerSet;
use crate::layout::{Placement, placement};
use crate::path::FieldPath;
use crate::spec::field::{FieldDefinition, FieldType, TableColumn};
use crate::visibility::is_visible;

/// One option of a choice field and whether the stored answer selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionMark {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue<'a> {
    Heading,
    /// text, email, number, date, textarea.
    Scalar { text: String },
    /// select and radio; `text` is the stored option label.
    Choice {
        text: String,
        options: Vec<OptionMark>,
    },
    Flag { checked: bool },
    Multi { options: Vec<OptionMark> },
    File { name: String, handle: Value },
    Repeater { entries: Vec<ResolvedEntry<'a>> },
    Table { columns: &'a [TableColumn] },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry<'a> {
    pub index: usize,
    pub path: FieldPath,
    pub fields: Vec<ResolvedField<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField<'a> {
    pub field: &'a FieldDefinition,
    pub path: FieldPath,
    pub placement: Placement,
    pub value: ResolvedValue<'a>,
}

/// Visible, renderable fields of `schema` in schema order.
pub fn resolve<'a>(schema: &'a [FieldDefinition], answers: &AnswerSet) -> Vec<ResolvedField<'a>> {
    resolve_scope(schema, answers, &FieldPath::default())
}

/// Same as [`resolve`] for a nested scope whose paths start at `scope`.
pub fn resolve_scope<'a>(
    schema: &'a [FieldDefinition],
    answers: &AnswerSet,
    scope: &FieldPath,
) -> Vec<ResolvedField<'a>> {
    schema
        .iter()
        .filter(|field| is_visible(field, answers))
        .filter_map(|field| {
            let path = scope.field(field.id.clone());
            let value = resolve_value(field, answers, &path)?;
            Some(ResolvedField {
                field,
                path,
                placement: placement(field),
                value,
            })
        })
        .collect()
}

fn resolve_value<'a>(
    field: &'a FieldDefinition,
    answers: &AnswerSet,
    path: &FieldPath,
) -> Option<ResolvedValue<'a>> {
    let stored = answers.get(&field.id);
    let value = match &field.kind {
        FieldType::Section => ResolvedValue::Heading,
        FieldType::Text
        | FieldType::Email
        | FieldType::Number
        | FieldType::Date
        | FieldType::Textarea => ResolvedValue::Scalar {
            text: display_text(stored),
        },
        FieldType::Select | FieldType::Radio => {
            let text = display_text(stored);
            let options = marks(field, |option| option == text);
            ResolvedValue::Choice { text, options }
        }
        FieldType::Checkbox => ResolvedValue::Flag {
            checked: stored.and_then(Value::as_bool).unwrap_or(false),
        },
        FieldType::CheckboxGroup => {
            let chosen = stored.and_then(Value::as_array).cloned().unwrap_or_default();
            let options = marks(field, |option| {
                chosen.iter().any(|item| item.as_str() == Some(option))
            });
            ResolvedValue::Multi { options }
        }
        FieldType::File => ResolvedValue::File {
            name: file_name(stored),
            handle: stored.cloned().unwrap_or(Value::Null),
        },
        FieldType::Repeater => {
            if field.schema.is_none() {
                debug!(field = %field.id, "repeater has no nested schema; rendering empty");
            }
            let entries = answers
                .entries(&field.id)
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    let entry_path = path.entry(index);
                    ResolvedEntry {
                        index,
                        fields: resolve_scope(field.nested_schema(), &entry, &entry_path),
                        path: entry_path,
                    }
                })
                .collect();
            ResolvedValue::Repeater { entries }
        }
        FieldType::Table => ResolvedValue::Table {
            columns: field.table_columns(),
        },
        FieldType::Other(kind) => {
            debug!(field = %field.id, kind = %kind, "skipping field of unknown type");
            return None;
        }
    };
    Some(value)
}

fn marks(field: &FieldDefinition, selected: impl Fn(&str) -> bool) -> Vec<OptionMark> {
    if field.options.is_empty() {
        debug!(field = %field.id, "choice field has no options");
    }
    field
        .options
        .iter()
        .map(|label| OptionMark {
            label: label.clone(),
            selected: selected(label),
        })
        .collect()
}

/// Literal text shown for a stored scalar; absent reads as empty.
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Name of an opaque file handle: the string itself or its `name` member.
fn file_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(reference)) => reference.clone(),
        Some(Value::Object(handle)) => handle
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

impl ResolvedValue<'_> {
    /// Value as shown to the reader, for fields that display one.
    pub fn display(&self) -> Option<String> {
        match self {
            ResolvedValue::Scalar { text } | ResolvedValue::Choice { text, .. } => {
                Some(text.clone())
            }
            ResolvedValue::Flag { checked } => Some(flag_text(*checked).to_string()),
            ResolvedValue::Multi { options } => Some(selected_labels(options)),
            ResolvedValue::File { name, .. } => Some(name.clone()),
            ResolvedValue::Heading
            | ResolvedValue::Repeater { .. }
            | ResolvedValue::Table { .. } => None,
        }
    }
}

pub(crate) fn flag_text(checked: bool) -> &'static str {
    if checked { "Yes" } else { "No" }
}

pub(crate) fn selected_labels(options: &[OptionMark]) -> String {
    options
        .iter()
        .filter(|option| option.selected)
        .map(|option| option.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
