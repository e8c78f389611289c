use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::answers::AnswerSet;
use crate::layout::{Placement, pack_rows};
use crate::path::{FieldPath, PathSegment};
use crate::render::resolve::{
    OptionMark, ResolvedEntry, ResolvedField, ResolvedValue, flag_text, resolve, selected_labels,
};
use crate::seq;
use crate::spec::field::{FieldDefinition, FieldType, TableColumn};
use crate::visibility::is_visible;

/// Receives every answer change as a top-level `(field_id, value)` pair.
pub trait ChangeSink {
    fn on_change(&mut self, field_id: &str, value: Value);
}

impl<F> ChangeSink for F
where
    F: FnMut(&str, Value),
{
    fn on_change(&mut self, field_id: &str, value: Value) {
        self(field_id, value)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IntentError {
    #[error("intent path is empty or malformed")]
    MalformedPath,
    #[error("no field '{0}' at this level")]
    UnknownField(String),
    #[error("field '{0}' is hidden")]
    Hidden(String),
    #[error("field '{0}' is not a repeater")]
    NotRepeater(String),
    #[error("entry {index} of '{field}' does not exist ({len} entries)")]
    EntryOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("'{action}' is not supported by {kind} field '{field}'")]
    Unsupported {
        field: String,
        kind: String,
        action: &'static str,
    },
}

/// What the user did to a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntentAction {
    Set { value: Value },
    Toggle { option: String },
    AddEntry,
    RemoveEntry { index: usize },
}

impl IntentAction {
    fn name(&self) -> &'static str {
        match self {
            IntentAction::Set { .. } => "set",
            IntentAction::Toggle { .. } => "toggle",
            IntentAction::AddEntry => "add_entry",
            IntentAction::RemoveEntry { .. } => "remove_entry",
        }
    }
}

/// A user interaction addressed to the control bound at `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub path: FieldPath,
    #[serde(flatten)]
    pub action: IntentAction,
}

impl Intent {
    pub fn set(path: FieldPath, value: Value) -> Self {
        Self {
            path,
            action: IntentAction::Set { value },
        }
    }

    pub fn toggle(path: FieldPath, option: impl Into<String>) -> Self {
        Self {
            path,
            action: IntentAction::Toggle {
                option: option.into(),
            },
        }
    }

    pub fn add_entry(path: FieldPath) -> Self {
        Self {
            path,
            action: IntentAction::AddEntry,
        }
    }

    pub fn remove_entry(path: FieldPath, index: usize) -> Self {
        Self {
            path,
            action: IntentAction::RemoveEntry { index },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
    Number,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    Heading {
        text: String,
    },
    Input {
        input: InputKind,
        value: String,
    },
    TextArea {
        value: String,
    },
    Select {
        options: Vec<String>,
        value: String,
    },
    Radio {
        options: Vec<OptionMark>,
    },
    Checkbox {
        checked: bool,
    },
    CheckboxGroup {
        options: Vec<OptionMark>,
    },
    File {
        current: Option<String>,
    },
    Repeater {
        entries: Vec<EditEntry>,
        add: Intent,
    },
    Table {
        columns: Vec<TableColumn>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditEntry {
    pub index: usize,
    pub remove: Intent,
    pub form: EditForm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditCell {
    pub id: String,
    pub path: FieldPath,
    pub label: String,
    pub required: bool,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(flatten)]
    pub control: Control,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRow {
    pub cells: Vec<EditCell>,
}

/// Editable presentation of a schema against one answer snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditForm {
    pub rows: Vec<EditRow>,
}

pub fn render_edit(schema: &[FieldDefinition], answers: &AnswerSet) -> EditForm {
    build_form(resolve(schema, answers))
}

fn build_form(fields: Vec<ResolvedField<'_>>) -> EditForm {
    let cells: Vec<EditCell> = fields.into_iter().map(build_cell).collect();
    let rows = pack_rows(cells, |cell: &EditCell| cell.placement)
        .into_iter()
        .map(|cells| EditRow { cells })
        .collect();
    EditForm { rows }
}

fn build_cell(resolved: ResolvedField<'_>) -> EditCell {
    let field = resolved.field;
    let path = resolved.path;
    let control = match resolved.value {
        ResolvedValue::Heading => Control::Heading {
            text: field.label.clone(),
        },
        ResolvedValue::Scalar { text } => match field.kind {
            FieldType::Textarea => Control::TextArea { value: text },
            FieldType::Email => scalar_input(InputKind::Email, text),
            FieldType::Number => scalar_input(InputKind::Number, text),
            FieldType::Date => scalar_input(InputKind::Date, text),
            _ => scalar_input(InputKind::Text, text),
        },
        ResolvedValue::Choice { text, options } => match field.kind {
            FieldType::Radio => Control::Radio { options },
            _ => Control::Select {
                options: options.into_iter().map(|option| option.label).collect(),
                value: text,
            },
        },
        ResolvedValue::Flag { checked } => Control::Checkbox { checked },
        ResolvedValue::Multi { options } => Control::CheckboxGroup { options },
        ResolvedValue::File { name, .. } => Control::File {
            current: Some(name).filter(|name| !name.is_empty()),
        },
        ResolvedValue::Repeater { entries } => Control::Repeater {
            entries: entries
                .into_iter()
                .map(|entry| build_entry(&path, entry))
                .collect(),
            add: Intent::add_entry(path.clone()),
        },
        ResolvedValue::Table { columns } => Control::Table {
            columns: columns.to_vec(),
        },
    };

    EditCell {
        id: field.id.clone(),
        label: field.label.clone(),
        required: field.required,
        placement: resolved.placement,
        control,
        path,
    }
}

fn scalar_input(input: InputKind, value: String) -> Control {
    Control::Input { input, value }
}

fn build_entry(repeater: &FieldPath, entry: ResolvedEntry<'_>) -> EditEntry {
    EditEntry {
        index: entry.index,
        remove: Intent::remove_entry(repeater.clone(), entry.index),
        form: build_form(entry.fields),
    }
}

impl EditForm {
    pub fn cells(&self) -> impl Iterator<Item = &EditCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    /// Dotted paths of every visible field, depth first.
    pub fn visible_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect(&mut |cell: &EditCell| paths.push(cell.path.to_string()));
        paths
    }

    /// Displayed value per visible field that shows one.
    pub fn displayed_values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        self.collect(&mut |cell: &EditCell| {
            if let Some(text) = cell.control.display() {
                values.insert(cell.path.to_string(), text);
            }
        });
        values
    }

    fn collect(&self, visit: &mut dyn FnMut(&EditCell)) {
        for cell in self.cells() {
            visit(cell);
            if let Control::Repeater { entries, .. } = &cell.control {
                for entry in entries {
                    entry.form.collect(visit);
                }
            }
        }
    }
}

impl Control {
    pub fn display(&self) -> Option<String> {
        match self {
            Control::Input { value, .. }
            | Control::TextArea { value }
            | Control::Select { value, .. } => Some(value.clone()),
            Control::Radio { options } | Control::CheckboxGroup { options } => {
                Some(selected_labels(options))
            }
            Control::Checkbox { checked } => Some(flag_text(*checked).to_string()),
            Control::File { current } => Some(current.clone().unwrap_or_default()),
            Control::Heading { .. } | Control::Repeater { .. } | Control::Table { .. } => None,
        }
    }
}

/// Routes `intent` to `sink`. Changes inside a repeater entry are re-emitted
/// as a replacement of the whole entry sequence under the repeater's id.
pub fn dispatch_intent(
    schema: &[FieldDefinition],
    answers: &AnswerSet,
    intent: &Intent,
    sink: &mut dyn ChangeSink,
) -> Result<(), IntentError> {
    debug!(path = %intent.path, action = intent.action.name(), "dispatching intent");
    route(schema, answers, intent.path.segments(), &intent.action, sink)
}

fn route(
    schema: &[FieldDefinition],
    answers: &AnswerSet,
    steps: &[PathSegment],
    action: &IntentAction,
    sink: &mut dyn ChangeSink,
) -> Result<(), IntentError> {
    let Some((PathSegment::Field(id), rest)) = steps.split_first() else {
        return Err(IntentError::MalformedPath);
    };
    let field = schema
        .iter()
        .find(|field| &field.id == id)
        .ok_or_else(|| IntentError::UnknownField(id.clone()))?;
    if !is_visible(field, answers) {
        return Err(IntentError::Hidden(id.clone()));
    }

    match rest {
        [] => apply_action(field, answers, action, sink),
        [PathSegment::Entry(index), nested @ ..] => {
            if field.kind != FieldType::Repeater {
                return Err(IntentError::NotRepeater(id.clone()));
            }
            let entries = answers.entry_values(id);
            let entry = entries
                .get(*index)
                .cloned()
                .map(AnswerSet::from_value)
                .ok_or(IntentError::EntryOutOfRange {
                    field: id.clone(),
                    index: *index,
                    len: entries.len(),
                })?;
            let mut nested_sink = |sub_id: &str, value: Value| {
                let updated = entry.with(sub_id, value).into_value();
                let replaced = seq::replace_at(entries, *index, updated);
                sink.on_change(id, Value::Array(replaced));
            };
            route(
                field.nested_schema(),
                &entry,
                nested,
                action,
                &mut nested_sink,
            )
        }
        _ => Err(IntentError::MalformedPath),
    }
}

fn apply_action(
    field: &FieldDefinition,
    answers: &AnswerSet,
    action: &IntentAction,
    sink: &mut dyn ChangeSink,
) -> Result<(), IntentError> {
    let unsupported = || IntentError::Unsupported {
        field: field.id.clone(),
        kind: field.kind.to_string(),
        action: action.name(),
    };

    let value = match (action, &field.kind) {
        (
            IntentAction::Set { .. },
            FieldType::Section | FieldType::Table | FieldType::Repeater | FieldType::Other(_),
        ) => return Err(unsupported()),
        (IntentAction::Set { value }, _) => value.clone(),
        (IntentAction::Toggle { option }, FieldType::CheckboxGroup) => {
            let current = answers
                .get(&field.id)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let chosen = Value::String(option.clone());
            if current.contains(&chosen) {
                Value::Array(current.into_iter().filter(|item| item != &chosen).collect())
            } else {
                Value::Array(seq::appended(&current, chosen))
            }
        }
        (IntentAction::AddEntry, FieldType::Repeater) => Value::Array(seq::appended(
            answers.entry_values(&field.id),
            Value::Object(Map::new()),
        )),
        (IntentAction::RemoveEntry { index }, FieldType::Repeater) => {
            let entries = answers.entry_values(&field.id);
            if *index >= entries.len() {
                return Err(IntentError::EntryOutOfRange {
                    field: field.id.clone(),
                    index: *index,
                    len: entries.len(),
                });
            }
            Value::Array(seq::remove_at(entries, *index))
        }
        _ => return Err(unsupported()),
    };

    sink.on_change(&field.id, value);
    Ok(())
}

/// Interactive renderer bound to one answer snapshot and the host's sink.
pub struct InteractiveRenderer<'a, S> {
    schema: &'a [FieldDefinition],
    answers: &'a AnswerSet,
    sink: S,
}

impl<'a, S: ChangeSink> InteractiveRenderer<'a, S> {
    pub fn new(schema: &'a [FieldDefinition], answers: &'a AnswerSet, sink: S) -> Self {
        Self {
            schema,
            answers,
            sink,
        }
    }

    pub fn render(&self) -> EditForm {
        render_edit(self.schema, self.answers)
    }

    pub fn dispatch(&mut self, intent: &Intent) -> Result<(), IntentError> {
        dispatch_intent(self.schema, self.answers, intent, &mut self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<FieldDefinition> {
        serde_json::from_value(json!([
            { "id": "a", "type": "select", "options": ["X", "Y"], "width": "1/2" },
            { "id": "b", "type": "text", "visibleIf": ["a", "eq", "X"], "width": "1/2" },
            { "id": "tags", "type": "checkbox_group", "options": ["p", "q", "r"] },
            { "id": "people", "type": "repeater", "schema": [
                { "id": "name", "type": "text" },
                { "id": "kids", "type": "repeater", "schema": [{ "id": "age", "type": "number" }] }
            ]}
        ]))
        .unwrap()
    }

    fn changes(answers: &AnswerSet, intent: Intent) -> Vec<(String, Value)> {
        let schema = schema();
        let mut seen = Vec::new();
        let mut sink = |id: &str, value: Value| seen.push((id.to_string(), value));
        dispatch_intent(&schema, answers, &intent, &mut sink).expect("dispatch");
        seen
    }

    #[test]
    fn hidden_fields_emit_nothing() {
        let schema = schema();
        let form = render_edit(&schema, &AnswerSet::from_value(json!({ "a": "Y" })));
        assert_eq!(form.visible_paths(), vec!["a", "tags", "people"]);
        assert_eq!(form.rows[0].cells.len(), 1);
    }

    #[test]
    fn half_width_fields_share_a_row() {
        let schema = schema();
        let form = render_edit(&schema, &AnswerSet::from_value(json!({ "a": "X" })));
        assert_eq!(form.rows[0].cells.len(), 2);
        assert_eq!(form.rows[0].cells[1].placement.width_class, "1-2");
    }

    #[test]
    fn toggle_adds_and_removes_preserving_order() {
        let answers = AnswerSet::from_value(json!({ "tags": ["r", "p"] }));
        let seen = changes(&answers, Intent::toggle(FieldPath::root("tags"), "q"));
        assert_eq!(seen, vec![("tags".into(), json!(["r", "p", "q"]))]);
        let seen = changes(&answers, Intent::toggle(FieldPath::root("tags"), "r"));
        assert_eq!(seen, vec![("tags".into(), json!(["p"]))]);
    }

    #[test]
    fn nested_change_replaces_entry_under_repeater_id() {
        let answers = AnswerSet::from_value(json!({
            "people": [{ "name": "Ann" }, { "name": "Bob", "kids": [{ "age": 3 }] }]
        }));
        let path = FieldPath::root("people").entry(1).field("kids").entry(0).field("age");
        let seen = changes(&answers, Intent::set(path, json!(4)));
        assert_eq!(
            seen,
            vec![(
                "people".into(),
                json!([{ "name": "Ann" }, { "name": "Bob", "kids": [{ "age": 4 }] }])
            )]
        );
    }

    #[test]
    fn add_and_remove_entries() {
        let answers = AnswerSet::from_value(json!({ "people": [{ "name": "Ann" }] }));
        let seen = changes(&answers, Intent::add_entry(FieldPath::root("people")));
        assert_eq!(seen[0].1, json!([{ "name": "Ann" }, {}]));
        let seen = changes(&answers, Intent::remove_entry(FieldPath::root("people"), 0));
        assert_eq!(seen[0].1, json!([]));
    }

    #[test]
    fn bad_intents_are_reported() {
        let schema = schema();
        let answers = AnswerSet::new();
        let mut sink = |_: &str, _: Value| {};
        let err = dispatch_intent(
            &schema,
            &answers,
            &Intent::set(FieldPath::root("people").entry(0).field("name"), json!("x")),
            &mut sink,
        );
        assert_eq!(
            err,
            Err(IntentError::EntryOutOfRange {
                field: "people".into(),
                index: 0,
                len: 0
            })
        );
        let err = dispatch_intent(
            &schema,
            &answers,
            &Intent::toggle(FieldPath::root("a"), "X"),
            &mut sink,
        );
        assert!(matches!(err, Err(IntentError::Unsupported { .. })));
        let err = dispatch_intent(
            &schema,
            &answers,
            &Intent::set(FieldPath::root("ghost"), json!(1)),
            &mut sink,
        );
        assert_eq!(err, Err(IntentError::UnknownField("ghost".into())));
    }

    #[test]
    fn hidden_fields_reject_intents() {
        let schema = schema();
        let answers = AnswerSet::from_value(json!({ "a": "Y" }));
        let mut changes = Vec::new();
        let mut sink = |id: &str, value: Value| changes.push((id.to_string(), value));
        let err = dispatch_intent(
            &schema,
            &answers,
            &Intent::set(FieldPath::root("b"), json!("sneaky")),
            &mut sink,
        );
        assert_eq!(err, Err(IntentError::Hidden("b".into())));
        assert!(changes.is_empty());
    }

    #[test]
    fn renderer_forwards_to_host_sink() {
        let schema = schema();
        let answers = AnswerSet::new();
        let mut seen = Vec::new();
        let mut renderer = InteractiveRenderer::new(&schema, &answers, |id: &str, value: Value| {
            seen.push((id.to_string(), value))
        });
        assert!(!renderer.render().rows.is_empty());
        renderer
            .dispatch(&Intent::set(FieldPath::root("a"), json!("X")))
            .expect("dispatch");
        drop(renderer);
        assert_eq!(seen, vec![("a".into(), json!("X"))]);
    }

    #[test]
    fn intents_parse_from_host_json() {
        let intent: Intent = serde_json::from_value(json!({
            "path": ["people", 0, "name"],
            "action": "set",
            "value": "Jane"
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::set(FieldPath::root("people").entry(0).field("name"), json!("Jane"))
        );
    }
}
