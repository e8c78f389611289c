//! Schema authoring operations.
//!
//! The free functions take one schema level and return a new one; they panic
//! on out-of-range indices because those can only come from a caller bug.
//! Hosts that receive edits as data go through [`apply_op`], which checks
//! every index first and reports an [`EditorError`] instead.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::seq;
use crate::spec::field::{FieldDefinition, FieldType, LabelLayout, TableColumn, Width};
use crate::spec::rule::{Condition, Operator, VisibilityRule};

#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("{what} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("field '{0}' is not a repeater")]
    NotRepeater(String),
    #[error("field '{0}' has no visibility rule")]
    NoVisibilityRule(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Shallow patch merged into a field by [`update`]; unset members are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Width>,
    /// `null` clears the hint.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub layout: Option<Option<LabelLayout>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<TableColumn>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One slot of a `[fieldId, operator, value]` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSlot {
    Field(String),
    Operator(Operator),
    Value(Value),
}

/// A field with type-appropriate defaults and an id unused at this level.
pub fn new_field(schema: &[FieldDefinition], kind: FieldType) -> FieldDefinition {
    let id = next_field_id(schema, &kind);
    let mut field = FieldDefinition::new(id, kind.clone()).with_label(default_label(&kind));
    match kind {
        FieldType::Select | FieldType::Radio => field.options = vec![option_label(0)],
        FieldType::Repeater => field.schema = Some(Vec::new()),
        FieldType::Table => field.columns = Some(vec![TableColumn::new("Column 1")]),
        _ => {}
    }
    field
}

fn next_field_id(schema: &[FieldDefinition], kind: &FieldType) -> String {
    let prefix = kind.as_str();
    (1..)
        .map(|n| format!("{prefix}_{n}"))
        .find(|candidate| schema.iter().all(|field| &field.id != candidate))
        .unwrap_or_else(|| prefix.to_string())
}

fn default_label(kind: &FieldType) -> String {
    match kind {
        FieldType::Section => "New section".into(),
        FieldType::Repeater => "Repeating group".into(),
        FieldType::Table => "Table".into(),
        _ => "Untitled question".into(),
    }
}

fn option_label(position: usize) -> String {
    format!("Option {}", position + 1)
}

pub fn append(schema: &[FieldDefinition], kind: FieldType) -> Vec<FieldDefinition> {
    seq::appended(schema, new_field(schema, kind))
}

pub fn update(schema: &[FieldDefinition], index: usize, patch: &FieldPatch) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        if let Some(id) = &patch.id {
            field.id = id.clone();
        }
        if let Some(kind) = &patch.kind {
            field.kind = kind.clone();
        }
        if let Some(label) = &patch.label {
            field.label = label.clone();
        }
        if let Some(required) = patch.required {
            field.required = required;
        }
        if let Some(options) = &patch.options {
            field.options = options.clone();
        }
        if let Some(width) = patch.width {
            field.width = width;
        }
        if let Some(layout) = patch.layout {
            field.layout = layout;
        }
        if let Some(start_row) = patch.start_row {
            field.start_row = start_row;
        }
        if let Some(columns) = &patch.columns {
            field.columns = Some(columns.clone());
        }
    })
}

pub fn remove(schema: &[FieldDefinition], index: usize) -> Vec<FieldDefinition> {
    seq::remove_at(schema, index)
}

/// Swap with the neighbour; a no-op at either boundary.
pub fn move_field(
    schema: &[FieldDefinition],
    index: usize,
    direction: Direction,
) -> Vec<FieldDefinition> {
    let target = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|next| *next < schema.len()),
    };
    match target {
        Some(target) => seq::swapped(schema, index, target),
        None => {
            assert!(index < schema.len(), "index {index} is out of range");
            schema.to_vec()
        }
    }
}

pub fn add_option(
    schema: &[FieldDefinition],
    index: usize,
    label: Option<String>,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        let label = label.unwrap_or_else(|| option_label(field.options.len()));
        field.options.push(label);
    })
}

pub fn update_option(
    schema: &[FieldDefinition],
    index: usize,
    at: usize,
    label: String,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        field.options = seq::replace_at(&field.options, at, label)
    })
}

pub fn remove_option(schema: &[FieldDefinition], index: usize, at: usize) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        field.options = seq::remove_at(&field.options, at)
    })
}

pub fn set_visibility(
    schema: &[FieldDefinition],
    index: usize,
    rule: VisibilityRule,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| field.visible_if = Some(rule))
}

pub fn clear_visibility(schema: &[FieldDefinition], index: usize) -> Vec<FieldDefinition> {
    modify(schema, index, |field| field.visible_if = None)
}

/// Adds a blank condition, turning a single condition into an AND-list.
pub fn add_condition(schema: &[FieldDefinition], index: usize) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        field.visible_if = Some(match field.visible_if.take() {
            None => VisibilityRule::Single(Condition::default()),
            Some(rule) => {
                VisibilityRule::All(seq::appended(&rule.into_conditions(), Condition::default()))
            }
        });
    })
}

pub fn update_condition(
    schema: &[FieldDefinition],
    index: usize,
    at: usize,
    slot: ConditionSlot,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        let rule = field
            .visible_if
            .take()
            .unwrap_or_else(|| panic!("field '{}' has no visibility rule", field.id));
        let mut condition = rule.conditions()[at].clone();
        match slot {
            ConditionSlot::Field(id) => condition.0 = id,
            ConditionSlot::Operator(operator) => condition.1 = operator,
            ConditionSlot::Value(value) => condition.2 = Some(value),
        }
        field.visible_if = Some(match rule {
            VisibilityRule::Single(_) => VisibilityRule::Single(condition),
            VisibilityRule::All(conditions) => {
                VisibilityRule::All(seq::replace_at(&conditions, at, condition))
            }
        });
    })
}

/// Removing the last condition clears the rule.
pub fn remove_condition(schema: &[FieldDefinition], index: usize, at: usize) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        let rule = field
            .visible_if
            .take()
            .unwrap_or_else(|| panic!("field '{}' has no visibility rule", field.id));
        let remaining = seq::remove_at(rule.conditions(), at);
        field.visible_if = match (rule, remaining.len()) {
            (_, 0) => None,
            (VisibilityRule::Single(_), _) => unreachable!("single rule has one condition"),
            (VisibilityRule::All(_), _) => Some(VisibilityRule::All(remaining)),
        };
    })
}

pub fn add_column(
    schema: &[FieldDefinition],
    index: usize,
    column: Option<TableColumn>,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        let columns = field.table_columns();
        let column =
            column.unwrap_or_else(|| TableColumn::new(format!("Column {}", columns.len() + 1)));
        field.columns = Some(seq::appended(columns, column));
    })
}

pub fn update_column(
    schema: &[FieldDefinition],
    index: usize,
    at: usize,
    column: TableColumn,
) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        field.columns = Some(seq::replace_at(field.table_columns(), at, column))
    })
}

pub fn remove_column(schema: &[FieldDefinition], index: usize, at: usize) -> Vec<FieldDefinition> {
    modify(schema, index, |field| {
        field.columns = Some(seq::remove_at(field.table_columns(), at))
    })
}

/// Applies `edit` to the nested schema reached by following `path` (repeater
/// indices, outermost first). Only the fields along the path are copied.
pub fn edit_nested<F>(schema: &[FieldDefinition], path: &[usize], edit: F) -> Vec<FieldDefinition>
where
    F: FnOnce(&[FieldDefinition]) -> Vec<FieldDefinition>,
{
    match path.split_first() {
        None => edit(schema),
        Some((&index, rest)) => modify(schema, index, |field| {
            assert!(
                field.kind == FieldType::Repeater,
                "field '{}' is not a repeater",
                field.id
            );
            let nested = edit_nested(field.nested_schema(), rest, edit);
            field.schema = Some(nested);
        }),
    }
}

fn modify<F>(schema: &[FieldDefinition], index: usize, change: F) -> Vec<FieldDefinition>
where
    F: FnOnce(&mut FieldDefinition),
{
    let mut field = schema
        .get(index)
        .unwrap_or_else(|| {
            panic!(
                "field index {index} is out of range for a schema of {} fields",
                schema.len()
            )
        })
        .clone();
    change(&mut field);
    seq::replace_at(schema, index, field)
}

/// A schema edit expressed as data.
///
/// `path` selects the nested schema to edit (empty for the top level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    Append {
        #[serde(default)]
        path: Vec<usize>,
        #[serde(rename = "type")]
        kind: FieldType,
    },
    Update {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        patch: FieldPatch,
    },
    Remove {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
    },
    Move {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        direction: Direction,
    },
    AddOption {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        #[serde(default)]
        label: Option<String>,
    },
    UpdateOption {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        at: usize,
        label: String,
    },
    RemoveOption {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        at: usize,
    },
    SetVisibility {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        rule: VisibilityRule,
    },
    ClearVisibility {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
    },
    AddCondition {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
    },
    UpdateCondition {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        #[serde(default)]
        at: usize,
        slot: ConditionSlot,
    },
    RemoveCondition {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        #[serde(default)]
        at: usize,
    },
    AddColumn {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        #[serde(default)]
        column: Option<TableColumn>,
    },
    UpdateColumn {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        at: usize,
        column: TableColumn,
    },
    RemoveColumn {
        #[serde(default)]
        path: Vec<usize>,
        index: usize,
        at: usize,
    },
}

impl EditOp {
    pub fn path(&self) -> &[usize] {
        match self {
            EditOp::Append { path, .. }
            | EditOp::Update { path, .. }
            | EditOp::Remove { path, .. }
            | EditOp::Move { path, .. }
            | EditOp::AddOption { path, .. }
            | EditOp::UpdateOption { path, .. }
            | EditOp::RemoveOption { path, .. }
            | EditOp::SetVisibility { path, .. }
            | EditOp::ClearVisibility { path, .. }
            | EditOp::AddCondition { path, .. }
            | EditOp::UpdateCondition { path, .. }
            | EditOp::RemoveCondition { path, .. }
            | EditOp::AddColumn { path, .. }
            | EditOp::UpdateColumn { path, .. }
            | EditOp::RemoveColumn { path, .. } => path,
        }
    }
}

/// Validates `op` against `schema` and applies it.
pub fn apply_op(schema: &[FieldDefinition], op: &EditOp) -> Result<Vec<FieldDefinition>, EditorError> {
    let level = resolve_level(schema, op.path())?;
    check_op(level, op)?;
    debug!(?op, "applying schema edit");

    let edited = edit_nested(schema, op.path(), |level| match op.clone() {
        EditOp::Append { kind, .. } => append(level, kind),
        EditOp::Update { index, patch, .. } => update(level, index, &patch),
        EditOp::Remove { index, .. } => remove(level, index),
        EditOp::Move {
            index, direction, ..
        } => move_field(level, index, direction),
        EditOp::AddOption { index, label, .. } => add_option(level, index, label),
        EditOp::UpdateOption {
            index, at, label, ..
        } => update_option(level, index, at, label),
        EditOp::RemoveOption { index, at, .. } => remove_option(level, index, at),
        EditOp::SetVisibility { index, rule, .. } => set_visibility(level, index, rule),
        EditOp::ClearVisibility { index, .. } => clear_visibility(level, index),
        EditOp::AddCondition { index, .. } => add_condition(level, index),
        EditOp::UpdateCondition {
            index, at, slot, ..
        } => update_condition(level, index, at, slot),
        EditOp::RemoveCondition { index, at, .. } => remove_condition(level, index, at),
        EditOp::AddColumn { index, column, .. } => add_column(level, index, column),
        EditOp::UpdateColumn {
            index, at, column, ..
        } => update_column(level, index, at, column),
        EditOp::RemoveColumn { index, at, .. } => remove_column(level, index, at),
    });
    Ok(edited)
}

fn resolve_level<'a>(
    schema: &'a [FieldDefinition],
    path: &[usize],
) -> Result<&'a [FieldDefinition], EditorError> {
    path.iter().try_fold(schema, |level, &index| {
        let field = field_at(level, index)?;
        if field.kind == FieldType::Repeater {
            Ok(field.nested_schema())
        } else {
            Err(EditorError::NotRepeater(field.id.clone()))
        }
    })
}

fn field_at(level: &[FieldDefinition], index: usize) -> Result<&FieldDefinition, EditorError> {
    level.get(index).ok_or(EditorError::IndexOutOfRange {
        what: "field",
        index,
        len: level.len(),
    })
}

fn check_within(what: &'static str, index: usize, len: usize) -> Result<(), EditorError> {
    if index < len {
        Ok(())
    } else {
        Err(EditorError::IndexOutOfRange { what, index, len })
    }
}

fn check_condition(field: &FieldDefinition, at: usize) -> Result<(), EditorError> {
    let rule = field
        .visible_if
        .as_ref()
        .ok_or_else(|| EditorError::NoVisibilityRule(field.id.clone()))?;
    check_within("condition", at, rule.conditions().len())
}

fn check_op(level: &[FieldDefinition], op: &EditOp) -> Result<(), EditorError> {
    match op {
        EditOp::Append { .. } => Ok(()),
        EditOp::Update { index, .. }
        | EditOp::Remove { index, .. }
        | EditOp::Move { index, .. }
        | EditOp::AddOption { index, .. }
        | EditOp::SetVisibility { index, .. }
        | EditOp::ClearVisibility { index, .. }
        | EditOp::AddCondition { index, .. }
        | EditOp::AddColumn { index, .. } => field_at(level, *index).map(|_| ()),
        EditOp::UpdateOption { index, at, .. } | EditOp::RemoveOption { index, at, .. } => {
            let field = field_at(level, *index)?;
            check_within("option", *at, field.options.len())
        }
        EditOp::UpdateCondition { index, at, .. } | EditOp::RemoveCondition { index, at, .. } => {
            check_condition(field_at(level, *index)?, *at)
        }
        EditOp::UpdateColumn { index, at, .. } | EditOp::RemoveColumn { index, at, .. } => {
            let field = field_at(level, *index)?;
            check_within("column", *at, field.table_columns().len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("a", FieldType::Text),
            FieldDefinition::new("b", FieldType::Select).with_options(["X"]),
            FieldDefinition::new("c", FieldType::Repeater)
                .with_schema(vec![FieldDefinition::new("name", FieldType::Text)]),
        ]
    }

    #[test]
    fn new_fields_get_type_defaults_and_unique_ids() {
        let schema = append(&[], FieldType::Select);
        assert_eq!(schema[0].id, "select_1");
        assert_eq!(schema[0].options, vec!["Option 1"]);

        let schema = append(&schema, FieldType::Select);
        assert_eq!(schema[1].id, "select_2");

        let repeater = new_field(&schema, FieldType::Repeater);
        assert_eq!(repeater.schema, Some(Vec::new()));
        let checkbox = new_field(&schema, FieldType::Checkbox);
        assert!(checkbox.options.is_empty());
    }

    #[test]
    fn update_merges_only_given_members() {
        let patch = FieldPatch {
            label: Some("Name".into()),
            width: Some(Width::Half),
            ..FieldPatch::default()
        };
        let schema = update(&sample(), 0, &patch);
        assert_eq!(schema[0].label, "Name");
        assert_eq!(schema[0].width, Width::Half);
        assert_eq!(schema[0].kind, FieldType::Text);
        assert_eq!(schema[1], sample()[1]);
    }

    #[test]
    fn patch_null_layout_clears_hint() {
        let patch: FieldPatch = serde_json::from_value(json!({ "layout": null })).unwrap();
        assert_eq!(patch.layout, Some(None));
        let patch: FieldPatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(patch.layout, None);
    }

    #[test]
    fn move_is_noop_at_boundaries() {
        let schema = sample();
        assert_eq!(move_field(&schema, 0, Direction::Up), schema);
        assert_eq!(move_field(&schema, 2, Direction::Down), schema);
        let moved = move_field(&schema, 0, Direction::Down);
        assert_eq!(moved[0].id, "b");
        assert_eq!(moved[1].id, "a");
    }

    #[test]
    fn option_operations_target_one_field() {
        let schema = add_option(&sample(), 1, None);
        assert_eq!(schema[1].options, vec!["X", "Option 2"]);
        let schema = update_option(&schema, 1, 0, "Z".into());
        assert_eq!(schema[1].options, vec!["Z", "Option 2"]);
        let schema = remove_option(&schema, 1, 1);
        assert_eq!(schema[1].options, vec!["Z"]);
    }

    #[test]
    fn condition_slots_edit_independently() {
        let schema = add_condition(&sample(), 0);
        let schema = update_condition(&schema, 0, 0, ConditionSlot::Field("b".into()));
        let schema = update_condition(&schema, 0, 0, ConditionSlot::Value(json!("X")));
        assert_eq!(
            schema[0].visible_if,
            Some(VisibilityRule::Single(Condition::new(
                "b",
                Operator::Eq,
                json!("X")
            )))
        );

        let schema = add_condition(&schema, 0);
        let rule = schema[0].visible_if.as_ref().unwrap();
        assert_eq!(rule.conditions().len(), 2);

        let schema = remove_condition(&schema, 0, 0);
        let schema = remove_condition(&schema, 0, 0);
        assert!(schema[0].visible_if.is_none());
    }

    #[test]
    fn nested_edits_copy_only_the_path() {
        let schema = sample();
        let edited = edit_nested(&schema, &[2], |level| append(level, FieldType::Date));
        assert_eq!(edited[0], schema[0]);
        assert_eq!(edited[1], schema[1]);
        let nested = edited[2].nested_schema();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[1].id, "date_1");
        assert_eq!(schema[2].nested_schema().len(), 1);
    }

    #[test]
    fn apply_op_reports_bad_indices() {
        let schema = sample();
        let op = EditOp::Remove {
            path: vec![],
            index: 7,
        };
        assert_eq!(
            apply_op(&schema, &op),
            Err(EditorError::IndexOutOfRange {
                what: "field",
                index: 7,
                len: 3
            })
        );

        let op = EditOp::Append {
            path: vec![0],
            kind: FieldType::Text,
        };
        assert_eq!(
            apply_op(&schema, &op),
            Err(EditorError::NotRepeater("a".into()))
        );

        let op = EditOp::UpdateCondition {
            path: vec![],
            index: 0,
            at: 0,
            slot: ConditionSlot::Field("b".into()),
        };
        assert_eq!(
            apply_op(&schema, &op),
            Err(EditorError::NoVisibilityRule("a".into()))
        );
    }

    #[test]
    fn apply_op_parses_from_json() {
        let op: EditOp = serde_json::from_value(json!({
            "op": "append",
            "path": [2],
            "type": "checkbox_group"
        }))
        .unwrap();
        let schema = apply_op(&sample(), &op).expect("edit");
        assert_eq!(schema[2].nested_schema()[1].kind, FieldType::CheckboxGroup);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn direct_ops_fail_loudly() {
        let _ = remove(&sample(), 3);
    }
}
