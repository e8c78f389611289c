use std::collections::BTreeMap;

use serde::Serialize;

use crate::answers::AnswerSet;
use crate::layout::{Placement, pack_rows};
use crate::options::RenderOptions;
use crate::path::FieldPath;
use crate::render::resolve::{
    OptionMark, ResolvedField, ResolvedValue, flag_text, resolve, resolve_scope, selected_labels,
};
use crate::spec::field::{FieldDefinition, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkStyle {
    /// Square box, several may be filled.
    Box,
    /// Round bullet, at most one filled.
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "content", rename_all = "snake_case")]
pub enum Content {
    Heading {
        text: String,
    },
    Text {
        value: String,
        multiline: bool,
    },
    Marks {
        style: MarkStyle,
        options: Vec<OptionMark>,
    },
    Checkbox {
        checked: bool,
    },
    File {
        name: String,
    },
    Repeater {
        entries: Vec<DocEntry>,
    },
    Table {
        columns: Vec<String>,
        blank_rows: usize,
    },
}

/// One repetition; `placeholder` entries are blank paper rows, not answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocEntry {
    pub index: usize,
    pub placeholder: bool,
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocCell {
    pub id: String,
    pub path: FieldPath,
    pub label: String,
    pub required: bool,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(flatten)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocRow {
    pub cells: Vec<DocCell>,
}

/// Read-only presentation; depends only on the schema, the answers, and
/// the options, so it prints the same every time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub rows: Vec<DocRow>,
}

pub fn render_static(
    schema: &[FieldDefinition],
    answers: &AnswerSet,
    options: &RenderOptions,
) -> Document {
    build_document(resolve(schema, answers), options)
}

fn build_document(fields: Vec<ResolvedField<'_>>, options: &RenderOptions) -> Document {
    let cells: Vec<DocCell> = fields
        .into_iter()
        .map(|field| build_cell(field, options))
        .collect();
    let rows = pack_rows(cells, |cell: &DocCell| cell.placement)
        .into_iter()
        .map(|cells| DocRow { cells })
        .collect();
    Document { rows }
}

fn build_cell(resolved: ResolvedField<'_>, options: &RenderOptions) -> DocCell {
    let field = resolved.field;
    let content = match resolved.value {
        ResolvedValue::Heading => Content::Heading {
            text: field.label.clone(),
        },
        ResolvedValue::Scalar { text } => Content::Text {
            value: text,
            multiline: field.kind == FieldType::Textarea,
        },
        ResolvedValue::Choice { text, options } => match field.kind {
            FieldType::Radio => Content::Marks {
                style: MarkStyle::Circle,
                options,
            },
            _ => Content::Text {
                value: text,
                multiline: false,
            },
        },
        ResolvedValue::Flag { checked } => Content::Checkbox { checked },
        ResolvedValue::Multi { options } => Content::Marks {
            style: MarkStyle::Box,
            options,
        },
        ResolvedValue::File { name, .. } => Content::File { name },
        ResolvedValue::Repeater { entries } if entries.is_empty() => Content::Repeater {
            entries: placeholder_entries(field, &resolved.path, options),
        },
        ResolvedValue::Repeater { entries } => Content::Repeater {
            entries: entries
                .into_iter()
                .map(|entry| DocEntry {
                    index: entry.index,
                    placeholder: false,
                    document: build_document(entry.fields, options),
                })
                .collect(),
        },
        ResolvedValue::Table { columns } => Content::Table {
            columns: columns.iter().map(|column| column.name.clone()).collect(),
            blank_rows: options.table_rows,
        },
    };

    DocCell {
        id: field.id.clone(),
        path: resolved.path,
        label: field.label.clone(),
        required: field.required,
        placement: resolved.placement,
        content,
    }
}

fn placeholder_entries(
    field: &FieldDefinition,
    path: &FieldPath,
    options: &RenderOptions,
) -> Vec<DocEntry> {
    let blank = AnswerSet::new();
    (0..options.placeholder_rows)
        .map(|index| {
            let fields = resolve_scope(field.nested_schema(), &blank, &path.entry(index));
            DocEntry {
                index,
                placeholder: true,
                document: build_document(fields, options),
            }
        })
        .collect()
}

impl Document {
    pub fn cells(&self) -> impl Iterator<Item = &DocCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    /// Dotted paths of every visible answer-bound field; placeholder rows
    /// are skipped.
    pub fn visible_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect(&mut |cell: &DocCell| paths.push(cell.path.to_string()));
        paths
    }

    pub fn displayed_values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        self.collect(&mut |cell: &DocCell| {
            if let Some(text) = cell.content.display() {
                values.insert(cell.path.to_string(), text);
            }
        });
        values
    }

    fn collect(&self, visit: &mut dyn FnMut(&DocCell)) {
        for cell in self.cells() {
            visit(cell);
            if let Content::Repeater { entries } = &cell.content {
                for entry in entries.iter().filter(|entry| !entry.placeholder) {
                    entry.document.collect(visit);
                }
            }
        }
    }
}

impl Content {
    pub fn display(&self) -> Option<String> {
        match self {
            Content::Text { value, .. } => Some(value.clone()),
            Content::Marks { options, .. } => Some(selected_labels(options)),
            Content::Checkbox { checked } => Some(flag_text(*checked).to_string()),
            Content::File { name } => Some(name.clone()),
            Content::Heading { .. } | Content::Repeater { .. } | Content::Table { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<FieldDefinition> {
        serde_json::from_value(json!([
            { "id": "color", "type": "radio", "options": ["red", "blue"] },
            { "id": "notes", "type": "textarea" },
            { "id": "grid", "type": "table", "columns": [{ "name": "Date" }, { "name": "Dose" }] },
            { "id": "meds", "type": "repeater", "schema": [{ "id": "drug", "type": "text" }] }
        ]))
        .unwrap()
    }

    fn cell<'a>(doc: &'a Document, id: &str) -> &'a DocCell {
        doc.cells().find(|cell| cell.id == id).expect("cell")
    }

    #[test]
    fn radio_prints_every_option_with_a_mark() {
        let schema = schema();
        let doc = render_static(
            &schema,
            &AnswerSet::from_value(json!({ "color": "blue" })),
            &RenderOptions::default(),
        );
        let Content::Marks { style, options } = &cell(&doc, "color").content else {
            panic!("expected marks");
        };
        assert_eq!(*style, MarkStyle::Circle);
        assert_eq!(
            options
                .iter()
                .map(|option| option.selected)
                .collect::<Vec<_>>(),
            vec![false, true]
        );
    }

    #[test]
    fn empty_repeater_prints_placeholder_rows() {
        let schema = schema();
        let options = RenderOptions {
            placeholder_rows: 2,
            ..RenderOptions::default()
        };
        let doc = render_static(&schema, &AnswerSet::new(), &options);
        let Content::Repeater { entries } = &cell(&doc, "meds").content else {
            panic!("expected repeater");
        };
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.placeholder));
        assert!(!doc.visible_paths().iter().any(|path| path.starts_with("meds[")));
    }

    #[test]
    fn stored_entries_print_exactly() {
        let schema = schema();
        let answers = AnswerSet::from_value(json!({ "meds": [{ "drug": "aspirin" }] }));
        let doc = render_static(&schema, &answers, &RenderOptions::default());
        let Content::Repeater { entries } = &cell(&doc, "meds").content else {
            panic!("expected repeater");
        };
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].placeholder);
        assert_eq!(
            doc.displayed_values().get("meds[0].drug").map(String::as_str),
            Some("aspirin")
        );
    }

    #[test]
    fn table_prints_header_and_blank_rows() {
        let schema = schema();
        let doc = render_static(&schema, &AnswerSet::new(), &RenderOptions::default());
        assert_eq!(
            cell(&doc, "grid").content,
            Content::Table {
                columns: vec!["Date".into(), "Dose".into()],
                blank_rows: 5
            }
        );
    }
}
