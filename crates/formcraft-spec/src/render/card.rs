use serde_json::{Map, Value, json};

use crate::render::interactive::{Control, EditCell, EditForm, InputKind, Intent};
use crate::render::resolve::OptionMark;

/// Adaptive Card v1.3 transport of the editable form. Rows become column
/// sets weighted by grid span; submit actions carry the [`Intent`] to replay.
pub fn render_card(title: &str, form: &EditForm) -> Value {
    let mut body = vec![json!({
        "type": "TextBlock",
        "text": title,
        "weight": "Bolder",
        "size": "Large",
        "wrap": true,
    })];
    body.extend(form_elements(form));

    json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.3",
        "body": body,
        "actions": [{
            "type": "Action.Submit",
            "title": "Save",
            "data": { "formcraft": { "mode": "submit" } }
        }],
    })
}

fn form_elements(form: &EditForm) -> Vec<Value> {
    form.rows
        .iter()
        .map(|row| {
            if row.cells.len() == 1 {
                return json!({
                    "type": "Container",
                    "items": cell_items(&row.cells[0]),
                });
            }
            let columns = row
                .cells
                .iter()
                .map(|cell| {
                    json!({
                        "type": "Column",
                        "width": cell.placement.span.to_string(),
                        "items": cell_items(cell),
                    })
                })
                .collect::<Vec<_>>();
            json!({ "type": "ColumnSet", "columns": columns })
        })
        .collect()
}

fn cell_items(cell: &EditCell) -> Vec<Value> {
    if let Control::Heading { text } = &cell.control {
        return vec![json!({
            "type": "TextBlock",
            "text": text,
            "weight": "Bolder",
            "size": "Medium",
            "separator": true,
            "wrap": true,
        })];
    }

    let mut items = Vec::new();
    if !matches!(cell.control, Control::Checkbox { .. }) {
        let label = if cell.required {
            format!("{} *", cell.label)
        } else {
            cell.label.clone()
        };
        items.push(json!({ "type": "TextBlock", "text": label, "wrap": true }));
    }
    items.extend(control_items(cell));
    items
}

fn control_items(cell: &EditCell) -> Vec<Value> {
    let id = cell.path.to_string();
    match &cell.control {
        Control::Heading { .. } => Vec::new(),
        Control::Input { input, value } => {
            let mut map = Map::new();
            let kind = match input {
                InputKind::Number => "Input.Number",
                InputKind::Date => "Input.Date",
                InputKind::Text | InputKind::Email => "Input.Text",
            };
            map.insert("type".into(), Value::String(kind.into()));
            map.insert("id".into(), Value::String(id));
            map.insert("isRequired".into(), Value::Bool(cell.required));
            if *input == InputKind::Email {
                map.insert("style".into(), Value::String("Email".into()));
            }
            if !value.is_empty() {
                map.insert("value".into(), Value::String(value.clone()));
            }
            vec![Value::Object(map)]
        }
        Control::TextArea { value } => vec![json!({
            "type": "Input.Text",
            "id": id,
            "isMultiline": true,
            "isRequired": cell.required,
            "value": value,
        })],
        Control::Select { options, value } => vec![choice_set(
            &id,
            options.iter().map(String::as_str),
            value,
            "compact",
            false,
            cell.required,
        )],
        Control::Radio { options } => vec![choice_set(
            &id,
            options.iter().map(|option| option.label.as_str()),
            &joined_selection(options),
            "expanded",
            false,
            cell.required,
        )],
        Control::CheckboxGroup { options } => vec![choice_set(
            &id,
            options.iter().map(|option| option.label.as_str()),
            &joined_selection(options),
            "expanded",
            true,
            cell.required,
        )],
        Control::Checkbox { checked } => vec![json!({
            "type": "Input.Toggle",
            "id": id,
            "title": cell.label,
            "isRequired": cell.required,
            "valueOn": "true",
            "valueOff": "false",
            "value": if *checked { "true" } else { "false" },
        })],
        Control::File { current } => vec![json!({
            "type": "TextBlock",
            "text": match current {
                Some(name) => format!("Attached: {}", name),
                None => "No file attached".to_string(),
            },
            "isSubtle": true,
            "wrap": true,
        })],
        Control::Repeater { entries, add } => {
            let mut items = entries
                .iter()
                .map(|entry| {
                    let mut inner = vec![json!({
                        "type": "TextBlock",
                        "text": format!("#{}", entry.index + 1),
                        "weight": "Bolder",
                    })];
                    inner.extend(form_elements(&entry.form));
                    inner.push(action_set("Remove", &entry.remove));
                    json!({ "type": "Container", "style": "emphasis", "items": inner })
                })
                .collect::<Vec<_>>();
            items.push(action_set("Add", add));
            items
        }
        Control::Table { columns } => {
            let names = columns
                .iter()
                .map(|column| column.name.as_str())
                .collect::<Vec<_>>();
            vec![json!({
                "type": "TextBlock",
                "text": names.join(" | "),
                "fontType": "Monospace",
                "wrap": true,
            })]
        }
    }
}

fn choice_set<'a>(
    id: &str,
    labels: impl Iterator<Item = &'a str>,
    value: &str,
    style: &str,
    multi: bool,
    required: bool,
) -> Value {
    let choices = labels
        .map(|label| json!({ "title": label, "value": label }))
        .collect::<Vec<_>>();
    let mut map = Map::new();
    map.insert("type".into(), Value::String("Input.ChoiceSet".into()));
    map.insert("id".into(), Value::String(id.to_string()));
    map.insert("style".into(), Value::String(style.into()));
    map.insert("isMultiSelect".into(), Value::Bool(multi));
    map.insert("isRequired".into(), Value::Bool(required));
    map.insert("choices".into(), Value::Array(choices));
    if !value.is_empty() {
        map.insert("value".into(), Value::String(value.to_string()));
    }
    Value::Object(map)
}

fn joined_selection(options: &[OptionMark]) -> String {
    options
        .iter()
        .filter(|option| option.selected)
        .map(|option| option.label.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn action_set(title: &str, intent: &Intent) -> Value {
    json!({
        "type": "ActionSet",
        "actions": [{
            "type": "Action.Submit",
            "title": title,
            "data": { "formcraft": { "mode": "intent", "intent": intent } }
        }]
    })
}
