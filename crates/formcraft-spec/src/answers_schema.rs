use serde_json::{Map, Value, json};

use crate::spec::field::{FieldDefinition, FieldType};

/// JSON Schema describing the answer set a schema produces.
pub fn generate(schema: &[FieldDefinition]) -> Value {
    let mut object = level_schema(schema);
    if let Value::Object(map) = &mut object {
        map.insert(
            "$schema".into(),
            Value::String("https://json-schema.org/draft/2020-12/schema".into()),
        );
    }
    object
}

fn level_schema(schema: &[FieldDefinition]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in schema {
        let Some(property) = field_schema(field) else {
            continue;
        };
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
        properties.insert(field.id.clone(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": true,
    })
}

fn field_schema(field: &FieldDefinition) -> Option<Value> {
    let mut schema = match &field.kind {
        FieldType::Section | FieldType::Table | FieldType::Other(_) => return None,
        FieldType::Text | FieldType::Textarea => json!({ "type": "string" }),
        FieldType::Email => json!({ "type": "string", "format": "email" }),
        FieldType::Date => json!({ "type": "string", "format": "date" }),
        FieldType::Number => json!({ "type": ["number", "string"] }),
        FieldType::Select | FieldType::Radio => json!({ "type": "string", "enum": field.options }),
        FieldType::Checkbox => json!({ "type": "boolean" }),
        FieldType::CheckboxGroup => json!({
            "type": "array",
            "items": { "type": "string", "enum": field.options },
            "uniqueItems": true,
        }),
        FieldType::File => json!({ "type": ["string", "object"] }),
        FieldType::Repeater => json!({
            "type": "array",
            "items": level_schema(field.nested_schema()),
        }),
    };
    if let Value::Object(map) = &mut schema
        && !field.label.is_empty()
    {
        map.insert("title".into(), Value::String(field.label.clone()));
    }
    Some(schema)
}
