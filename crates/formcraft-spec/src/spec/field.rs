use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::spec::rule::VisibilityRule;

/// Closed catalog of field types a schema can use.
///
/// Anything outside the catalog is kept as [`FieldType::Other`] so schemas
/// staging experimental types still load; both renderers skip such fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Section,
    Text,
    Email,
    Number,
    Date,
    Textarea,
    Select,
    Radio,
    Checkbox,
    CheckboxGroup,
    File,
    Repeater,
    Table,
    Other(String),
}

impl FieldType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "section" => FieldType::Section,
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "checkbox_group" => FieldType::CheckboxGroup,
            "file" => FieldType::File,
            "repeater" => FieldType::Repeater,
            "table" => FieldType::Table,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Section => "section",
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::CheckboxGroup => "checkbox_group",
            FieldType::File => "file",
            FieldType::Repeater => "repeater",
            FieldType::Table => "table",
            FieldType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Other(_))
    }

    /// Types whose `options` list is meaningful.
    pub fn uses_options(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Radio | FieldType::CheckboxGroup
        )
    }

    /// Single-value types whose label placement follows the `layout` hint.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Email
                | FieldType::Number
                | FieldType::Date
                | FieldType::Textarea
                | FieldType::Select
                | FieldType::Checkbox
                | FieldType::File
        )
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::parse(&value)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout width hint shared by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Width {
    #[default]
    Full,
    Half,
    Third,
    Quarter,
    Sixth,
}

impl Width {
    pub fn as_str(&self) -> &'static str {
        match self {
            Width::Full => "full",
            Width::Half => "1/2",
            Width::Third => "1/3",
            Width::Quarter => "1/4",
            Width::Sixth => "1/6",
        }
    }

    /// CSS-safe class suffix.
    pub fn class(&self) -> &'static str {
        match self {
            Width::Full => "full",
            Width::Half => "1-2",
            Width::Third => "1-3",
            Width::Quarter => "1-4",
            Width::Sixth => "1-6",
        }
    }

    /// Columns occupied on the 12-column grid.
    pub fn span(&self) -> u8 {
        match self {
            Width::Full => 12,
            Width::Half => 6,
            Width::Third => 4,
            Width::Quarter => 3,
            Width::Sixth => 2,
        }
    }
}

impl From<String> for Width {
    fn from(value: String) -> Self {
        match value.trim() {
            "1/2" => Width::Half,
            "1/3" => Width::Third,
            "1/4" => Width::Quarter,
            "1/6" => Width::Sixth,
            _ => Width::Full,
        }
    }
}

impl From<Width> for String {
    fn from(value: Width) -> Self {
        value.as_str().to_string()
    }
}

/// Label placement hint for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LabelLayout {
    Inline,
    Block,
}

/// Static column header of a `table` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableColumn {
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub kind: String,
}

fn default_column_type() -> String {
    "text".into()
}

impl TableColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: default_column_type(),
        }
    }
}

/// One question or unit of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub kind: FieldType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Vec<String>")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "String")]
    pub width: Width,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LabelLayout>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub start_row: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<VisibilityRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<FieldDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<TableColumn>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl FieldDefinition {
    /// Bare field of the given type with every optional attribute unset.
    pub fn new(id: impl Into<String>, kind: FieldType) -> Self {
        Self {
            id: id.into(),
            kind,
            label: String::new(),
            required: false,
            options: Vec::new(),
            width: Width::Full,
            layout: None,
            start_row: false,
            visible_if: None,
            schema: None,
            columns: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema: Vec<FieldDefinition>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_width(mut self, width: Width) -> Self {
        self.width = width;
        self
    }

    pub fn with_visibility(mut self, rule: VisibilityRule) -> Self {
        self.visible_if = Some(rule);
        self
    }

    /// Nested repetition shape; a repeater without one behaves as empty.
    pub fn nested_schema(&self) -> &[FieldDefinition] {
        self.schema.as_deref().unwrap_or(&[])
    }

    pub fn table_columns(&self) -> &[TableColumn] {
        self.columns.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_shape_with_camel_case_keys() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "id": "contact",
            "type": "email",
            "label": "Contact",
            "required": true,
            "options": [],
            "width": "1/3",
            "layout": "inline",
            "startRow": true,
            "visibleIf": ["kind", "eq", "person"]
        }))
        .expect("field");

        assert_eq!(field.kind, FieldType::Email);
        assert_eq!(field.width, Width::Third);
        assert_eq!(field.layout, Some(LabelLayout::Inline));
        assert!(field.start_row);
        assert!(field.visible_if.is_some());
    }

    #[test]
    fn unknown_type_and_width_are_tolerated() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "id": "sig",
            "type": "signature",
            "width": "2/3",
            "options": null
        }))
        .expect("field");

        assert_eq!(field.kind, FieldType::Other("signature".into()));
        assert!(!field.kind.is_known());
        assert_eq!(field.width, Width::Full);
        assert!(field.options.is_empty());

        let back = serde_json::to_value(&field).expect("serialize");
        assert_eq!(back["type"], "signature");
        assert_eq!(back["width"], "full");
    }

    #[test]
    fn null_attributes_fall_back_to_defaults() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "id": "name",
            "type": "text",
            "label": null,
            "required": null,
            "width": null,
            "startRow": null
        }))
        .expect("field");

        assert_eq!(field.label, "");
        assert!(!field.required);
        assert_eq!(field.width, Width::Full);
        assert!(!field.start_row);
    }

    #[test]
    fn repeater_without_schema_is_empty() {
        let field = FieldDefinition::new("items", FieldType::Repeater);
        assert!(field.nested_schema().is_empty());
    }
}
