#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod editor;
pub mod layout;
pub mod lint;
pub mod options;
pub mod path;
pub mod render;
pub mod seq;
pub mod session;
pub mod spec;
pub mod visibility;

pub use answers::AnswerSet;
pub use answers_schema::generate as answers_schema;
pub use editor::{ConditionSlot, Direction, EditOp, EditorError, FieldPatch, apply_op, edit_nested};
pub use layout::{GRID_COLUMNS, LabelPosition, Placement, pack_rows, placement};
pub use lint::{LintIssue, LintReport, Severity, lint};
pub use options::{PageSize, RenderOptions};
pub use path::{FieldPath, PathSegment};
pub use render::{
    ChangeSink, Document, EditForm, Intent, IntentAction, IntentError, InteractiveRenderer,
    PrintError, dispatch_intent, render_card, render_document_text, render_edit, render_edit_text,
    render_print_html, render_static,
};
pub use session::FormSession;
pub use spec::{
    Condition, FieldDefinition, FieldType, FormSpec, LabelLayout, Operator, SpecError, TableColumn,
    VisibilityRule, Width,
};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};

/// JSON Schema of the schema document wire format (`FormSpec`).
pub fn schema_document_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(FormSpec)).unwrap_or_default()
}
