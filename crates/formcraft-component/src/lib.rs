use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use formcraft_spec::{
    AnswerSet, EditOp, EditorError, FormSpec, Intent, IntentError, PrintError, RenderOptions,
    SpecError, answers_schema, apply_op, dispatch_intent, lint,
    render_card as fc_render_card, render_document_text, render_edit as fc_render_edit,
    render_edit_text as fc_render_edit_text, render_print_html, render_static,
    schema_document_json_schema,
};

const DEFAULT_SCHEMA: &str = include_str!("../../formcraft-spec/tests/fixtures/intake_form.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse {what}: {source}")]
    Payload {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema rejected: {0}")]
    Spec(#[from] SpecError),
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("intent rejected: {0}")]
    Intent(#[from] IntentError),
    #[error("edit rejected: {0}")]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Print(#[from] PrintError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    schema_json: Option<String>,
    #[serde(default)]
    options: RenderOptions,
}

fn load_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
    }
}

fn ensure_form(form_id: &str, config: &ComponentConfig) -> Result<FormSpec, ComponentError> {
    let raw = config.schema_json.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let spec = FormSpec::from_json(raw)?;
    if spec.id != form_id {
        Err(ComponentError::FormUnavailable(form_id.to_string()))
    } else {
        Ok(spec)
    }
}

fn load(form_id: &str, config_json: &str) -> Result<(FormSpec, RenderOptions), ComponentError> {
    let config = load_config(config_json)?;
    let spec = ensure_form(form_id, &config)?;
    Ok((spec, config.options))
}

fn parse_answers(answers_json: &str) -> AnswerSet {
    match serde_json::from_str::<Value>(answers_json) {
        Ok(value) => AnswerSet::from_value(value),
        Err(error) => {
            debug!(%error, "answers are not valid JSON; starting from an empty set");
            AnswerSet::new()
        }
    }
}

fn parse_payload<T: for<'de> Deserialize<'de>>(
    what: &'static str,
    raw: &str,
) -> Result<T, ComponentError> {
    serde_json::from_str(raw).map_err(|source| ComponentError::Payload { what, source })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(load(form_id, config_json).and_then(|(spec, _)| encode(&spec)))
}

/// JSON Schema of the schema document format itself.
pub fn document_schema() -> String {
    respond(Ok(schema_document_json_schema()))
}

pub fn lint_schema(form_id: &str, config_json: &str) -> String {
    respond(load(form_id, config_json).and_then(|(spec, _)| encode(&lint(&spec.fields))))
}

pub fn get_answers_schema(form_id: &str, config_json: &str) -> String {
    respond(load(form_id, config_json).map(|(spec, _)| answers_schema(&spec.fields)))
}

pub fn render_edit(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(load(form_id, config_json).and_then(|(spec, _)| {
        let answers = parse_answers(answers_json);
        let form = encode(&fc_render_edit(&spec.fields, &answers))?;
        Ok(json!({ "form_id": spec.id, "title": spec.title, "form": form }))
    }))
}

pub fn render_view(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(load(form_id, config_json).and_then(|(spec, options)| {
        let answers = parse_answers(answers_json);
        let document = encode(&render_static(&spec.fields, &answers, &options))?;
        Ok(json!({
            "form_id": spec.id,
            "title": spec.title,
            "description": spec.description,
            "document": document,
        }))
    }))
}

pub fn render_edit_text(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond_string(load(form_id, config_json).map(|(spec, _)| {
        let answers = parse_answers(answers_json);
        fc_render_edit_text(&spec.title, &fc_render_edit(&spec.fields, &answers))
    }))
}

pub fn render_view_text(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond_string(load(form_id, config_json).map(|(spec, options)| {
        let answers = parse_answers(answers_json);
        let document = render_static(&spec.fields, &answers, &options);
        render_document_text(&spec.title, spec.description.as_deref(), &document)
    }))
}

pub fn render_card(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(load(form_id, config_json).map(|(spec, _)| {
        let answers = parse_answers(answers_json);
        fc_render_card(&spec.title, &fc_render_edit(&spec.fields, &answers))
    }))
}

pub fn render_print(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond_string(load(form_id, config_json).and_then(|(spec, options)| {
        let answers = parse_answers(answers_json);
        let document = render_static(&spec.fields, &answers, &options);
        Ok(render_print_html(
            &spec.title,
            spec.description.as_deref(),
            &document,
            &options,
        )?)
    }))
}

/// Replays a host intent. The response lists every top-level change in the
/// order it was emitted, the updated answers, and the re-rendered form.
pub fn apply_intent(
    form_id: &str,
    config_json: &str,
    answers_json: &str,
    intent_json: &str,
) -> String {
    respond(load(form_id, config_json).and_then(|(spec, _)| {
        let answers = parse_answers(answers_json);
        let intent: Intent = parse_payload("intent", intent_json)?;

        let mut next = answers.clone();
        let mut changes = Vec::new();
        let mut sink = |field_id: &str, value: Value| {
            let mut change = Map::new();
            change.insert("field_id".into(), Value::String(field_id.to_string()));
            change.insert("value".into(), value.clone());
            changes.push(Value::Object(change));
            next = next.with(field_id, value);
        };
        dispatch_intent(&spec.fields, &answers, &intent, &mut sink)?;

        let form = encode(&fc_render_edit(&spec.fields, &next))?;
        Ok(json!({
            "changes": changes,
            "answers": next.into_value(),
            "form": form,
        }))
    }))
}

/// Applies one checked edit operation and returns the updated schema document.
pub fn edit_schema(form_id: &str, config_json: &str, op_json: &str) -> String {
    respond(load(form_id, config_json).and_then(|(mut spec, _)| {
        let op: EditOp = parse_payload("edit op", op_json)?;
        spec.fields = apply_op(&spec.fields, &op)?;
        encode(&spec)
    }))
}
