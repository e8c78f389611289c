use std::fmt::Write as _;
use std::io::{self, Write};

use formcraft_spec::{AnswerSet, FieldDefinition, FieldType, FormSpec, is_visible};
use formcraft_spec::render::display_text;
use serde_json::{Number, Value};
use tracing::debug;

use crate::CliResult;

/// User-facing parse failure plus an optional hint on the expected format.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Prints headers, prompts, and the final answer set.
pub struct WizardPresenter {
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(show_answers_json: bool) -> Self {
        Self { show_answers_json }
    }

    pub fn show_header(&self, spec: &FormSpec) {
        println!("Form: {}", spec.title);
        if let Some(description) = &spec.description {
            println!("{}", description);
        }
    }

    fn show_section(&self, field: &FieldDefinition, depth: usize) {
        println!();
        println!("{}== {} ==", indent(depth), field.label);
    }

    fn show_prompt(&self, field: &FieldDefinition, depth: usize, current: &str) {
        let mut line = format!("{}{}", indent(depth), label_of(field));
        if field.required {
            line.push_str(" *");
        }
        if let Some(hint) = type_hint(field) {
            let _ = write!(line, " {}", hint);
        }
        if !current.is_empty() {
            let _ = write!(line, " [{}]", current);
        }
        println!("{}", line);
    }

    fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, answers: &AnswerSet) {
        println!("Done");
        match answers.to_cbor() {
            Ok(bytes) => println!("Answers (CBOR hex): {}", encode_hex(&bytes)),
            Err(err) => eprintln!("Failed to serialize answers to CBOR: {}", err),
        }
        if self.show_answers_json {
            match answers.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
    }
}

/// Walks the schema in order, asking for every field that is visible given
/// the answers collected so far.
pub fn fill(spec: &FormSpec, initial: AnswerSet, presenter: &WizardPresenter) -> CliResult<AnswerSet> {
    presenter.show_header(spec);
    let answers = fill_level(&spec.fields, initial, 0, presenter)?;
    presenter.show_completion(&answers);
    Ok(answers)
}

fn fill_level(
    schema: &[FieldDefinition],
    mut answers: AnswerSet,
    depth: usize,
    presenter: &WizardPresenter,
) -> CliResult<AnswerSet> {
    for field in schema {
        if !is_visible(field, &answers) {
            continue;
        }
        match &field.kind {
            FieldType::Section => presenter.show_section(field, depth),
            FieldType::Table => {
                println!("{}{} (table, completed on paper)", indent(depth), label_of(field));
            }
            FieldType::Other(kind) => {
                debug!(field = %field.id, kind = %kind, "skipping field of unknown type");
            }
            FieldType::Repeater => {
                let entries = fill_entries(field, &answers, depth, presenter)?;
                answers = answers.with(&field.id, Value::Array(entries));
            }
            _ => {
                if let Some(value) = prompt_field(field, answers.get(&field.id), depth, presenter)? {
                    answers = answers.with(&field.id, value);
                }
            }
        }
    }
    Ok(answers)
}

fn fill_entries(
    field: &FieldDefinition,
    answers: &AnswerSet,
    depth: usize,
    presenter: &WizardPresenter,
) -> CliResult<Vec<Value>> {
    let mut entries = answers.entry_values(&field.id).to_vec();
    println!(
        "{}{} ({} entries)",
        indent(depth),
        label_of(field),
        entries.len()
    );
    loop {
        let prompt = format!("{}Add an entry to {}?", indent(depth + 1), label_of(field));
        if !prompt_bool(&prompt, false)? {
            break;
        }
        println!("{}#{}", indent(depth + 1), entries.len() + 1);
        let entry = fill_level(field.nested_schema(), AnswerSet::new(), depth + 2, presenter)?;
        entries.push(entry.into_value());
    }
    Ok(entries)
}

fn prompt_field(
    field: &FieldDefinition,
    current: Option<&Value>,
    depth: usize,
    presenter: &WizardPresenter,
) -> CliResult<Option<Value>> {
    let current_text = display_text(current);
    loop {
        presenter.show_prompt(field, depth, &current_text);
        let raw = prompt_line("> ", None)?;
        if raw.trim().is_empty() && current.is_some() {
            return Ok(None);
        }
        match parse_answer(field, &raw) {
            Ok(Value::Null) => return Ok(None),
            Ok(value) => return Ok(Some(value)),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Converts typed input into the answer value stored for `field`.
/// `Null` means "leave unanswered".
pub fn parse_answer(field: &FieldDefinition, raw: &str) -> Result<Value, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        if field.required {
            return Err(AnswerParseError::new("This field requires an answer.", None));
        }
        return Ok(Value::Null);
    }

    match field.kind {
        FieldType::Number => parse_number(raw),
        FieldType::Email => {
            if raw.contains('@') {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(AnswerParseError::new(
                    "Please enter an email address.",
                    Some("expected name@domain".to_string()),
                ))
            }
        }
        FieldType::Checkbox => parse_boolean(raw),
        FieldType::Select | FieldType::Radio => parse_choice(field, raw).map(Value::String),
        FieldType::CheckboxGroup => {
            let mut chosen: Vec<Value> = Vec::new();
            for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
                let option = Value::String(parse_choice(field, part)?);
                if !chosen.contains(&option) {
                    chosen.push(option);
                }
            }
            Ok(Value::Array(chosen))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(whole) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(whole)));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
}

fn parse_boolean(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

/// Accepts an option label (any case) or its 1-based position.
fn parse_choice(field: &FieldDefinition, raw: &str) -> Result<String, AnswerParseError> {
    if let Some(option) = field
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
    {
        return Ok(option.clone());
    }
    if let Ok(position) = raw.parse::<usize>()
        && let Some(option) = position.checked_sub(1).and_then(|at| field.options.get(at))
    {
        return Ok(option.clone());
    }
    Err(AnswerParseError::new(
        format!("Choose one of: {}.", field.options.join(", ")),
        Some(format!("allowed values: {}", field.options.join(", "))),
    ))
}

fn type_hint(field: &FieldDefinition) -> Option<String> {
    let numbered = || {
        field
            .options
            .iter()
            .enumerate()
            .map(|(at, option)| format!("{}) {}", at + 1, option))
            .collect::<Vec<_>>()
            .join("  ")
    };
    match field.kind {
        FieldType::Number => Some("(number)".into()),
        FieldType::Date => Some("(YYYY-MM-DD)".into()),
        FieldType::Email => Some("(email)".into()),
        FieldType::Checkbox => Some("(y/n)".into()),
        FieldType::File => Some("(file reference)".into()),
        FieldType::Select | FieldType::Radio => Some(format!("[{}]", numbered())),
        FieldType::CheckboxGroup => Some(format!("[{}] comma separated", numbered())),
        _ => None,
    }
}

fn label_of(field: &FieldDefinition) -> &str {
    if field.label.is_empty() {
        &field.id
    } else {
        &field.label
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

pub fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<String> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}", prompt);
    }
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err("input ended before the form was complete".into());
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn prompt_bool(prompt: &str, default: bool) -> CliResult<bool> {
    let prompt_text = format!("{} (y/n)", prompt);
    let default_hint = if default { "Y" } else { "N" };
    loop {
        let line = prompt_line(&prompt_text, Some(default_hint))?;
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => println!("Invalid answer '{}'. Expected yes or no.", other),
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: Value) -> FieldDefinition {
        serde_json::from_value(value).expect("field")
    }

    #[test]
    fn choices_accept_labels_and_positions() {
        let radio = field(json!({ "id": "c", "type": "radio", "options": ["Phone", "Email"] }));
        assert_eq!(parse_answer(&radio, "email").unwrap(), json!("Email"));
        assert_eq!(parse_answer(&radio, "1").unwrap(), json!("Phone"));
        assert!(parse_answer(&radio, "3").is_err());
    }

    #[test]
    fn checkbox_group_keeps_entry_order_without_duplicates() {
        let group = field(json!({ "id": "g", "type": "checkbox_group", "options": ["a", "b", "c"] }));
        assert_eq!(parse_answer(&group, "c, a, 3").unwrap(), json!(["c", "a"]));
    }

    #[test]
    fn numbers_keep_integers_whole() {
        let number = field(json!({ "id": "n", "type": "number" }));
        assert_eq!(parse_answer(&number, "42").unwrap(), json!(42));
        assert_eq!(parse_answer(&number, "1.5").unwrap(), json!(1.5));
        assert!(parse_answer(&number, "many").is_err());
    }

    #[test]
    fn blank_answers_depend_on_required() {
        let optional = field(json!({ "id": "t", "type": "text" }));
        let required = field(json!({ "id": "t", "type": "text", "required": true }));
        assert_eq!(parse_answer(&optional, "  ").unwrap(), Value::Null);
        assert!(parse_answer(&required, "").is_err());
    }

    #[test]
    fn hex_is_lowercase_pairs() {
        assert_eq!(encode_hex(&[0xa1, 0x00, 0x7f]), "a1007f");
    }
}
