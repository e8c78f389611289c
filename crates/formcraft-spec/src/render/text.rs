use crate::render::document::{Content, DocCell, Document, MarkStyle};
use crate::render::interactive::{Control, EditCell, EditForm, InputKind};
use crate::render::resolve::OptionMark;

const INDENT: &str = "  ";
const BLANK_LINE: &str = "____________________";

/// Outline of the editable form: one line per control with its current value.
pub fn render_edit_text(title: &str, form: &EditForm) -> String {
    let mut lines = vec![format!("Form: {}", title)];
    write_edit_form(form, 0, &mut lines);
    lines.join("\n")
}

fn write_edit_form(form: &EditForm, depth: usize, lines: &mut Vec<String>) {
    for cell in form.cells() {
        write_edit_cell(cell, depth, lines);
    }
}

fn write_edit_cell(cell: &EditCell, depth: usize, lines: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    let mut entry = format!("{} - {} ({})", pad, cell.label, cell.path);
    if cell.required {
        entry.push_str(" [required]");
    }

    match &cell.control {
        Control::Heading { text } => {
            lines.push(format!("{}== {} ==", pad, text));
            return;
        }
        Control::Input { input, value } => {
            entry.push_str(&format!(" <{}> = {}", input_label(*input), value));
        }
        Control::TextArea { value } => entry.push_str(&format!(" <textarea> = {}", value)),
        Control::Select { options, value } => {
            entry.push_str(&format!(" <select: {}> = {}", options.join(" | "), value));
        }
        Control::Radio { options } => {
            entry.push_str(&format!(" {}", inline_marks(options, MarkStyle::Circle)));
        }
        Control::CheckboxGroup { options } => {
            entry.push_str(&format!(" {}", inline_marks(options, MarkStyle::Box)));
        }
        Control::Checkbox { checked } => {
            entry.push_str(if *checked { " [x]" } else { " [ ]" });
        }
        Control::File { current } => {
            entry.push_str(&format!(
                " <file> = {}",
                current.as_deref().unwrap_or("(none)")
            ));
        }
        Control::Repeater { entries, .. } => {
            entry.push_str(&format!(" ({} entries, [+ add])", entries.len()));
            lines.push(entry);
            for item in entries {
                lines.push(format!("{}{}#{} [- remove]", pad, INDENT, item.index + 1));
                write_edit_form(&item.form, depth + 2, lines);
            }
            return;
        }
        Control::Table { columns } => {
            let names = columns
                .iter()
                .map(|column| column.name.as_str())
                .collect::<Vec<_>>();
            entry.push_str(&format!(" <table: {}>", names.join(" | ")));
        }
    }
    lines.push(entry);
}

fn input_label(input: InputKind) -> &'static str {
    match input {
        InputKind::Text => "text",
        InputKind::Email => "email",
        InputKind::Number => "number",
        InputKind::Date => "date",
    }
}

/// Plain-text replica of the paper form.
pub fn render_document_text(title: &str, description: Option<&str>, doc: &Document) -> String {
    let mut lines = vec![title.to_string(), "=".repeat(title.chars().count())];
    if let Some(description) = description {
        lines.push(description.to_string());
    }
    lines.push(String::new());
    write_document(doc, 0, &mut lines);
    lines.join("\n")
}

fn write_document(doc: &Document, depth: usize, lines: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    for row in &doc.rows {
        let rendered = row.cells.iter().map(document_cell).collect::<Vec<_>>();
        let side_by_side = rendered.len() > 1
            && rendered.iter().all(|cell| cell.len() == 1)
            && !row
                .cells
                .iter()
                .any(|cell| matches!(cell.content, Content::Repeater { .. }));
        if side_by_side {
            let joined = rendered
                .iter()
                .map(|cell| cell[0].as_str())
                .collect::<Vec<_>>()
                .join("    ");
            lines.push(format!("{}{}", pad, joined));
            continue;
        }
        for (cell, cell_lines) in row.cells.iter().zip(rendered) {
            lines.extend(cell_lines.into_iter().map(|line| format!("{}{}", pad, line)));
            if let Content::Repeater { entries } = &cell.content {
                for entry in entries {
                    let marker = if entry.placeholder { "(example)" } else { "" };
                    lines.push(format!("{}{}{}. {}", pad, INDENT, entry.index + 1, marker));
                    write_document(&entry.document, depth + 2, lines);
                }
            }
        }
    }
}

fn document_cell(cell: &DocCell) -> Vec<String> {
    let label = if cell.required {
        format!("{} *", cell.label)
    } else {
        cell.label.clone()
    };
    match &cell.content {
        Content::Heading { text } => vec![
            String::new(),
            text.to_uppercase(),
            "-".repeat(text.chars().count()),
        ],
        Content::Text { value, multiline } => {
            let shown: &str = if value.is_empty() { BLANK_LINE } else { value };
            if *multiline {
                let mut lines = vec![format!("{}:", label)];
                lines.extend(shown.lines().map(|line| format!("{}{}", INDENT, line)));
                lines
            } else {
                vec![format!("{}: {}", label, shown)]
            }
        }
        Content::Marks { style, options } => {
            vec![format!("{}: {}", label, inline_marks(options, *style))]
        }
        Content::Checkbox { checked } => {
            vec![format!("{} {}", if *checked { "[x]" } else { "[ ]" }, label)]
        }
        Content::File { name } => {
            let shown: &str = if name.is_empty() { BLANK_LINE } else { name };
            vec![format!("{}: (attachment) {}", label, shown)]
        }
        Content::Repeater { .. } => vec![format!("{}:", label)],
        Content::Table {
            columns,
            blank_rows,
        } => {
            let mut lines = vec![format!("{}:", label)];
            let widths = columns
                .iter()
                .map(|name| name.chars().count().max(10))
                .collect::<Vec<_>>();
            let header = columns
                .iter()
                .zip(&widths)
                .map(|(name, width)| format!(" {:<width$} ", name, width = *width))
                .collect::<Vec<_>>();
            lines.push(format!("|{}|", header.join("|")));
            let blank = widths
                .iter()
                .map(|width| " ".repeat(width + 2))
                .collect::<Vec<_>>();
            for _ in 0..*blank_rows {
                lines.push(format!("|{}|", blank.join("|")));
            }
            lines
        }
    }
}

fn inline_marks(options: &[OptionMark], style: MarkStyle) -> String {
    if options.is_empty() {
        return "(no options)".into();
    }
    options
        .iter()
        .map(|option| {
            let mark = match (style, option.selected) {
                (MarkStyle::Box, true) => "[x]",
                (MarkStyle::Box, false) => "[ ]",
                (MarkStyle::Circle, true) => "(o)",
                (MarkStyle::Circle, false) => "( )",
            };
            format!("{} {}", mark, option.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerSet;
    use crate::options::RenderOptions;
    use crate::render::document::render_static;
    use crate::render::interactive::render_edit;
    use crate::spec::field::FieldDefinition;
    use serde_json::json;

    fn schema() -> Vec<FieldDefinition> {
        serde_json::from_value(json!([
            { "id": "intro", "type": "section", "label": "Contact" },
            { "id": "first", "type": "text", "label": "First", "width": "1/2", "required": true },
            { "id": "last", "type": "text", "label": "Last", "width": "1/2" },
            { "id": "pref", "type": "checkbox_group", "label": "Reach me by", "options": ["mail", "phone"] }
        ]))
        .unwrap()
    }

    #[test]
    fn document_text_marks_and_blank_lines() {
        let schema = schema();
        let answers = AnswerSet::from_value(json!({ "first": "Ada", "pref": ["phone"] }));
        let doc = render_static(&schema, &answers, &RenderOptions::default());
        let text = render_document_text("Intake", None, &doc);
        assert!(text.contains("CONTACT"));
        assert!(text.contains("First *: Ada    Last: ____"));
        assert!(text.contains("[ ] mail  [x] phone"));
    }

    #[test]
    fn edit_text_lists_paths_and_values() {
        let schema = schema();
        let form = render_edit(&schema, &AnswerSet::from_value(json!({ "first": "Ada" })));
        let text = render_edit_text("Intake", &form);
        assert!(text.starts_with("Form: Intake"));
        assert!(text.contains(" - First (first) [required] <text> = Ada"));
    }
}
