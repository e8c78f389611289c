use handlebars::{Handlebars, html_escape};
use serde_json::json;
use thiserror::Error;

use crate::layout::LabelPosition;
use crate::options::RenderOptions;
use crate::render::document::{Content, DocCell, Document, MarkStyle};

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("print template is invalid: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("failed to render print page: {0}")]
    Render(#[from] handlebars::RenderError),
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
@page { size: {{page_size}}; margin: 18mm; }
body { font-family: sans-serif; font-size: 11pt; color: #000; }
h1 { font-size: 18pt; margin: 0 0 4pt; }
.fc-description { margin: 0 0 12pt; }
.fc-row { display: flex; gap: 8pt; margin-bottom: 8pt; break-inside: avoid; }
.fc-cell { box-sizing: border-box; }
.fc-w-full { flex: 0 0 100%; }
.fc-w-1-2 { flex: 0 0 calc(50% - 4pt); }
.fc-w-1-3 { flex: 0 0 calc(33.333% - 6pt); }
.fc-w-1-4 { flex: 0 0 calc(25% - 6pt); }
.fc-w-1-6 { flex: 0 0 calc(16.666% - 7pt); }
.fc-label { font-weight: bold; }
.fc-label-beside { display: flex; gap: 6pt; align-items: baseline; }
.fc-line { border-bottom: 1px solid #000; min-height: 14pt; flex: 1; }
.fc-area { border: 1px solid #000; min-height: 48pt; padding: 2pt; white-space: pre-wrap; }
.fc-marks span { margin-right: 10pt; }
.fc-heading { font-size: 13pt; border-bottom: 2px solid #000; margin: 10pt 0 4pt; }
.fc-entry { border-left: 2px solid #888; padding-left: 6pt; margin: 4pt 0; }
.fc-example { color: #777; font-style: italic; }
table.fc-table { border-collapse: collapse; width: 100%; }
table.fc-table th, table.fc-table td { border: 1px solid #000; height: 16pt; padding: 2pt; }
</style>
</head>
<body>
<h1>{{title}}</h1>
{{#if description}}<p class="fc-description">{{description}}</p>{{/if}}
{{{body}}}
</body>
</html>
"#;

/// Paper-ready HTML page for a static document.
pub fn render_print_html(
    title: &str,
    description: Option<&str>,
    doc: &Document,
    options: &RenderOptions,
) -> Result<String, PrintError> {
    let mut registry = Handlebars::new();
    registry.register_template_string("page", PAGE_TEMPLATE)?;
    let data = json!({
        "title": title,
        "description": description,
        "page_size": options.page.css_size(),
        "body": document_html(doc),
    });
    Ok(registry.render("page", &data)?)
}

fn document_html(doc: &Document) -> String {
    let mut html = String::new();
    for row in &doc.rows {
        html.push_str("<div class=\"fc-row\">");
        for cell in &row.cells {
            html.push_str(&format!(
                "<div class=\"fc-cell fc-w-{}\" data-path=\"{}\">",
                cell.placement.width_class,
                html_escape(&cell.path.to_string())
            ));
            html.push_str(&cell_html(cell));
            html.push_str("</div>");
        }
        html.push_str("</div>\n");
    }
    html
}

fn cell_html(cell: &DocCell) -> String {
    let label = html_escape(&cell.label);
    let label = if cell.required {
        format!("{} *", label)
    } else {
        label
    };
    let beside = cell.placement.label_position == LabelPosition::Beside;
    let labelled = |body: String| {
        if beside {
            format!(
                "<div class=\"fc-label-beside\"><span class=\"fc-label\">{}</span>{}</div>",
                label, body
            )
        } else {
            format!("<div class=\"fc-label\">{}</div>{}", label, body)
        }
    };

    match &cell.content {
        Content::Heading { text } => {
            format!("<h2 class=\"fc-heading\">{}</h2>", html_escape(text))
        }
        Content::Text { value, multiline: true } => {
            labelled(format!("<div class=\"fc-area\">{}</div>", html_escape(value)))
        }
        Content::Text { value, .. } | Content::File { name: value } => {
            labelled(format!("<div class=\"fc-line\">{}</div>", html_escape(value)))
        }
        Content::Marks { style, options } => {
            let marks = options
                .iter()
                .map(|option| {
                    let glyph = match (style, option.selected) {
                        (MarkStyle::Box, true) => "\u{2611}",
                        (MarkStyle::Box, false) => "\u{2610}",
                        (MarkStyle::Circle, true) => "\u{25C9}",
                        (MarkStyle::Circle, false) => "\u{25CB}",
                    };
                    format!("<span>{} {}</span>", glyph, html_escape(&option.label))
                })
                .collect::<String>();
            labelled(format!("<div class=\"fc-marks\">{}</div>", marks))
        }
        Content::Checkbox { checked } => format!(
            "<div>{} {}</div>",
            if *checked { "\u{2611}" } else { "\u{2610}" },
            label
        ),
        Content::Repeater { entries } => {
            let mut body = format!("<div class=\"fc-label\">{}</div>", label);
            for entry in entries {
                let class = if entry.placeholder {
                    "fc-entry fc-example"
                } else {
                    "fc-entry"
                };
                body.push_str(&format!(
                    "<div class=\"{}\"><div>{}.</div>{}</div>",
                    class,
                    entry.index + 1,
                    document_html(&entry.document)
                ));
            }
            body
        }
        Content::Table {
            columns,
            blank_rows,
        } => {
            let header = columns
                .iter()
                .map(|name| format!("<th>{}</th>", html_escape(name)))
                .collect::<String>();
            let blank = format!("<tr>{}</tr>", "<td></td>".repeat(columns.len()));
            labelled(format!(
                "<table class=\"fc-table\"><thead><tr>{}</tr></thead><tbody>{}</tbody></table>",
                header,
                blank.repeat(*blank_rows)
            ))
        }
    }
}
