use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::spec::field::{FieldDefinition, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LintIssue {
    pub path: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

/// Advisory findings; renderers accept schemas regardless of the outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LintReport {
    pub valid: bool,
    pub issues: Vec<LintIssue>,
}

fn id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").ok())
        .as_ref()
}

pub fn lint(schema: &[FieldDefinition]) -> LintReport {
    let mut issues = Vec::new();
    lint_level(schema, &FieldPath::default(), &mut issues);
    LintReport {
        valid: issues
            .iter()
            .all(|issue| issue.severity != Severity::Error),
        issues,
    }
}

fn lint_level(schema: &[FieldDefinition], scope: &FieldPath, issues: &mut Vec<LintIssue>) {
    let ids: BTreeSet<&str> = schema.iter().map(|field| field.id.as_str()).collect();
    let mut seen = BTreeSet::new();

    for (position, field) in schema.iter().enumerate() {
        let path = if field.id.is_empty() {
            format!("{}#{}", scope_prefix(scope), position)
        } else {
            scope.field(field.id.clone()).to_string()
        };
        let mut report = |code: &str, severity: Severity, message: String| {
            issues.push(LintIssue {
                path: path.clone(),
                code: code.into(),
                message,
                severity,
            })
        };

        if field.id.is_empty() {
            report("empty_id", Severity::Error, "field has no id".into());
        } else if id_pattern().is_some_and(|pattern| !pattern.is_match(&field.id)) {
            report(
                "invalid_id",
                Severity::Error,
                format!("id '{}' may only use letters, digits, '_', '.', '-'", field.id),
            );
        }
        if !field.id.is_empty() && !seen.insert(field.id.as_str()) {
            report(
                "duplicate_id",
                Severity::Error,
                format!("id '{}' is used more than once at this level", field.id),
            );
        }

        match &field.kind {
            FieldType::Other(kind) => report(
                "unknown_type",
                Severity::Warning,
                format!("type '{}' is not rendered", kind),
            ),
            kind if kind.uses_options() && field.options.is_empty() => report(
                "missing_options",
                Severity::Warning,
                format!("{} field has no options", kind),
            ),
            FieldType::Repeater if field.schema.is_none() => report(
                "missing_schema",
                Severity::Warning,
                "repeater has no nested schema".into(),
            ),
            FieldType::Table if field.table_columns().is_empty() => report(
                "missing_columns",
                Severity::Warning,
                "table has no columns".into(),
            ),
            _ => {}
        }

        if let Some(rule) = &field.visible_if {
            for condition in rule.conditions() {
                if !ids.contains(condition.field_id()) {
                    report(
                        "unknown_reference",
                        Severity::Warning,
                        format!(
                            "visibility refers to '{}', which is not a field at this level",
                            condition.field_id()
                        ),
                    );
                }
                if !condition.operator().is_known() {
                    report(
                        "unknown_operator",
                        Severity::Warning,
                        format!(
                            "operator '{}' is unknown and always holds",
                            condition.operator().as_str()
                        ),
                    );
                }
            }
        }

        if field.kind == FieldType::Repeater && !field.id.is_empty() {
            lint_level(field.nested_schema(), &scope.field(field.id.clone()).entry(0), issues);
        }
    }
}

fn scope_prefix(scope: &FieldPath) -> String {
    if scope.is_empty() {
        String::new()
    } else {
        scope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(report: &LintReport) -> Vec<&str> {
        report.issues.iter().map(|issue| issue.code.as_str()).collect()
    }

    #[test]
    fn clean_schema_is_valid() {
        let schema: Vec<FieldDefinition> = serde_json::from_value(json!([
            { "id": "a", "type": "radio", "options": ["x"] },
            { "id": "b", "type": "text", "visibleIf": ["a", "eq", "x"] }
        ]))
        .unwrap();
        let report = lint(&schema);
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn id_problems_invalidate() {
        let schema: Vec<FieldDefinition> = serde_json::from_value(json!([
            { "id": "a", "type": "text" },
            { "id": "a", "type": "text" },
            { "id": "has space", "type": "text" },
            { "id": "", "type": "text" }
        ]))
        .unwrap();
        let report = lint(&schema);
        assert!(!report.valid);
        assert_eq!(codes(&report), vec!["duplicate_id", "invalid_id", "empty_id"]);
        assert_eq!(report.issues[2].path, "#3");
    }

    #[test]
    fn structural_gaps_are_warnings() {
        let schema: Vec<FieldDefinition> = serde_json::from_value(json!([
            { "id": "s", "type": "select" },
            { "id": "r", "type": "repeater" },
            { "id": "t", "type": "table" },
            { "id": "z", "type": "signature" },
            { "id": "v", "type": "text", "visibleIf": [["ghost", "present"], ["s", "like", "x"]] }
        ]))
        .unwrap();
        let report = lint(&schema);
        assert!(report.valid);
        assert_eq!(
            codes(&report),
            vec![
                "missing_options",
                "missing_schema",
                "missing_columns",
                "unknown_type",
                "unknown_reference",
                "unknown_operator"
            ]
        );
    }

    #[test]
    fn nested_levels_are_checked_with_their_own_ids() {
        let schema: Vec<FieldDefinition> = serde_json::from_value(json!([
            { "id": "top", "type": "text" },
            { "id": "items", "type": "repeater", "schema": [
                { "id": "qty", "type": "number", "visibleIf": ["top", "present"] }
            ]}
        ]))
        .unwrap();
        let report = lint(&schema);
        assert_eq!(codes(&report), vec!["unknown_reference"]);
        assert_eq!(report.issues[0].path, "items[0].qty");
    }
}
