use serde_json::Value;

use crate::answers::AnswerSet;
use crate::options::RenderOptions;
use crate::render::document::{Document, render_static};
use crate::render::interactive::{EditForm, Intent, IntentError, dispatch_intent, render_edit};
use crate::spec::form::FormSpec;

/// One form being filled: its schema plus the current answer snapshot.
///
/// Every change replaces the snapshot, so presentations rendered earlier keep
/// showing the answers they were built from.
#[derive(Debug, Clone)]
pub struct FormSession {
    spec: FormSpec,
    answers: AnswerSet,
    options: RenderOptions,
}

impl FormSession {
    pub fn new(spec: FormSpec) -> Self {
        Self {
            spec,
            answers: AnswerSet::new(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_answers(mut self, answers: AnswerSet) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn render_edit(&self) -> EditForm {
        render_edit(&self.spec.fields, &self.answers)
    }

    pub fn render_view(&self) -> Document {
        render_static(&self.spec.fields, &self.answers, &self.options)
    }

    /// Applies a host intent; the snapshot is untouched when it is rejected.
    pub fn apply(&mut self, intent: &Intent) -> Result<&AnswerSet, IntentError> {
        let mut next = self.answers.clone();
        let mut sink = |field_id: &str, value: Value| next = next.with(field_id, value);
        dispatch_intent(&self.spec.fields, &self.answers, intent, &mut sink)?;
        self.answers = next;
        Ok(&self.answers)
    }
}
