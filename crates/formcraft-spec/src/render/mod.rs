//! Presentations of a schema against an answer snapshot.
//!
//! [`interactive`] and [`document`] both sit on [`resolve`]; the remaining
//! modules are output adapters over their trees.

pub mod card;
pub mod document;
pub mod interactive;
pub mod print;
pub mod resolve;
pub mod text;

pub use card::render_card;
pub use document::{Content, DocCell, DocEntry, DocRow, Document, MarkStyle, render_static};
pub use interactive::{
    ChangeSink, Control, EditCell, EditEntry, EditForm, EditRow, InputKind, Intent, IntentAction,
    IntentError, InteractiveRenderer, dispatch_intent, render_edit,
};
pub use print::{PrintError, render_print_html};
pub use resolve::{OptionMark, display_text};
pub use text::{render_document_text, render_edit_text};
