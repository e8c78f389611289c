pub mod field;
pub mod form;
pub mod rule;

pub use field::{FieldDefinition, FieldType, LabelLayout, TableColumn, Width};
pub use form::{FormSpec, SpecError};
pub use rule::{Condition, Operator, VisibilityRule};
