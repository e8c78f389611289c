use serde::Serialize;

use crate::spec::field::{FieldDefinition, LabelLayout};

pub const GRID_COLUMNS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    Above,
    Beside,
}

/// Where a field sits on the 12-column grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub width_class: &'static str,
    pub span: u8,
    pub label_position: LabelPosition,
    pub start_row: bool,
}

pub fn placement(field: &FieldDefinition) -> Placement {
    let label_position = match field.layout {
        Some(LabelLayout::Inline) if field.kind.is_scalar() => LabelPosition::Beside,
        _ => LabelPosition::Above,
    };
    Placement {
        width_class: field.width.class(),
        span: field.width.span(),
        label_position,
        start_row: field.start_row,
    }
}

/// Packs cells left to right into rows, wrapping when the grid is full and
/// breaking before every cell flagged `start_row`.
pub fn pack_rows<T>(cells: Vec<T>, placement_of: impl Fn(&T) -> Placement) -> Vec<Vec<T>> {
    let mut rows = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut used = 0u8;

    for cell in cells {
        let Placement {
            span, start_row, ..
        } = placement_of(&cell);
        if !current.is_empty() && (start_row || used + span > GRID_COLUMNS) {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        used += span;
        current.push(cell);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}
