use tracing::debug;

use crate::frame::{Cell, ColumnKind, Frame};

/// Re-coerce every cell of the numeric columns to the column kind. This is a
/// validation pass over data that was already typed at read time: stray text
/// is parsed, anything unparseable becomes Null, and an Int column refuses
/// non-integral values rather than truncating them.
pub fn normalize_numeric(frame: &mut Frame) {
    for col in frame.columns_mut() {
        if col.kind == ColumnKind::Text {
            continue;
        }
        let mut nulled = 0usize;
        for cell in &mut col.cells {
            let next = match (&*cell, col.kind) {
                (Cell::Int(_), ColumnKind::Int) | (Cell::Float(_), ColumnKind::Float) => continue,
                (Cell::Null, _) => continue,
                (Cell::Int(v), ColumnKind::Float) => Cell::Float(*v as f64),
                (Cell::Float(v), ColumnKind::Int) if v.fract() == 0.0 => Cell::Int(*v as i64),
                (Cell::Float(_), ColumnKind::Int) => Cell::Null,
                (Cell::Text(s), kind) => coerce_text(s, kind),
                (_, ColumnKind::Text) => continue,
            };
            if next.is_null() {
                nulled += 1;
            }
            *cell = next;
        }
        if nulled > 0 {
            debug!(column = %col.name, nulled, "numeric pass nulled cells");
        }
    }
}

fn coerce_text(s: &str, kind: ColumnKind) -> Cell {
    let t = s.trim();
    match kind {
        ColumnKind::Int => match t.parse::<i64>() {
            Ok(v) => Cell::Int(v),
            Err(_) => match t.parse::<f64>() {
                Ok(f) if f.fract() == 0.0 => Cell::Int(f as i64),
                _ => Cell::Null,
            },
        },
        ColumnKind::Float => match t.parse::<f64>() {
            Ok(v) => Cell::Float(v),
            Err(_) => Cell::Null,
        },
        ColumnKind::Text => Cell::Text(s.to_string()),
    }
}
