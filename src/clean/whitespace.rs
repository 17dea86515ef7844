use once_cell::sync::Lazy;
use regex::Regex;

use crate::frame::{Cell, ColumnKind, Frame};

static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip leading/trailing whitespace and collapse internal runs to a single
/// space, for every text column. Null cells and non-text columns are left
/// alone.
pub fn trim_whitespace(frame: &mut Frame) {
    for col in frame.columns_mut() {
        if col.kind != ColumnKind::Text {
            continue;
        }
        for cell in &mut col.cells {
            if let Cell::Text(s) = cell {
                let trimmed = WS_RUN_RE.replace_all(s.trim(), " ");
                if trimmed != *s {
                    *s = trimmed.into_owned();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn text_frame(values: &[&str]) -> Frame {
        Frame::from_records(
            vec!["name".to_string()],
            values.iter().map(|v| vec![v.to_string()]).collect(),
        )
    }

    #[test]
    fn trims_and_collapses_runs() {
        let mut f = text_frame(&["  a   b  ", "c\t\td", " e "]);
        trim_whitespace(&mut f);
        assert_eq!(
            f.column("name").unwrap().cells,
            vec![
                Cell::Text("a b".into()),
                Cell::Text("c d".into()),
                Cell::Text("e".into()),
            ]
        );
    }

    #[test]
    fn empty_and_null_cells_survive_unchanged() {
        let mut f = text_frame(&["", "x"]);
        f.column_mut("name").unwrap().cells[1] = Cell::Null;
        trim_whitespace(&mut f);
        assert_eq!(
            f.column("name").unwrap().cells,
            vec![Cell::Text("".into()), Cell::Null]
        );
    }

    #[test]
    fn numeric_columns_are_untouched() {
        let mut f = Frame::from_records(
            vec!["qty".to_string()],
            vec![vec!["1".to_string()], vec!["2".to_string()]],
        );
        let before = f.clone();
        trim_whitespace(&mut f);
        assert_eq!(f, before);
    }

    #[test]
    fn whitespace_pass_is_idempotent() {
        let mut f = text_frame(&["  a   b  "]);
        trim_whitespace(&mut f);
        let once = f.clone();
        trim_whitespace(&mut f);
        assert_eq!(f, once);
    }
}
