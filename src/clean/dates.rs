use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::frame::{Cell, ColumnKind, Frame};

/// Every `.`, `/` or whitespace character inside a date cell becomes `-`,
/// so `2024/01/15`, `2024.01.15` and `2024 01 15` unify before parsing.
static DATE_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[./\s]").unwrap());

/// Which ordering wins for an ambiguous date such as `01-02-2024`.
///
/// The inherited behavior is month-first, falling back to day-first when the
/// month field is out of range (`15-01-2024` still resolves as 15 Jan). That
/// fallback can silently flip the meaning of a value, so the policy is a
/// setting rather than a hardcoded guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
}

impl Default for DateOrder {
    fn default() -> Self {
        DateOrder::MonthFirst
    }
}

/// Normalize the named column to `YYYY-MM-DD` text. Cells that do not
/// resolve to a valid calendar date become Null; no error is raised. A
/// missing column is a no-op.
pub fn normalize_dates(frame: &mut Frame, column: &str, order: DateOrder) {
    let Some(col) = frame.column_mut(column) else {
        warn!(column, "date column not present; skipping date pass");
        return;
    };

    let mut nulled = 0usize;
    for cell in &mut col.cells {
        let raw = match cell {
            Cell::Text(s) => s.clone(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Null => continue,
        };
        let unified = DATE_SEP_RE.replace_all(raw.trim(), "-");
        match parse_date(&unified, order) {
            Some(d) => *cell = Cell::Text(d.format("%Y-%m-%d").to_string()),
            None => {
                debug!(column, value = %raw, "unparseable date nulled");
                nulled += 1;
                *cell = Cell::Null;
            }
        }
    }

    // Whatever the column looked like on the way in, it now holds ISO text.
    col.kind = ColumnKind::Text;
    if nulled > 0 {
        debug!(column, nulled, "date pass nulled cells");
    }
}

/// Try the candidate orderings against an already `-`-separated value.
/// ISO year-first always wins; the configured ambiguous order decides
/// between `MM-DD-YYYY` and `DD-MM-YYYY`; a compact 8-digit `YYYYMMDD`
/// (no separators to unify) is accepted last.
fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let formats: [&str; 4] = match order {
        DateOrder::MonthFirst => ["%Y-%m-%d", "%m-%d-%Y", "%d-%m-%Y", "%Y%m%d"],
        DateOrder::DayFirst => ["%Y-%m-%d", "%d-%m-%Y", "%m-%d-%Y", "%Y%m%d"],
    };
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn date_frame(values: &[&str]) -> Frame {
        Frame::from_records(
            vec!["business_date".to_string()],
            values.iter().map(|v| vec![v.to_string()]).collect(),
        )
    }

    fn cleaned(values: &[&str], order: DateOrder) -> Vec<Cell> {
        let mut frame = date_frame(values);
        normalize_dates(&mut frame, "business_date", order);
        frame.column("business_date").unwrap().cells.clone()
    }

    #[test]
    fn separator_variants_unify_to_iso() {
        let cells = cleaned(
            &["2024/01/15", "2024.01.15", "2024 01 15", "2024-01-15"],
            DateOrder::MonthFirst,
        );
        for cell in cells {
            assert_eq!(cell, Cell::Text("2024-01-15".into()));
        }
    }

    #[test]
    fn month_first_wins_for_ambiguous_values() {
        let cells = cleaned(&["01-15-2024"], DateOrder::MonthFirst);
        assert_eq!(cells[0], Cell::Text("2024-01-15".into()));
    }

    // Known inherited ambiguity: month 15 is invalid, so the parser quietly
    // falls back to day-before-month instead of rejecting the value. Kept
    // to match the source behavior; DateOrder makes the policy explicit.
    #[test]
    fn invalid_month_falls_back_to_day_first() {
        let cells = cleaned(&["15-01-2024"], DateOrder::MonthFirst);
        assert_eq!(cells[0], Cell::Text("2024-01-15".into()));
    }

    #[test]
    fn day_first_order_flips_the_ambiguous_case() {
        let cells = cleaned(&["01-02-2024"], DateOrder::DayFirst);
        assert_eq!(cells[0], Cell::Text("2024-02-01".into()));
    }

    #[test]
    fn impossible_calendar_dates_null_in_any_order() {
        assert_eq!(cleaned(&["31-02-2024"], DateOrder::MonthFirst)[0], Cell::Null);
        assert_eq!(cleaned(&["31-02-2024"], DateOrder::DayFirst)[0], Cell::Null);
        assert_eq!(cleaned(&["not a date"], DateOrder::MonthFirst)[0], Cell::Null);
    }

    #[test]
    fn compact_numeric_dates_resolve() {
        // an all-digit column infers as Int; the date pass still recovers it
        let cells = cleaned(&["20240115"], DateOrder::MonthFirst);
        assert_eq!(cells[0], Cell::Text("2024-01-15".into()));
    }

    #[test]
    fn doubled_separators_do_not_parse() {
        assert_eq!(cleaned(&["2024  01 15"], DateOrder::MonthFirst)[0], Cell::Null);
    }

    #[test]
    fn missing_column_is_a_no_op() {
        let mut frame = date_frame(&["2024/01/15"]);
        normalize_dates(&mut frame, "no_such_column", DateOrder::MonthFirst);
        assert_eq!(
            frame.column("business_date").unwrap().cells[0],
            Cell::Text("2024/01/15".into())
        );
    }

    #[test]
    fn date_pass_is_idempotent() {
        let mut frame = date_frame(&["2024/01/15", "garbage"]);
        normalize_dates(&mut frame, "business_date", DateOrder::MonthFirst);
        let once = frame.clone();
        normalize_dates(&mut frame, "business_date", DateOrder::MonthFirst);
        assert_eq!(frame, once);
    }
}
