use std::collections::HashSet;

use tracing::{info, warn};

use crate::frame::{Cell, Frame};

/// Remove rows that are exact duplicates, keeping the first occurrence in
/// row order, and return how many were dropped. With `key_columns` the
/// comparison is restricted to those columns; unknown names are ignored, and
/// if none match the whole row is compared. Float cells compare by bit
/// pattern.
pub fn deduplicate(frame: &mut Frame, key_columns: Option<&[&str]>) -> usize {
    let n_rows = frame.n_rows();
    if n_rows == 0 {
        return 0;
    }

    let key_idx: Vec<usize> = match key_columns {
        Some(keys) => {
            let names = frame.column_names();
            let mut idx = Vec::with_capacity(keys.len());
            for key in keys {
                match names.iter().position(|n| n == key) {
                    Some(i) => idx.push(i),
                    None => warn!(column = key, "dedupe key not present; ignoring"),
                }
            }
            if idx.is_empty() {
                (0..frame.n_cols()).collect()
            } else {
                idx
            }
        }
        None => (0..frame.n_cols()).collect(),
    };

    let mut seen: HashSet<Vec<Cell>> = HashSet::with_capacity(n_rows);
    let keep: Vec<bool> = (0..n_rows)
        .map(|row| {
            let fingerprint: Vec<Cell> = key_idx
                .iter()
                .map(|&c| frame.columns()[c].cells[row].clone())
                .collect();
            seen.insert(fingerprint)
        })
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        frame.retain_rows(&keep);
        info!(removed, "removed duplicate rows");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn frame(rows: &[&[&str]]) -> Frame {
        Frame::from_records(
            vec!["name".to_string(), "qty".to_string()],
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn exact_duplicates_keep_first_occurrence() {
        let mut f = frame(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        let removed = deduplicate(&mut f, None);
        assert_eq!(removed, 1);
        assert_eq!(f.n_rows(), 2);
        assert_eq!(
            f.column("name").unwrap().cells,
            vec![Cell::Text("A".into()), Cell::Text("B".into())]
        );
    }

    #[test]
    fn key_columns_restrict_the_comparison() {
        let mut f = frame(&[&["A", "1"], &["A", "2"], &["B", "3"]]);
        let removed = deduplicate(&mut f, Some(&["name"]));
        assert_eq!(removed, 1);
        assert_eq!(f.column("qty").unwrap().cells, vec![Cell::Int(1), Cell::Int(3)]);
    }

    #[test]
    fn unknown_keys_fall_back_to_whole_row() {
        let mut f = frame(&[&["A", "1"], &["A", "2"]]);
        let removed = deduplicate(&mut f, Some(&["no_such"]));
        assert_eq!(removed, 0);
        assert_eq!(f.n_rows(), 2);
    }

    #[test]
    fn null_and_empty_string_are_different_rows() {
        let mut f = Frame::from_records(
            vec!["v".to_string(), "q".to_string()],
            vec![
                vec!["".to_string(), "x".to_string()],
                vec!["".to_string(), "x".to_string()],
            ],
        );
        // force one empty into a Null to check they do not collapse together
        f.column_mut("v").unwrap().cells[1] = Cell::Null;
        let removed = deduplicate(&mut f, None);
        assert_eq!(removed, 0);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut f = frame(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        deduplicate(&mut f, None);
        let once = f.clone();
        let removed = deduplicate(&mut f, None);
        assert_eq!(removed, 0);
        assert_eq!(f, once);
    }
}
