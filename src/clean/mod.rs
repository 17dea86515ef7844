// src/clean/mod.rs
//
// Best-effort cleaning: the four passes never fail a frame. A cell that
// cannot be coerced degrades to Null and processing continues.

pub mod dates;
pub mod dedupe;
pub mod numeric;
pub mod whitespace;

pub use dates::{normalize_dates, DateOrder};
pub use dedupe::deduplicate;
pub use numeric::normalize_numeric;
pub use whitespace::trim_whitespace;

use crate::frame::Frame;

/// Options for one run of the cleaning pipeline.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Column to normalize to ISO dates.
    pub date_column: String,
    /// Which ordering wins when a date like `01-02-2024` is ambiguous.
    pub date_order: DateOrder,
    /// Columns that identify a duplicate row; `None` compares whole rows.
    pub dedupe_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanReport {
    pub rows_removed: usize,
}

/// Apply the four transforms in their fixed order:
/// dates → numeric → dedupe → whitespace.
pub fn clean(frame: &mut Frame, opts: &CleanOptions) -> CleanReport {
    normalize_dates(frame, &opts.date_column, opts.date_order);
    normalize_numeric(frame);
    let keys: Option<Vec<&str>> = opts
        .dedupe_keys
        .as_ref()
        .map(|ks| ks.iter().map(String::as_str).collect());
    let rows_removed = deduplicate(frame, keys.as_deref());
    trim_whitespace(frame);
    CleanReport { rows_removed }
}
