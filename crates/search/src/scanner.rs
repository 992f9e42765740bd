use log::debug;

use crate::cache::MatchRecord;
use crate::matcher::{RowKey, SearchTerm, TermMatcher};

/// The grid surface the scanner walks: the currently visible logical rows and
/// the searchable visible columns, both in display order, plus the displayed
/// text of each cell.
///
/// Implementations sit on top of whatever data pipeline the host grid runs
/// (filter, sort, group, page); the scanner only ever sees the materialized
/// result.
pub trait SearchableGrid {
    /// Visible logical rows in display order.
    fn visible_row_keys(&self) -> Vec<RowKey>;

    /// Searchable, non-hidden columns in display order.
    fn visible_column_ids(&self) -> Vec<String>;

    /// Display text for one cell, exactly as painted on screen. `None` when
    /// the cell has no text projection (custom-templated columns).
    fn cell_display_text(&self, row_key: &RowKey, column_id: &str) -> Option<String>;
}

/// Scans the grid for `term` and returns the ordered match records: rows in
/// display order, columns in display order within each row, occurrences left
/// to right within each cell.
pub fn scan(grid: &impl SearchableGrid, term: &SearchTerm) -> Vec<MatchRecord> {
    if term.is_empty() {
        return Vec::new();
    }

    let matcher = TermMatcher::compile(term);
    let columns = grid.visible_column_ids();
    let mut records = Vec::new();

    for row_key in grid.visible_row_keys() {
        for column_id in &columns {
            let Some(text) = grid.cell_display_text(&row_key, column_id) else {
                continue;
            };
            for span in matcher.find_spans(&text) {
                records.push(MatchRecord {
                    row_key: row_key.clone(),
                    column_id: column_id.clone(),
                    start: span.start,
                    len: span.len,
                    cell_text: text.clone(),
                });
            }
        }
    }

    debug!("scan for {:?} found {} match(es)", term.text, records.len());
    records
}
