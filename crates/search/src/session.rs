use log::debug;

use crate::cache::{MatchCache, MatchRecord, MatchSpan};
use crate::matcher::{RowKey, SearchTerm};
use crate::scanner::{SearchableGrid, scan};

/// Receives "bring this cell into view" requests from navigation. Backed by
/// the host's virtualization layer; revealing a row that no longer exists
/// must be a no-op, never an error.
pub trait ViewportSink {
    fn reveal_cell(&mut self, row_key: &RowKey, column_id: &str);
}

/// Drives searches over a grid: owns the match cache, decides when it must be
/// rebuilt, steps the active match and asks the viewport to reveal it.
///
/// Structural changes only call [`mark_stale`]; the rescan happens on the
/// next navigation or refresh call, never eagerly per change event.
///
/// [`mark_stale`]: SearchSession::mark_stale
#[derive(Debug, Default)]
pub struct SearchSession {
    cache: MatchCache,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next match, rescanning first if the term changed or
    /// the cache is stale, and reveals the new active match. Returns the
    /// total match count.
    pub fn find_next(
        &mut self,
        grid: &impl SearchableGrid,
        viewport: &mut impl ViewportSink,
        term: SearchTerm,
    ) -> usize {
        self.find(grid, viewport, term, false)
    }

    /// Symmetric to [`find_next`], stepping backward with wraparound.
    ///
    /// [`find_next`]: SearchSession::find_next
    pub fn find_prev(
        &mut self,
        grid: &impl SearchableGrid,
        viewport: &mut impl ViewportSink,
        term: SearchTerm,
    ) -> usize {
        self.find(grid, viewport, term, true)
    }

    fn find(
        &mut self,
        grid: &impl SearchableGrid,
        viewport: &mut impl ViewportSink,
        term: SearchTerm,
        backwards: bool,
    ) -> usize {
        if term.is_empty() {
            self.clear();
            return 0;
        }

        if self.cache.term() != &term {
            // New term or changed comparison modes: full rescan, active resets.
            let records = scan(grid, &term);
            self.cache.replace(term, records, false);
        } else if self.cache.is_stale() {
            // Same term over a changed visible sequence: rescan, keep the
            // active match when its cell survived.
            let records = scan(grid, &term);
            self.cache.replace(term, records, true);
        }

        if self.cache.is_empty() {
            return 0;
        }

        let record = if backwards {
            self.cache.retreat()
        } else {
            self.cache.advance()
        };
        if let Some(record) = record {
            viewport.reveal_cell(&record.row_key, &record.column_id);
        }

        self.cache.count()
    }

    /// Re-runs the last search against the current visible sequence without
    /// stepping the active match; the active match is preserved when a new
    /// record has the same `(row_key, column_id, start)`. Returns the new
    /// match count. No-op when no search is in effect.
    pub fn refresh(&mut self, grid: &impl SearchableGrid) -> usize {
        let term = self.cache.term().clone();
        if term.is_empty() {
            return 0;
        }

        let records = scan(grid, &term);
        self.cache.replace(term, records, true);
        self.cache.count()
    }

    /// Empties the cache and drops the active match; no highlight spans
    /// remain afterwards. Idempotent.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// The single structural-change observer: filter, sort, group, page,
    /// column visibility/order/pin and row CRUD all route through here.
    pub fn mark_stale(&mut self) {
        if !self.cache.term().is_empty() && !self.cache.is_stale() {
            debug!("visible sequence changed; match cache marked stale");
        }
        self.cache.invalidate();
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale()
    }

    pub fn term(&self) -> &SearchTerm {
        self.cache.term()
    }

    pub fn match_count(&self) -> usize {
        self.cache.count()
    }

    /// 1-based "n of m" pair for match counters, `None` without an active
    /// match.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cache.position()
    }

    pub fn active_record(&self) -> Option<&MatchRecord> {
        self.cache.active()
    }

    /// Snapshot of the current records, in traversal order.
    pub fn records(&self) -> &[MatchRecord] {
        self.cache.records()
    }

    /// Snapshot queries for the rendering layer.
    pub fn match_spans(&self, row_key: &RowKey, column_id: &str) -> &[MatchSpan] {
        self.cache.spans_for(row_key, column_id)
    }

    pub fn is_active_match(&self, row_key: &RowKey, column_id: &str, start: usize) -> bool {
        self.cache.is_active_at(row_key, column_id, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestGrid {
        rows: Vec<(RowKey, HashMap<String, String>)>,
    }

    impl TestGrid {
        fn row(mut self, key: i64, title: &str) -> Self {
            let mut cells = HashMap::new();
            cells.insert("title".to_string(), title.to_string());
            self.rows.push((RowKey::Int(key), cells));
            self
        }

        fn remove(&mut self, key: i64) {
            self.rows.retain(|(k, _)| *k != RowKey::Int(key));
        }
    }

    impl SearchableGrid for TestGrid {
        fn visible_row_keys(&self) -> Vec<RowKey> {
            self.rows.iter().map(|(key, _)| key.clone()).collect()
        }

        fn visible_column_ids(&self) -> Vec<String> {
            vec!["title".to_string()]
        }

        fn cell_display_text(&self, row_key: &RowKey, column_id: &str) -> Option<String> {
            let (_, cells) = self.rows.iter().find(|(key, _)| key == row_key)?;
            cells.get(column_id).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        revealed: Vec<(RowKey, String)>,
    }

    impl ViewportSink for RecordingSink {
        fn reveal_cell(&mut self, row_key: &RowKey, column_id: &str) {
            self.revealed.push((row_key.clone(), column_id.to_string()));
        }
    }

    fn director_grid() -> TestGrid {
        TestGrid::default()
            .row(1, "Vice President")
            .row(2, "Director")
            .row(3, "Director")
            .row(4, "Software Developer")
    }

    fn term(text: &str) -> SearchTerm {
        SearchTerm::new(text, false, false)
    }

    #[test]
    fn test_first_find_next_activates_first_match() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        let count = session.find_next(&grid, &mut sink, term("director"));
        assert_eq!(count, 2);
        assert_eq!(session.position(), Some((1, 2)));
        assert_eq!(sink.revealed, vec![(RowKey::Int(2), "title".to_string())]);
    }

    #[test]
    fn test_wraparound_returns_to_first_match() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        for _ in 0..3 {
            assert_eq!(session.find_next(&grid, &mut sink, term("director")), 2);
        }
        // Third call wrapped: same identity as the first.
        assert!(session.is_active_match(&RowKey::Int(2), "title", 0));
    }

    #[test]
    fn test_next_then_prev_is_symmetric() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        let before = session.position();
        session.find_next(&grid, &mut sink, term("director"));
        session.find_prev(&grid, &mut sink, term("director"));
        assert_eq!(session.position(), before);
    }

    #[test]
    fn test_find_prev_from_fresh_cache_wraps_to_last() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        let count = session.find_prev(&grid, &mut sink, term("director"));
        assert_eq!(count, 2);
        assert!(session.is_active_match(&RowKey::Int(3), "title", 0));
    }

    #[test]
    fn test_empty_term_clears_session() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        assert_eq!(session.find_next(&grid, &mut sink, term("")), 0);
        assert_eq!(session.match_count(), 0);
        assert!(session.position().is_none());
    }

    #[test]
    fn test_no_match_keeps_returning_zero() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        assert_eq!(session.find_next(&grid, &mut sink, term("nothing")), 0);
        assert_eq!(session.find_next(&grid, &mut sink, term("nothing")), 0);
        assert!(sink.revealed.is_empty());
    }

    #[test]
    fn test_term_change_resets_active_match() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        session.find_next(&grid, &mut sink, term("director"));
        assert_eq!(session.position(), Some((2, 2)));

        session.find_next(&grid, &mut sink, term("developer"));
        assert_eq!(session.position(), Some((1, 1)));
    }

    #[test]
    fn test_case_and_exact_flags_are_part_of_the_term() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        assert_eq!(session.find_next(&grid, &mut sink, term("director")), 2);
        let sensitive = SearchTerm::new("director", true, false);
        assert_eq!(session.find_next(&grid, &mut sink, sensitive), 0);
    }

    #[test]
    fn test_stale_rescan_preserves_surviving_active_match() {
        let mut grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        session.find_next(&grid, &mut sink, term("director"));
        assert!(session.is_active_match(&RowKey::Int(3), "title", 0));

        grid.remove(2);
        session.mark_stale();

        // Active cell (row 3) survived: continue past it to the wrapped first.
        let count = session.find_next(&grid, &mut sink, term("director"));
        assert_eq!(count, 1);
        assert!(session.is_active_match(&RowKey::Int(3), "title", 0));
    }

    #[test]
    fn test_stale_rescan_resets_active_when_row_disappears() {
        let mut grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        assert!(session.is_active_match(&RowKey::Int(2), "title", 0));

        grid.remove(2);
        session.mark_stale();

        // The old active row is gone: no stale reference, navigation restarts
        // from the first remaining match.
        let count = session.find_next(&grid, &mut sink, term("director"));
        assert_eq!(count, 1);
        assert!(session.is_active_match(&RowKey::Int(3), "title", 0));
    }

    #[test]
    fn test_refresh_preserves_active_without_stepping() {
        let mut grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        assert!(session.is_active_match(&RowKey::Int(2), "title", 0));

        grid.rows.swap(1, 2);
        session.mark_stale();

        let count = session.refresh(&grid);
        assert_eq!(count, 2);
        assert!(session.is_active_match(&RowKey::Int(2), "title", 0));
        // The active record moved to the new display position.
        assert_eq!(session.position(), Some((2, 2)));
    }

    #[test]
    fn test_refresh_without_search_is_a_noop() {
        let grid = director_grid();
        let mut session = SearchSession::new();
        assert_eq!(session.refresh(&grid), 0);
        assert_eq!(session.match_count(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let grid = director_grid();
        let mut sink = RecordingSink::default();
        let mut session = SearchSession::new();

        session.find_next(&grid, &mut sink, term("director"));
        session.clear();
        let spans_after_first = session.match_spans(&RowKey::Int(2), "title").len();
        session.clear();
        assert_eq!(spans_after_first, 0);
        assert_eq!(session.match_spans(&RowKey::Int(2), "title").len(), 0);
        assert!(session.position().is_none());
    }
}
