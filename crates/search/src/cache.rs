use std::collections::HashMap;

use crate::matcher::{RowKey, SearchTerm};

/// A render-ready fragment of matched text within one cell. Offsets are byte
/// offsets into the original cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub len: usize,
}

/// One occurrence of the search term inside one cell.
///
/// Records carry the stable row key and column id rather than display
/// positions, so they survive reordering; `cell_text` is the original
/// (unfolded) display text the spans index into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub row_key: RowKey,
    pub column_id: String,
    pub start: usize,
    pub len: usize,
    pub cell_text: String,
}

impl MatchRecord {
    pub fn span(&self) -> MatchSpan {
        MatchSpan {
            start: self.start,
            len: self.len,
        }
    }

    /// Identity check used by the active-match preservation rule: same cell,
    /// same offset.
    pub fn is_at(&self, row_key: &RowKey, column_id: &str, start: usize) -> bool {
        self.row_key == *row_key && self.column_id == column_id && self.start == start
    }
}

/// Whether the cached records still describe the current visible sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    #[default]
    Fresh,
    Stale,
}

/// The last scan's results plus the active-match index.
///
/// Records are replaced wholesale on every scan and never mutated in place.
/// Invalidation only flips the freshness flag: the old records stay readable
/// so the previous render is not blanked before the next scan completes.
#[derive(Debug, Default)]
pub struct MatchCache {
    term: SearchTerm,
    records: Vec<MatchRecord>,
    active: Option<usize>,
    spans_by_cell: HashMap<RowKey, HashMap<String, Vec<MatchSpan>>>,
    freshness: Freshness,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &SearchTerm {
        &self.term
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&MatchRecord> {
        self.active.and_then(|i| self.records.get(i))
    }

    /// 1-based "n of m" pair for match counters.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.active.map(|i| (i + 1, self.records.len()))
    }

    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }

    /// Marks the cache stale without discarding the old records.
    pub fn invalidate(&mut self) {
        self.freshness = Freshness::Stale;
    }

    /// Installs a fresh scan. With `preserve_active`, the previous active
    /// record is looked up in the new records by `(row_key, column_id,
    /// start)` and kept active on a hit; otherwise (and always on a miss) the
    /// active match resets to none.
    pub fn replace(&mut self, term: SearchTerm, records: Vec<MatchRecord>, preserve_active: bool) {
        let previous = if preserve_active {
            self.active().cloned()
        } else {
            None
        };

        self.active = previous.and_then(|prev| {
            records
                .iter()
                .position(|r| r.is_at(&prev.row_key, &prev.column_id, prev.start))
        });
        self.spans_by_cell = Self::build_spans_by_cell(&records);
        self.records = records;
        self.term = term;
        self.freshness = Freshness::Fresh;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Steps the active match forward with wraparound; the first step after a
    /// fresh scan lands on the first record.
    pub fn advance(&mut self) -> Option<&MatchRecord> {
        if self.records.is_empty() {
            return None;
        }
        let next = match self.active {
            Some(i) => (i + 1) % self.records.len(),
            None => 0,
        };
        self.active = Some(next);
        self.records.get(next)
    }

    /// Steps the active match backward with wraparound; the first step after
    /// a fresh scan lands on the last record.
    pub fn retreat(&mut self) -> Option<&MatchRecord> {
        if self.records.is_empty() {
            return None;
        }
        let prev = match self.active {
            Some(0) | None => self.records.len() - 1,
            Some(i) => i - 1,
        };
        self.active = Some(prev);
        self.records.get(prev)
    }

    /// All highlight spans for one cell, in left-to-right order.
    pub fn spans_for(&self, row_key: &RowKey, column_id: &str) -> &[MatchSpan] {
        self.spans_by_cell
            .get(row_key)
            .and_then(|columns| columns.get(column_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_active_at(&self, row_key: &RowKey, column_id: &str, start: usize) -> bool {
        self.active()
            .map(|record| record.is_at(row_key, column_id, start))
            .unwrap_or(false)
    }

    fn build_spans_by_cell(
        records: &[MatchRecord],
    ) -> HashMap<RowKey, HashMap<String, Vec<MatchSpan>>> {
        let mut by_cell: HashMap<RowKey, HashMap<String, Vec<MatchSpan>>> = HashMap::new();
        for record in records {
            by_cell
                .entry(record.row_key.clone())
                .or_default()
                .entry(record.column_id.clone())
                .or_default()
                .push(record.span());
        }
        by_cell
    }
}
