use std::collections::HashMap;

use log::{debug, warn};
use tabula_search::{
    MatchRecord, MatchSpan, RowKey, SearchSession, SearchTerm, SearchableGrid, ViewportSink,
};

use crate::column::{Column, ColumnSet};
use crate::format;
use crate::pipeline::{DisplaySlot, FilterCondition, Materialized, PipelineState, SortKey};
use crate::row::{CellValue, Row};
use crate::viewport::Viewport;

const DEFAULT_VIEWPORT_ROWS: usize = 10;
const DEFAULT_VIEWPORT_COLS: usize = 8;

/// Why the visible sequence changed. Every mutation funnels into the same
/// invalidation hook; the kind is recorded for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Filter,
    Sort,
    Group,
    Page,
    Columns,
    Rows,
}

/// The grid facade: the row store, the column model, the data pipeline, the
/// viewport and the search session, wired together.
///
/// Search-wise it exposes the find_next/find_prev/clear_search surface plus
/// the span queries the rendering layer uses to paint highlights. Every
/// structural mutation (filter, sort, group, page, column changes, row CRUD)
/// routes through a single visible-sequence-changed hook, which
/// rematerializes the pipeline and marks the match cache stale; the rescan
/// happens lazily on the next navigation or refresh call.
pub struct Grid {
    columns: ColumnSet,
    rows: Vec<Row>,
    row_index: HashMap<RowKey, usize>,
    pipeline: PipelineState,
    view: Materialized,
    viewport: Viewport,
    search: SearchSession,
}

/// Read-only search surface over the current materialization.
struct GridSurface<'a> {
    columns: &'a ColumnSet,
    rows: &'a [Row],
    row_index: &'a HashMap<RowKey, usize>,
    search_keys: &'a [RowKey],
}

impl SearchableGrid for GridSurface<'_> {
    fn visible_row_keys(&self) -> Vec<RowKey> {
        self.search_keys.to_vec()
    }

    fn visible_column_ids(&self) -> Vec<String> {
        self.columns.searchable_visible_ids()
    }

    fn cell_display_text(&self, row_key: &RowKey, column_id: &str) -> Option<String> {
        let row = self.row_index.get(row_key).and_then(|i| self.rows.get(*i))?;
        let column = self.columns.get(column_id)?;
        let value = row.cell(column_id)?;
        format::display_text(column, value)
    }
}

/// Translates a match identity into viewport coordinates. A cross-page target
/// cannot be handled here (the page switch rematerializes the view while the
/// search session is still borrowed), so it is recorded and completed by the
/// grid afterwards.
struct RevealSink<'a> {
    viewport: &'a mut Viewport,
    columns: &'a ColumnSet,
    positions: &'a HashMap<RowKey, usize>,
    slot_of_key: &'a HashMap<RowKey, usize>,
    page_size: Option<usize>,
    pending_page: Option<usize>,
}

impl ViewportSink for RevealSink<'_> {
    fn reveal_cell(&mut self, row_key: &RowKey, column_id: &str) {
        if let Some(&row_index) = self.positions.get(row_key) {
            self.viewport.scroll_row_into_view(row_index);
            if let Some(col_index) = self.columns.display_index(column_id) {
                self.viewport.scroll_col_into_view(col_index);
            }
            return;
        }

        match (self.page_size, self.slot_of_key.get(row_key)) {
            (Some(size), Some(&slot)) if size > 0 => {
                self.pending_page = Some(slot / size);
            }
            _ => {
                // Row vanished between scan and reveal: nothing to scroll to.
                debug!("reveal target {row_key} is no longer visible");
            }
        }
    }
}

impl Grid {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut grid = Self {
            columns: ColumnSet::new(columns),
            rows: Vec::new(),
            row_index: HashMap::new(),
            pipeline: PipelineState::default(),
            view: Materialized::default(),
            viewport: Viewport::new(DEFAULT_VIEWPORT_ROWS, DEFAULT_VIEWPORT_COLS),
            search: SearchSession::new(),
        };
        grid.rebuild_view();
        grid
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.load_rows(rows);
        self
    }

    pub fn with_viewport(mut self, rows: usize, cols: usize) -> Self {
        self.viewport = Viewport::new(rows, cols);
        self
    }

    /// Replaces the whole dataset.
    pub fn load_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.reindex_rows();
        self.visible_sequence_changed(ChangeKind::Rows);
    }

    // ---- search ----------------------------------------------------------

    /// Finds the next occurrence of `text` in the grid and scrolls it into
    /// view. Returns how many times the grid contains the text.
    pub fn find_next(&mut self, text: &str, case_sensitive: bool, exact_match: bool) -> usize {
        self.find(SearchTerm::new(text, case_sensitive, exact_match), false)
    }

    /// Finds the previous occurrence of `text`, wrapping to the last match
    /// from a fresh search. Returns how many times the grid contains the
    /// text.
    pub fn find_prev(&mut self, text: &str, case_sensitive: bool, exact_match: bool) -> usize {
        self.find(SearchTerm::new(text, case_sensitive, exact_match), true)
    }

    /// Re-runs the active search against the current visible sequence without
    /// moving the cursor; the active match survives when its cell still
    /// matches at the same offset. Returns the new match count.
    pub fn refresh_search(&mut self) -> usize {
        let surface = GridSurface {
            columns: &self.columns,
            rows: &self.rows,
            row_index: &self.row_index,
            search_keys: &self.view.search_keys,
        };
        self.search.refresh(&surface)
    }

    /// Drops all search state; no highlight spans remain. Idempotent.
    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    fn find(&mut self, term: SearchTerm, backwards: bool) -> usize {
        let surface = GridSurface {
            columns: &self.columns,
            rows: &self.rows,
            row_index: &self.row_index,
            search_keys: &self.view.search_keys,
        };
        let mut sink = RevealSink {
            viewport: &mut self.viewport,
            columns: &self.columns,
            positions: &self.view.positions,
            slot_of_key: &self.view.slot_of_key,
            page_size: self.pipeline.page_size,
            pending_page: None,
        };

        let count = if backwards {
            self.search.find_prev(&surface, &mut sink, term)
        } else {
            self.search.find_next(&surface, &mut sink, term)
        };
        let pending_page = sink.pending_page;

        if let Some(page) = pending_page {
            self.turn_to_page_and_reveal(page);
        }
        count
    }

    /// Completes a cross-page reveal: switch pages, refresh the search so the
    /// cache matches the new materialization (the active match is preserved
    /// by identity), then scroll the active cell into view.
    fn turn_to_page_and_reveal(&mut self, page: usize) {
        self.pipeline.page_index = page.min(self.view.page_count.saturating_sub(1));
        self.visible_sequence_changed(ChangeKind::Page);
        self.refresh_search();

        let Some(record) = self.search.active_record() else {
            return;
        };
        if let Some(&row_index) = self.view.positions.get(&record.row_key) {
            self.viewport.scroll_row_into_view(row_index);
        }
        if let Some(col_index) = self.columns.display_index(&record.column_id) {
            self.viewport.scroll_col_into_view(col_index);
        }
    }

    /// Highlight spans for one cell, for the rendering layer.
    pub fn match_spans(&self, row_key: &RowKey, column_id: &str) -> &[MatchSpan] {
        self.search.match_spans(row_key, column_id)
    }

    pub fn is_active_match(&self, row_key: &RowKey, column_id: &str, start: usize) -> bool {
        self.search.is_active_match(row_key, column_id, start)
    }

    /// 1-based "n of m" pair for match counters, `None` without an active
    /// match.
    pub fn search_position(&self) -> Option<(usize, usize)> {
        self.search.position()
    }

    pub fn match_count(&self) -> usize {
        self.search.match_count()
    }

    pub fn active_match(&self) -> Option<&MatchRecord> {
        self.search.active_record()
    }

    /// Snapshot of the current match records, in traversal order.
    pub fn match_records(&self) -> &[MatchRecord] {
        self.search.records()
    }

    pub fn is_search_stale(&self) -> bool {
        self.search.is_stale()
    }

    // ---- pipeline --------------------------------------------------------

    /// Applies (or replaces) the filter for the condition's column.
    pub fn apply_filter(&mut self, condition: FilterCondition) {
        if self.columns.get(&condition.column_id).is_none() {
            warn!("filter on unknown column {:?} ignored", condition.column_id);
            return;
        }
        self.pipeline
            .filters
            .retain(|existing| existing.column_id != condition.column_id);
        self.pipeline.filters.push(condition);
        self.visible_sequence_changed(ChangeKind::Filter);
    }

    pub fn clear_filter(&mut self, column_id: &str) {
        let before = self.pipeline.filters.len();
        self.pipeline
            .filters
            .retain(|existing| existing.column_id != column_id);
        if self.pipeline.filters.len() != before {
            self.visible_sequence_changed(ChangeKind::Filter);
        }
    }

    pub fn clear_filters(&mut self) {
        if !self.pipeline.filters.is_empty() {
            self.pipeline.filters.clear();
            self.visible_sequence_changed(ChangeKind::Filter);
        }
    }

    /// Applies (or replaces) the sort key for the key's column.
    pub fn sort(&mut self, key: SortKey) {
        if self.columns.get(&key.column_id).is_none() {
            warn!("sort on unknown column {:?} ignored", key.column_id);
            return;
        }
        self.pipeline
            .sort_keys
            .retain(|existing| existing.column_id != key.column_id);
        self.pipeline.sort_keys.push(key);
        self.visible_sequence_changed(ChangeKind::Sort);
    }

    pub fn clear_sort(&mut self) {
        if !self.pipeline.sort_keys.is_empty() {
            self.pipeline.sort_keys.clear();
            self.visible_sequence_changed(ChangeKind::Sort);
        }
    }

    pub fn group_by(&mut self, column_id: &str) {
        if self.columns.get(column_id).is_none() {
            warn!("group by unknown column {column_id:?} ignored");
            return;
        }
        self.pipeline.group_by = Some(column_id.to_string());
        self.pipeline.collapsed_groups.clear();
        self.visible_sequence_changed(ChangeKind::Group);
    }

    pub fn clear_grouping(&mut self) {
        if self.pipeline.group_by.is_some() {
            self.pipeline.group_by = None;
            self.pipeline.collapsed_groups.clear();
            self.visible_sequence_changed(ChangeKind::Group);
        }
    }

    /// Expands or collapses one group. Collapsed children leave the visible
    /// sequence, search included.
    pub fn toggle_group(&mut self, value: &str) {
        if self.pipeline.group_by.is_none() {
            warn!("toggle_group without an active grouping ignored");
            return;
        }
        if !self.pipeline.collapsed_groups.remove(value) {
            self.pipeline.collapsed_groups.insert(value.to_string());
        }
        self.visible_sequence_changed(ChangeKind::Group);
    }

    pub fn set_page_size(&mut self, size: Option<usize>) {
        self.pipeline.page_size = size;
        self.pipeline.page_index = 0;
        self.visible_sequence_changed(ChangeKind::Page);
    }

    pub fn set_page(&mut self, index: usize) {
        self.pipeline.page_index = index.min(self.view.page_count.saturating_sub(1));
        self.visible_sequence_changed(ChangeKind::Page);
    }

    pub fn page_index(&self) -> usize {
        self.pipeline.page_index
    }

    pub fn page_count(&self) -> usize {
        self.view.page_count
    }

    /// Page on which the row lives, when paging is enabled.
    pub fn locate_page(&self, row_key: &RowKey) -> Option<usize> {
        self.pipeline.locate_page(&self.view, row_key)
    }

    // ---- rows ------------------------------------------------------------

    pub fn add_row(&mut self, row: Row) {
        if self.row_index.contains_key(row.key()) {
            warn!("add_row ignored: duplicate key {}", row.key());
            return;
        }
        self.row_index.insert(row.key().clone(), self.rows.len());
        self.rows.push(row);
        self.visible_sequence_changed(ChangeKind::Rows);
    }

    pub fn remove_row(&mut self, key: &RowKey) -> bool {
        let Some(index) = self.row_index.remove(key) else {
            warn!("remove_row ignored: no row with key {key}");
            return false;
        };
        self.rows.remove(index);
        self.reindex_rows();
        self.visible_sequence_changed(ChangeKind::Rows);
        true
    }

    pub fn update_cell(&mut self, key: &RowKey, column_id: &str, value: CellValue) -> bool {
        let Some(&index) = self.row_index.get(key) else {
            warn!("update_cell ignored: no row with key {key}");
            return false;
        };
        self.rows[index].set_cell(column_id, value);
        self.visible_sequence_changed(ChangeKind::Rows);
        true
    }

    // ---- columns ---------------------------------------------------------

    pub fn set_column_hidden(&mut self, column_id: &str, hidden: bool) {
        self.mutate_column(column_id, |column| {
            let changed = column.hidden != hidden;
            column.hidden = hidden;
            changed
        });
    }

    pub fn set_column_pinned(&mut self, column_id: &str, pinned: bool) {
        self.mutate_column(column_id, |column| {
            let changed = column.pinned != pinned;
            column.pinned = pinned;
            changed
        });
    }

    pub fn set_column_searchable(&mut self, column_id: &str, searchable: bool) {
        self.mutate_column(column_id, |column| {
            let changed = column.searchable != searchable;
            column.searchable = searchable;
            changed
        });
    }

    pub fn move_column(&mut self, column_id: &str, index: usize) {
        if self.columns.move_to(column_id, index) {
            self.visible_sequence_changed(ChangeKind::Columns);
        } else {
            warn!("move_column ignored: no column {column_id:?}");
        }
    }

    fn mutate_column(&mut self, column_id: &str, apply: impl FnOnce(&mut Column) -> bool) {
        let Some(column) = self.columns.get_mut(column_id) else {
            warn!("column change ignored: no column {column_id:?}");
            return;
        };
        if apply(column) {
            self.visible_sequence_changed(ChangeKind::Columns);
        }
    }

    // ---- rendering surface ----------------------------------------------

    /// Display slots of the current page, in paint order.
    pub fn display_slots(&self) -> &[DisplaySlot] {
        &self.view.display
    }

    pub fn visible_columns(&self) -> Vec<&Column> {
        self.columns.visible()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn row(&self, key: &RowKey) -> Option<&Row> {
        self.row_index.get(key).and_then(|i| self.rows.get(*i))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Display text for one cell, as the rendering layer paints it.
    pub fn cell_text(&self, key: &RowKey, column_id: &str) -> Option<String> {
        let row = self.row(key)?;
        let column = self.columns.get(column_id)?;
        let value = row.cell(column_id)?;
        format::display_text(column, value)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Plain scrolling. A pure re-render: which logical rows are visible does
    /// not change, so the search cache stays fresh.
    pub fn scroll_to_row(&mut self, index: usize) {
        self.viewport.scroll_to_row(index);
    }

    // ---- internals -------------------------------------------------------

    /// The single structural-change hook: rematerialize the pipeline and
    /// mark the match cache stale. Rescans stay lazy; nothing else happens
    /// until the next navigation or refresh call.
    fn visible_sequence_changed(&mut self, kind: ChangeKind) {
        debug!("visible sequence changed: {kind:?}");
        self.rebuild_view();
        self.search.mark_stale();
    }

    fn rebuild_view(&mut self) {
        self.view = self.pipeline.materialize(&self.rows);
    }

    fn reindex_rows(&mut self) {
        self.row_index = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.key().clone(), index))
            .collect();
    }
}
