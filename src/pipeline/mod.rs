//! The data pipeline: filter → sort → group → page. Materialization turns
//! the raw row store into the display slots of the current page, the
//! cross-page sequence search scans, and the position lookups navigation
//! needs. The grid rematerializes on every structural change; match records
//! never hold positions, only row keys.

mod filter;
mod sort;

pub use filter::{FilterCondition, FilterOp};
pub use sort::SortKey;

use std::collections::{HashMap, HashSet};

use tabula_search::RowKey;

use crate::row::{CellValue, Row};
use sort::compare_with_keys;

/// Everything the pipeline can do to the row sequence before display.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub filters: Vec<FilterCondition>,
    pub sort_keys: Vec<SortKey>,
    pub group_by: Option<String>,
    pub collapsed_groups: HashSet<String>,
    pub page_size: Option<usize>,
    pub page_index: usize,
}

/// One entry of the display sequence. Group headers occupy display slots just
/// like data rows do.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplaySlot {
    GroupHeader {
        value: String,
        row_count: usize,
        collapsed: bool,
    },
    Data(RowKey),
}

/// A materialized view of the pipeline output.
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    /// Display slots of the current page, in paint order.
    pub display: Vec<DisplaySlot>,
    /// Display position by row key, current page only.
    pub positions: HashMap<RowKey, usize>,
    /// Expanded data rows across all pages, in display order: the sequence
    /// search scans. Collapsed group children are not part of it.
    pub search_keys: Vec<RowKey>,
    /// Slot index across all pages by row key; `page = slot / page_size`.
    pub slot_of_key: HashMap<RowKey, usize>,
    pub page_count: usize,
}

impl PipelineState {
    /// Runs the full pipeline over the row store.
    pub fn materialize(&self, rows: &[Row]) -> Materialized {
        let mut visible: Vec<&Row> = rows
            .iter()
            .filter(|row| self.filters.iter().all(|condition| condition.matches(row)))
            .collect();

        // Grouping implies ordering by the group column before user keys.
        let mut keys: Vec<SortKey> = Vec::new();
        if let Some(group_column) = &self.group_by {
            keys.push(SortKey::ascending(group_column));
        }
        keys.extend(self.sort_keys.iter().cloned());
        if !keys.is_empty() {
            visible.sort_by(|a, b| compare_with_keys(&keys, a, b));
        }

        let (full, search_keys) = self.flatten(&visible);

        let mut slot_of_key = HashMap::new();
        for (slot_index, slot) in full.iter().enumerate() {
            if let DisplaySlot::Data(key) = slot {
                slot_of_key.insert(key.clone(), slot_index);
            }
        }

        let (display, page_count) = match self.page_size {
            Some(size) if size > 0 => {
                let page_count = full.len().div_ceil(size).max(1);
                let page = self.page_index.min(page_count - 1);
                let start = page * size;
                let end = (start + size).min(full.len());
                (full[start..end].to_vec(), page_count)
            }
            _ => (full, 1),
        };

        let mut positions = HashMap::new();
        for (index, slot) in display.iter().enumerate() {
            if let DisplaySlot::Data(key) = slot {
                positions.insert(key.clone(), index);
            }
        }

        Materialized {
            display,
            positions,
            search_keys,
            slot_of_key,
            page_count,
        }
    }

    /// Page on which `row_key`'s slot lives, when paging is enabled.
    pub fn locate_page(&self, view: &Materialized, row_key: &RowKey) -> Option<usize> {
        let size = self.page_size.filter(|size| *size > 0)?;
        let slot = view.slot_of_key.get(row_key)?;
        Some(slot / size)
    }

    /// Flattens the sorted row list into display slots. With grouping active,
    /// each run of equal group values gets a header slot; collapsed groups
    /// keep their header but contribute no data rows.
    fn flatten(&self, visible: &[&Row]) -> (Vec<DisplaySlot>, Vec<RowKey>) {
        let mut slots = Vec::new();
        let mut search_keys = Vec::new();

        let Some(group_column) = &self.group_by else {
            for row in visible {
                slots.push(DisplaySlot::Data(row.key().clone()));
                search_keys.push(row.key().clone());
            }
            return (slots, search_keys);
        };

        let mut index = 0;
        while index < visible.len() {
            let label = group_label(visible[index], group_column);
            let mut end = index;
            while end < visible.len() && group_label(visible[end], group_column) == label {
                end += 1;
            }

            let collapsed = self.collapsed_groups.contains(&label);
            slots.push(DisplaySlot::GroupHeader {
                value: label,
                row_count: end - index,
                collapsed,
            });
            if !collapsed {
                for row in &visible[index..end] {
                    slots.push(DisplaySlot::Data(row.key().clone()));
                    search_keys.push(row.key().clone());
                }
            }
            index = end;
        }

        (slots, search_keys)
    }
}

fn group_label(row: &Row, column_id: &str) -> String {
    row.cell(column_id)
        .and_then(CellValue::as_text)
        .unwrap_or_default()
}
