//! In-memory tabular data-grid core with incremental search and highlight
//! navigation.
//!
//! The grid materializes its visible row sequence through a filter → sort →
//! group → page pipeline; the search engine ([`tabula_search`]) maintains a
//! navigable active-match cursor over that sequence and keeps it consistent
//! as the sequence changes underneath it.

pub mod column;
pub mod format;
pub mod grid;
pub mod pipeline;
pub mod row;
pub mod viewport;

pub use column::{Column, ColumnSet, DataType};
pub use grid::{ChangeKind, Grid};
pub use pipeline::{DisplaySlot, FilterCondition, FilterOp, SortKey};
pub use row::{CellValue, Row};
pub use tabula_search::{MatchRecord, MatchSpan, RowKey, SearchTerm};
pub use viewport::Viewport;
