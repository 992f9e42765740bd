//! Search and highlight-navigation engine for the Tabula data grid.

mod cache;
mod matcher;
mod scanner;
mod session;

pub use cache::{Freshness, MatchCache, MatchRecord, MatchSpan};
pub use matcher::{RowKey, SearchTerm, TermMatcher};
pub use scanner::{SearchableGrid, scan};
pub use session::{SearchSession, ViewportSink};
