use std::fmt;
use std::sync::Arc;

use crate::row::CellValue;

/// Per-column override of the default display formatting.
pub type Formatter = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Text,
    Number,
    Date,
    Bool,
}

/// Column definition plus the user-adjustable presentation state that decides
/// whether, and in which position, the column participates in search.
#[derive(Clone)]
pub struct Column {
    pub id: String,
    pub header: String,
    pub data_type: DataType,
    pub pinned: bool,
    pub hidden: bool,
    pub searchable: bool,
    /// Fraction digits for Number columns.
    pub decimals: Option<usize>,
    /// chrono format string for Date columns.
    pub date_format: Option<String>,
    pub formatter: Option<Formatter>,
    /// Custom cell template id. Templated cells render through the host
    /// application and have no plain-text projection.
    pub template: Option<String>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("data_type", &self.data_type)
            .field("pinned", &self.pinned)
            .field("hidden", &self.hidden)
            .field("searchable", &self.searchable)
            .field("formatter", &self.formatter.is_some())
            .field("template", &self.template)
            .finish()
    }
}

impl Column {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            data_type: DataType::Text,
            pinned: false,
            hidden: false,
            searchable: true,
            decimals: None,
            date_format: None,
            formatter: None,
            template: None,
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn with_formatter(
        mut self,
        formatter: impl Fn(&CellValue) -> String + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// The grid's columns in user-defined order. The visible display order is
/// derived from it: pinned columns first (keeping their relative order), then
/// the rest; hidden columns are excluded.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn all(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Visible columns in display order.
    pub fn visible(&self) -> Vec<&Column> {
        let mut visible: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| !c.hidden && c.pinned)
            .collect();
        visible.extend(self.columns.iter().filter(|c| !c.hidden && !c.pinned));
        visible
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.visible().iter().map(|c| c.id.clone()).collect()
    }

    /// Columns the search scanner walks, in display order.
    pub fn searchable_visible_ids(&self) -> Vec<String> {
        self.visible()
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.id.clone())
            .collect()
    }

    /// Display index of a visible column.
    pub fn display_index(&self, id: &str) -> Option<usize> {
        self.visible().iter().position(|c| c.id == id)
    }

    /// Repositions a column within the user-defined order. Returns false for
    /// unknown ids.
    pub fn move_to(&mut self, id: &str, index: usize) -> bool {
        let Some(from) = self.columns.iter().position(|c| c.id == id) else {
            return false;
        };
        let column = self.columns.remove(from);
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ColumnSet {
        ColumnSet::new(vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("title", "Job Title"),
        ])
    }

    #[test]
    fn visible_order_puts_pinned_first() {
        let mut columns = set();
        columns.get_mut("title").unwrap().pinned = true;
        assert_eq!(columns.visible_ids(), vec!["title", "id", "name"]);
    }

    #[test]
    fn hidden_columns_are_excluded() {
        let mut columns = set();
        columns.get_mut("name").unwrap().hidden = true;
        assert_eq!(columns.visible_ids(), vec!["id", "title"]);
        assert_eq!(columns.display_index("name"), None);
    }

    #[test]
    fn searchable_ids_skip_opted_out_columns() {
        let mut columns = set();
        columns.get_mut("id").unwrap().searchable = false;
        assert_eq!(columns.searchable_visible_ids(), vec!["name", "title"]);
    }

    #[test]
    fn move_to_repositions_within_user_order() {
        let mut columns = set();
        assert!(columns.move_to("title", 0));
        assert_eq!(columns.visible_ids(), vec!["title", "id", "name"]);
        assert!(!columns.move_to("missing", 0));
    }

    #[test]
    fn moved_pinned_columns_keep_precedence() {
        let mut columns = set();
        columns.get_mut("id").unwrap().pinned = true;
        columns.get_mut("title").unwrap().pinned = true;
        assert!(columns.move_to("title", 0));
        assert_eq!(columns.visible_ids(), vec!["title", "id", "name"]);
    }
}
