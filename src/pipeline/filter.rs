use crate::row::Row;

/// How a filter condition compares a cell against its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    StartsWith,
    Equals,
}

/// One per-column condition. All configured conditions must hold for a row to
/// stay visible.
#[derive(Debug, Clone)]
pub struct FilterCondition {
    pub column_id: String,
    pub op: FilterOp,
    pub operand: String,
    pub case_sensitive: bool,
}

impl FilterCondition {
    pub fn contains(column_id: impl Into<String>, operand: impl Into<String>) -> Self {
        Self::new(column_id, FilterOp::Contains, operand)
    }

    pub fn starts_with(column_id: impl Into<String>, operand: impl Into<String>) -> Self {
        Self::new(column_id, FilterOp::StartsWith, operand)
    }

    pub fn equals(column_id: impl Into<String>, operand: impl Into<String>) -> Self {
        Self::new(column_id, FilterOp::Equals, operand)
    }

    fn new(column_id: impl Into<String>, op: FilterOp, operand: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            op,
            operand: operand.into(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Whether the row passes this condition. Missing cells and nulls never
    /// pass.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(text) = row.cell(&self.column_id).and_then(|value| value.as_text()) else {
            return false;
        };

        let (text, operand) = if self.case_sensitive {
            (text, self.operand.clone())
        } else {
            (text.to_lowercase(), self.operand.to_lowercase())
        };

        match self.op {
            FilterOp::Contains => text.contains(&operand),
            FilterOp::StartsWith => text.starts_with(&operand),
            FilterOp::Equals => text == operand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str) -> Row {
        Row::new(1).with_cell("title", title)
    }

    #[test]
    fn contains_folds_case_by_default() {
        let condition = FilterCondition::contains("title", "developer");
        assert!(condition.matches(&row("Software Developer")));
        assert!(!condition.matches(&row("Manager")));
    }

    #[test]
    fn case_sensitive_contains() {
        let condition = FilterCondition::contains("title", "Developer").case_sensitive();
        assert!(condition.matches(&row("Software Developer")));
        assert!(!condition.matches(&row("software developer")));
    }

    #[test]
    fn equals_requires_whole_text() {
        let condition = FilterCondition::equals("title", "director");
        assert!(condition.matches(&row("Director")));
        assert!(!condition.matches(&row("Art Director")));
    }

    #[test]
    fn starts_with() {
        let condition = FilterCondition::starts_with("title", "senior");
        assert!(condition.matches(&row("Senior Developer")));
        assert!(!condition.matches(&row("Developer, Senior")));
    }

    #[test]
    fn missing_cell_never_passes() {
        let condition = FilterCondition::contains("salary", "1");
        assert!(!condition.matches(&row("Director")));
    }
}
