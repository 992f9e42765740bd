use std::cmp::Ordering;

use crate::row::Row;

/// One sort key; earlier keys take precedence.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub column_id: String,
    pub descending: bool,
    pub case_insensitive: bool,
}

impl SortKey {
    pub fn ascending(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: false,
            case_insensitive: true,
        }
    }

    pub fn descending(column_id: impl Into<String>) -> Self {
        Self {
            descending: true,
            ..Self::ascending(column_id)
        }
    }

    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = match (a.cell(&self.column_id), b.cell(&self.column_id)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.compare(right, self.case_insensitive),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Lexicographic comparison over a key list; ties keep the incoming order
/// (callers use a stable sort).
pub fn compare_with_keys(keys: &[SortKey], a: &Row, b: &Row) -> Ordering {
    for key in keys {
        let ordering = key.compare(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: i64, title: &str, hours: f64) -> Row {
        Row::new(key)
            .with_cell("title", title)
            .with_cell("hours", hours)
    }

    #[test]
    fn ascending_text_ignores_case_by_default() {
        let key = SortKey::ascending("title");
        assert_eq!(
            key.compare(&row(1, "apple", 0.0), &row(2, "Banana", 0.0)),
            Ordering::Less
        );
    }

    #[test]
    fn descending_reverses() {
        let key = SortKey::descending("hours");
        assert_eq!(
            key.compare(&row(1, "", 8.0), &row(2, "", 4.0)),
            Ordering::Less
        );
    }

    #[test]
    fn later_keys_break_ties() {
        let keys = vec![SortKey::ascending("title"), SortKey::descending("hours")];
        let a = row(1, "Director", 4.0);
        let b = row(2, "Director", 8.0);
        assert_eq!(compare_with_keys(&keys, &a, &b), Ordering::Greater);
    }

    #[test]
    fn missing_cells_sort_first() {
        let key = SortKey::ascending("title");
        let missing = Row::new(1);
        assert_eq!(key.compare(&missing, &row(2, "A", 0.0)), Ordering::Less);
    }
}
