use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use tabula_search::RowKey;

/// A single cell's raw value, before display formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Plain textual form used by the filter pipeline. Nulls have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(value) => Some(value.to_string()),
            CellValue::Number(value) => Some(if value.fract() == 0.0 && value.abs() < 1e15 {
                format!("{}", *value as i64)
            } else {
                format!("{value}")
            }),
            CellValue::Text(value) => Some(value.clone()),
            CellValue::Date(value) => Some(value.format("%Y-%m-%d").to_string()),
        }
    }

    /// Total order used by the sort pipeline: nulls first, then by type,
    /// then by value.
    pub fn compare(&self, other: &CellValue, case_insensitive: bool) -> Ordering {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => {
                if case_insensitive {
                    a.to_lowercase().cmp(&b.to_lowercase())
                } else {
                    a.cmp(b)
                }
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::Date(_) => 3,
            CellValue::Text(_) => 4,
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// A logical row: a stable key plus its field values, keyed by column id.
#[derive(Debug, Clone)]
pub struct Row {
    key: RowKey,
    cells: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(key: impl Into<RowKey>) -> Self {
        Self {
            key: key.into(),
            cells: HashMap::new(),
        }
    }

    pub fn with_cell(mut self, column_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column_id.into(), value.into());
        self
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn cell(&self, column_id: &str) -> Option<&CellValue> {
        self.cells.get(column_id)
    }

    pub fn set_cell(&mut self, column_id: impl Into<String>, value: CellValue) {
        self.cells.insert(column_id.into(), value);
    }
}
